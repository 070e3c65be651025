// Main library entry point for cpp_envoy.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
