// Infrastructure implementations for cpp_envoy: build-environment
// plumbing and the external clang invocation.

pub mod build_env;
pub mod clang_runner;
