pub mod binding_renderer;
pub mod header_renderer;

pub use binding_renderer::BindingRenderer;
pub use header_renderer::HeaderRenderer;
