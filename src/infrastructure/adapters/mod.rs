//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod document;
pub mod renderer;
pub mod speech;

pub use document::*;
pub use renderer::*;
pub use speech::*;
