//! Document Adapter - 内存文档实现

mod in_memory_document;

pub use in_memory_document::{InMemoryDocument, LayoutConfig, PAGE_BREAK};
