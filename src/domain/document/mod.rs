//! Document Context - 文档与页面模型
//!
//! 职责:
//! - 文档标识（缓存分区键）
//! - 页面几何（矩形、文本区间）
//! - 句子、搜索片段、搜索结果

mod entities;
mod value_objects;

pub use entities::{SearchResult, SegmentRole, Sentence, TextSegment};
pub use value_objects::{DocumentKey, Rect, TextRange};
