//! Domain Layer - 领域层
//!
//! 纯算法与值类型，不依赖任何外部协作者:
//! - document: 文档、页面几何、句子、搜索结果
//! - text_segmenter: 分句
//! - locator: 文本归一化与搜索片段选择
//! - position_validator: 多片段匹配的几何校验

pub mod document;
pub mod locator;
pub mod position_validator;
pub mod text_segmenter;

pub use document::{DocumentKey, Rect, SearchResult, SegmentRole, Sentence, TextRange, TextSegment};
pub use position_validator::{InvalidReason, PositionValidator, Validation, ValidatorConfig};
pub use text_segmenter::{segment_page, segment_text, SegmentConfig, SegmentedSentence};
