//! 文本定位的纯算法部分
//!
//! - normalizer: 归一化页面文本并保留原始偏移映射
//! - segment_selector: 从句子中挑选搜索片段

mod normalizer;
mod segment_selector;

pub use normalizer::{normalize_needle, NormalizedText};
pub use segment_selector::{select_segments, SegmentSelectionConfig};
