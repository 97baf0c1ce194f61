//! Page Text Provider Port - 文档页面文本与几何
//!
//! 文档解析与渲染由外部协作者负责，核心只读取页面文本和文本区间的包围矩形

use thiserror::Error;

use crate::domain::{DocumentKey, Rect, TextRange};

/// 文档访问错误
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Page out of range: {page_index} (document has {page_count} pages)")]
    PageOutOfRange {
        page_index: usize,
        page_count: usize,
    },

    #[error("Page text unavailable: {0}")]
    TextUnavailable(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Page Text Provider Port
///
/// 文档在加载后不可变；重新打开时整体替换（新的 document_key）
pub trait PageTextProviderPort: Send + Sync {
    /// 文档标识（用于缓存分区）
    fn document_key(&self) -> &DocumentKey;

    /// 页数
    fn page_count(&self) -> usize;

    /// 页面原始文本
    fn page_text(&self, page_index: usize) -> Result<String, DocumentError>;

    /// 文本区间在页面上的包围矩形，无法计算时返回 None
    fn geometry(&self, page_index: usize, range: TextRange) -> Option<Rect>;
}
