//! 应用层错误定义
//!
//! 播放控制命令的错误类型。定位失败、校验失败、缓存未命中都不是错误，
//! 引擎失败由控制器内部降级处理

use thiserror::Error;

use crate::application::ports::{DocumentError, SpeechError};

/// 播放控制错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// 尚未打开文档
    #[error("No document loaded")]
    NoDocument,

    /// 句子索引越界
    #[error("Sentence index out of range: {index} (page has {count} sentences)")]
    SentenceOutOfRange { index: usize, count: usize },

    /// 页面索引越界
    #[error("Page index out of range: {index} (document has {count} pages)")]
    PageOutOfRange { index: usize, count: usize },

    /// 文档访问错误
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    /// 引擎错误
    #[error("Speech engine error: {0}")]
    Speech(#[from] SpeechError),
}
