//! Playback Event Port - 向宿主发布播放事件

use serde::{Deserialize, Serialize};

use crate::domain::{Rect, TextRange};

/// 当前高亮区域
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub page_index: usize,
    pub bounds: Rect,
}

/// 播放事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PlaybackEvent {
    /// 当前句子变更
    SentenceChanged {
        text: String,
        page_index: usize,
        sentence_index: usize,
    },
    /// 句子朗读完成
    SentenceFinished {
        page_index: usize,
        sentence_index: usize,
    },
    /// 高亮变更（None 表示清除）
    HighlightChanged { highlight: Option<Highlight> },
    /// 引擎报告的朗读进度
    WordSpoken {
        page_index: usize,
        sentence_index: usize,
        range: TextRange,
    },
    /// 状态变更
    StateChanged { state: String },
    /// 引擎失败
    EngineFailed { engine: String, error: String },
    /// 播放结束
    PlaybackFinished,
}

/// Playback Event Port
pub trait PlaybackEventPort: Send + Sync {
    fn publish(&self, event: PlaybackEvent);
}
