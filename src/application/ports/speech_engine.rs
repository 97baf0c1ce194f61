//! Speech Engine Port - 语音合成引擎抽象
//!
//! 合成本身在外部完成。引擎通过构造时注入的事件通道异步回报进度，
//! 回调不会直接修改播放状态

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::TextRange;

/// 语音引擎错误
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech request rejected: {0}")]
    Rejected(String),

    #[error("Speech engine unavailable: {0}")]
    Unavailable(String),

    #[error("No active utterance")]
    NoActiveUtterance,
}

/// 朗读请求标识，用于丢弃过期回调
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UtteranceId(pub u64);

impl std::fmt::Display for UtteranceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "utt-{}", self.0)
    }
}

/// 朗读请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
}

/// 引擎回调类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeechEventKind {
    /// 已读到的区间（相对朗读文本的码点区间）
    RangeSpoken { range: TextRange },
    Finished,
    Paused,
    Resumed,
    Failed { reason: String },
}

/// 引擎回调
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechEvent {
    pub utterance_id: UtteranceId,
    pub kind: SpeechEventKind,
}

impl SpeechEvent {
    pub fn new(utterance_id: UtteranceId, kind: SpeechEventKind) -> Self {
        Self { utterance_id, kind }
    }

    pub fn finished(utterance_id: UtteranceId) -> Self {
        Self::new(utterance_id, SpeechEventKind::Finished)
    }

    pub fn range_spoken(utterance_id: UtteranceId, range: TextRange) -> Self {
        Self::new(utterance_id, SpeechEventKind::RangeSpoken { range })
    }
}

/// Speech Engine Port
///
/// speak 只负责发起朗读，完成/暂停/恢复/失败均通过事件通道异步送达
pub trait SpeechEnginePort: Send + Sync {
    /// 引擎名称（日志与失败事件）
    fn name(&self) -> &str;

    /// 开始朗读，替换正在进行的朗读
    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError>;

    fn pause(&self) -> Result<(), SpeechError>;

    fn resume(&self) -> Result<(), SpeechError>;

    /// 停止当前朗读，被停止的朗读不再产生 Finished
    fn stop(&self);
}
