//! Playback State - 播放状态与配置

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::Sentence;

/// 播放配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// 句子结束（清除高亮）到朗读下一句之间的间隔（毫秒）
    #[serde(default = "default_advance_delay_ms")]
    pub advance_delay_ms: u64,
}

fn default_advance_delay_ms() -> u64 {
    100
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            advance_delay_ms: default_advance_delay_ms(),
        }
    }
}

impl PlaybackConfig {
    pub fn advance_delay(&self) -> Duration {
        Duration::from_millis(self.advance_delay_ms)
    }
}

/// 播放状态
///
/// Speaking / Paused 时恰好有一个当前句子
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Speaking { sentence: Sentence },
    Paused { sentence: Sentence, resume_offset: usize },
    Stopped,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Speaking { .. } => "speaking",
            PlaybackState::Paused { .. } => "paused",
            PlaybackState::Stopped => "stopped",
        }
    }
}

/// 控制器要求宿主执行的延迟动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    /// 延迟后调用 `advance(generation)`
    ScheduleAdvance { generation: u64, delay: Duration },
}

/// 播放状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub page_index: usize,
    pub sentence_index: Option<usize>,
    pub sentence_count: usize,
    pub user_initiated: bool,
    pub generation: u64,
}
