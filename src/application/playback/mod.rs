//! Playback - 朗读播放控制
//!
//! 控制器是同步状态机，由单一所有者驱动；
//! 延迟推进以 Directive 形式交给宿主调度

mod controller;
mod state;
#[cfg(test)]
pub(crate) mod test_support;

pub use controller::{PlaybackController, SpeechEngines};
pub use state::{Directive, PlaybackConfig, PlaybackSnapshot, PlaybackState};
