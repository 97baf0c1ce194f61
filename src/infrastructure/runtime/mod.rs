//! Playback Runtime - 播放控制器的 actor 宿主
//!
//! 控制器只在 runtime 任务上被访问：用户命令、引擎回调和延迟推进
//! 都通过同一个 mailbox 串行送达

mod mailbox;
mod playback_runtime;

#[cfg(test)]
pub(crate) use mailbox::Message;
pub use mailbox::{Mailbox, PlaybackCommand, SpeechEventSink};
pub use playback_runtime::{PlaybackHandle, PlaybackRuntime, RuntimeError};
