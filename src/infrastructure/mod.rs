//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod events;
pub mod memory;
pub mod runtime;

pub use events::EventPublisher;
pub use memory::{CacheConfig, InMemoryResultCache};
pub use runtime::{
    Mailbox, PlaybackCommand, PlaybackHandle, PlaybackRuntime, RuntimeError, SpeechEventSink,
};
