//! Application Ports - 出站端口定义
//!
//! 定义应用层与外部协作者之间的抽象接口

mod page_text_provider;
mod playback_events;
mod renderer;
mod result_cache;
mod speech_engine;

pub use page_text_provider::{DocumentError, PageTextProviderPort};
pub use playback_events::{Highlight, PlaybackEvent, PlaybackEventPort};
pub use renderer::RendererPort;
pub use result_cache::{CacheEntry, CacheKey, CacheStats, ResultCachePort};
pub use speech_engine::{
    SpeechEnginePort, SpeechError, SpeechEvent, SpeechEventKind, Utterance, UtteranceId,
};
