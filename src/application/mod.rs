//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（PageTextProvider、SpeechEngine、Renderer、ResultCache、PlaybackEvent）
//! - locator: 句子定位服务
//! - overlay: 高亮层
//! - playback: 朗读状态机
//! - error: 应用层错误定义

pub mod error;
pub mod locator;
pub mod overlay;
pub mod playback;
pub mod ports;

// Re-exports
pub use error::PlaybackError;
pub use locator::{LocatorConfig, TextLocator};
pub use overlay::HighlightOverlay;
pub use playback::{
    Directive, PlaybackConfig, PlaybackController, PlaybackSnapshot, PlaybackState, SpeechEngines,
};

pub use ports::{
    // Document
    DocumentError,
    PageTextProviderPort,
    // Events
    Highlight,
    PlaybackEvent,
    PlaybackEventPort,
    // Renderer
    RendererPort,
    // Result cache
    CacheEntry,
    CacheKey,
    CacheStats,
    ResultCachePort,
    // Speech engine
    SpeechEnginePort,
    SpeechError,
    SpeechEvent,
    SpeechEventKind,
    Utterance,
    UtteranceId,
};
