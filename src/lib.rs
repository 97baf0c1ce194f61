//! Readalong - 朗读与同步高亮
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Document: 句子、区间、矩形等值对象
//! - TextSegmenter: 分句
//! - Locator: 文本归一化与搜索片段选择
//! - PositionValidator: 多片段位置校验
//!
//! 应用层 (application/):
//! - Ports: 端口定义（PageTextProvider, SpeechEngine, Renderer, ResultCache, PlaybackEvent）
//! - TextLocator: 句子定位
//! - HighlightOverlay: 单一高亮
//! - PlaybackController: 朗读状态机
//!
//! 基础设施层 (infrastructure/):
//! - Memory: ResultCache 内存实现
//! - Runtime: 播放控制器的 actor 宿主
//! - Adapters: 内存文档、模拟语音引擎、日志渲染器
//! - Events: 播放事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
