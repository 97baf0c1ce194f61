//! Configuration Types
//!
//! 定义所有配置结构体。各组件的配置类型在组件内部定义，这里只做汇总

use serde::Deserialize;

use crate::application::{LocatorConfig, PlaybackConfig};
use crate::domain::{SegmentConfig, ValidatorConfig};
use crate::infrastructure::adapters::{LayoutConfig, SimulatedSpeechConfig};
use crate::infrastructure::memory::CacheConfig;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 分句配置
    #[serde(default)]
    pub segmenter: SegmentConfig,

    /// 定位配置
    #[serde(default)]
    pub locator: LocatorConfig,

    /// 位置校验阈值
    #[serde(default)]
    pub validator: ValidatorConfig,

    /// 定位结果缓存
    #[serde(default)]
    pub cache: CacheConfig,

    /// 播放配置
    #[serde(default)]
    pub playback: PlaybackConfig,

    /// 语音引擎配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 内存文档排版
    #[serde(default)]
    pub layout: LayoutConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 语音引擎配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeechConfig {
    /// 主引擎
    #[serde(default)]
    pub engine: SimulatedSpeechConfig,

    /// 是否配置备用引擎
    #[serde(default)]
    pub fallback_enabled: bool,
}

impl SpeechConfig {
    /// 备用引擎配置（与主引擎节奏相同，名称加后缀）
    pub fn fallback_engine(&self) -> Option<SimulatedSpeechConfig> {
        self.fallback_enabled.then(|| SimulatedSpeechConfig {
            name: format!("{}-fallback", self.engine.name),
            ..self.engine.clone()
        })
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
