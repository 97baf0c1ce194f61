//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "READALONG";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `READALONG_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `READALONG_PLAYBACK__ADVANCE_DELAY_MS=250`
/// - `READALONG_LOCATOR__SEARCH_RADIUS=3`
/// - `READALONG_SPEECH__ENGINE__WORD_DELAY_MS=80`
/// - `READALONG_LOG__JSON=true`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 标量默认值（最低优先级），分隔符列表由 serde 默认值补齐
    builder = builder
        .set_default("segmenter.soft_breaks", false)?
        .set_default("segmenter.min_chars_for_soft", 20)?
        .set_default("locator.search_radius", 2)?
        .set_default("locator.selection.segment_len", 3)?
        .set_default("locator.selection.coverage_ratio", 0.6)?
        .set_default("locator.selection.max_segments", 5)?
        .set_default("validator.page_gap_tolerance", 30.0)?
        .set_default("validator.line_tolerance", 30.0)?
        .set_default("validator.max_line_changes", 2)?
        .set_default("validator.horizontal_tolerance", 100.0)?
        .set_default("validator.spacing_tolerance", 50.0)?
        .set_default("cache.max_entries", 100)?
        .set_default("cache.cleanup_threshold", 80)?
        .set_default("cache.max_age_ms", 300_000)?
        .set_default("playback.advance_delay_ms", 100)?
        .set_default("speech.engine.name", "simulated")?
        .set_default("speech.engine.word_delay_ms", 120)?
        .set_default("speech.engine.max_word_chars", 8)?
        .set_default("speech.fallback_enabled", false)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 例如: READALONG_PLAYBACK__ADVANCE_DELAY_MS=250
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    let selection = &config.locator.selection;
    if selection.segment_len == 0 {
        return Err(ConfigError::ValidationError(
            "Segment length cannot be 0".to_string(),
        ));
    }
    if !(selection.coverage_ratio > 0.0 && selection.coverage_ratio <= 1.0) {
        return Err(ConfigError::ValidationError(format!(
            "Coverage ratio must be in (0, 1], got {}",
            selection.coverage_ratio
        )));
    }
    if selection.max_segments == 0 {
        return Err(ConfigError::ValidationError(
            "Max segments cannot be 0".to_string(),
        ));
    }

    if config.cache.max_entries == 0 {
        return Err(ConfigError::ValidationError(
            "Cache max entries cannot be 0".to_string(),
        ));
    }
    if config.cache.cleanup_threshold > config.cache.max_entries {
        return Err(ConfigError::ValidationError(format!(
            "Cache cleanup threshold ({}) exceeds max entries ({})",
            config.cache.cleanup_threshold, config.cache.max_entries
        )));
    }

    if config.layout.chars_per_line == 0 || config.layout.char_width <= 0.0 {
        return Err(ConfigError::ValidationError(
            "Layout needs a positive line width and char width".to_string(),
        ));
    }

    if config.speech.engine.max_word_chars == 0 {
        return Err(ConfigError::ValidationError(
            "Speech max word chars cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Soft Breaks: {}", config.segmenter.soft_breaks);
    tracing::info!(
        "Locator: radius={} segment_len={} coverage={} max_segments={}",
        config.locator.search_radius,
        config.locator.selection.segment_len,
        config.locator.selection.coverage_ratio,
        config.locator.selection.max_segments
    );
    tracing::info!(
        "Cache: max_entries={} cleanup_threshold={} max_age={}ms",
        config.cache.max_entries,
        config.cache.cleanup_threshold,
        config.cache.max_age_ms
    );
    tracing::info!("Advance Delay: {}ms", config.playback.advance_delay_ms);
    tracing::info!("Speech Engine: {}", config.speech.engine.name);
    tracing::info!("Fallback Enabled: {}", config.speech.fallback_enabled);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
