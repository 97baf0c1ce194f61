//! Readalong - 命令行朗读演示
//!
//! 用模拟语音引擎朗读文本文件（换页符分页），高亮输出到日志

use std::sync::Arc;

use readalong::application::{
    HighlightOverlay, PlaybackController, PlaybackEvent, SpeechEngines, TextLocator,
};
use readalong::config::{load_config, print_config, AppConfig};
use readalong::domain::{DocumentKey, PositionValidator};
use readalong::infrastructure::adapters::{
    InMemoryDocument, SimulatedSpeechEngine, TracingRenderer,
};
use readalong::infrastructure::events::EventPublisher;
use readalong::infrastructure::memory::InMemoryResultCache;
use readalong::infrastructure::runtime::{Mailbox, PlaybackRuntime};

const SAMPLE_TEXT: &str = "The quick brown fox jumps over the lazy dog. It was not amused!\n\
Did the fox care? Not at all.\u{0C}第二页从这里开始。狐狸跑远了！";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);
    tracing::info!("Readalong - 朗读与同步高亮");
    print_config(&config);

    // 文档：命令行参数指定文件，否则使用内置示例
    let document = match std::env::args().nth(1) {
        Some(path) => InMemoryDocument::from_file(&path, config.layout.clone())
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", path, e))?,
        None => InMemoryDocument::from_text(
            DocumentKey::generate(),
            SAMPLE_TEXT,
            config.layout.clone(),
        ),
    };
    let document = Arc::new(document);

    // 创建 mailbox，语音引擎的回调经由它回到 runtime
    let mailbox = Mailbox::new();
    let mut engines = SpeechEngines::new(Arc::new(SimulatedSpeechEngine::new(
        config.speech.engine.clone(),
        mailbox.speech_sink(),
    )));
    if let Some(fallback) = config.speech.fallback_engine() {
        engines = engines.with_fallback(Arc::new(SimulatedSpeechEngine::new(
            fallback,
            mailbox.speech_sink(),
        )));
    }

    // 创建事件发布器，先订阅再启动
    let event_publisher = EventPublisher::new().arc();
    let mut events = event_publisher.subscribe();

    let locator = TextLocator::new(
        config.locator.clone(),
        PositionValidator::new(config.validator.clone()),
        InMemoryResultCache::new(config.cache.clone()).arc(),
    );
    let controller = PlaybackController::new(
        config.playback.clone(),
        config.segmenter.clone(),
        locator,
        HighlightOverlay::new(Arc::new(TracingRenderer::new())),
        engines,
        event_publisher.clone(),
    );

    let (runtime, handle) = PlaybackRuntime::new(controller, mailbox);
    let runtime_task = tokio::spawn(runtime.run());

    handle.open_document(document, 0).await?;
    handle.speak().await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(PlaybackEvent::PlaybackFinished) => {
                    tracing::info!("Playback finished");
                    break;
                }
                Ok(PlaybackEvent::SentenceChanged { text, page_index, sentence_index }) => {
                    tracing::info!(page_index, sentence_index, text = %text, "Reading");
                }
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => tracing::debug!(event = %json, "Playback event"),
                    Err(e) => tracing::warn!(error = %e, "Failed to encode playback event"),
                },
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event receiver lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping playback");
                handle.stop().await?;
                break;
            }
        }
    }

    handle.shutdown();
    runtime_task.await?;
    Ok(())
}

/// 初始化日志
fn init_tracing(config: &AppConfig) {
    let log_filter = format!("{},readalong={}", config.log.level, config.log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
