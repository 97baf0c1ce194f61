//! Simulated Speech Engine - 按词计时的模拟朗读
//!
//! 不产生声音，只按固定节奏回报朗读进度。
//! 用于演示宿主和测试，也可以作为真实引擎不可用时的备用引擎

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    SpeechEnginePort, SpeechError, SpeechEvent, SpeechEventKind, Utterance, UtteranceId,
};
use crate::domain::TextRange;
use crate::infrastructure::runtime::SpeechEventSink;

/// 模拟引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedSpeechConfig {
    /// 引擎名称
    #[serde(default = "default_name")]
    pub name: String,

    /// 每个词的朗读时长（毫秒）
    #[serde(default = "default_word_delay_ms")]
    pub word_delay_ms: u64,

    /// 无空格文本（如中文）按此长度切分为“词”
    #[serde(default = "default_max_word_chars")]
    pub max_word_chars: usize,
}

fn default_name() -> String {
    "simulated".to_string()
}

fn default_word_delay_ms() -> u64 {
    120
}

fn default_max_word_chars() -> usize {
    8
}

impl Default for SimulatedSpeechConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            word_delay_ms: default_word_delay_ms(),
            max_word_chars: default_max_word_chars(),
        }
    }
}

struct ActiveUtterance {
    id: UtteranceId,
    cancel: CancellationToken,
    paused: watch::Sender<bool>,
}

/// 模拟语音引擎
pub struct SimulatedSpeechEngine {
    config: SimulatedSpeechConfig,
    sink: SpeechEventSink,
    active: Mutex<Option<ActiveUtterance>>,
}

impl SimulatedSpeechEngine {
    pub fn new(config: SimulatedSpeechConfig, sink: SpeechEventSink) -> Self {
        tracing::info!(
            name = %config.name,
            word_delay_ms = config.word_delay_ms,
            "SimulatedSpeechEngine initialized"
        );
        Self {
            config,
            sink,
            active: Mutex::new(None),
        }
    }

    fn take_active(&self) -> Option<ActiveUtterance> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn with_active<T>(&self, f: impl FnOnce(&ActiveUtterance) -> T) -> Result<T, SpeechError> {
        let guard = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(f).ok_or(SpeechError::NoActiveUtterance)
    }

    async fn narrate(
        id: UtteranceId,
        words: Vec<TextRange>,
        delay: Duration,
        cancel: CancellationToken,
        mut paused: watch::Receiver<bool>,
        sink: SpeechEventSink,
    ) {
        for range in words {
            loop {
                let is_paused = *paused.borrow_and_update();
                if !is_paused {
                    break;
                }
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    changed = paused.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            sink.emit(SpeechEvent::range_spoken(id, range));
        }

        if !cancel.is_cancelled() {
            tracing::trace!(utterance = %id, "Simulated utterance finished");
            sink.emit(SpeechEvent::finished(id));
        }
    }
}

/// 按空白切词，过长的词按 max_chars 再切分
///
/// 区间以码点计，相对整段文本
pub(crate) fn word_ranges(text: &str, max_chars: usize) -> Vec<TextRange> {
    fn push_chunked(ranges: &mut Vec<TextRange>, start: usize, end: usize, max_chars: usize) {
        let mut offset = start;
        while offset < end {
            let len = (end - offset).min(max_chars);
            ranges.push(TextRange::new(offset, len));
            offset += len;
        }
    }

    let max_chars = max_chars.max(1);
    let mut ranges = Vec::new();
    let mut start: Option<usize> = None;
    let mut total = 0;

    for (i, c) in text.chars().enumerate() {
        total = i + 1;
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                push_chunked(&mut ranges, s, i, max_chars);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        push_chunked(&mut ranges, s, total, max_chars);
    }
    ranges
}

impl SpeechEnginePort for SimulatedSpeechEngine {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SpeechError::Unavailable(format!("no async runtime: {}", e)))?;

        let words = word_ranges(&utterance.text, self.config.max_word_chars);
        if words.is_empty() {
            return Err(SpeechError::Rejected("empty utterance".to_string()));
        }

        if let Some(previous) = self.take_active() {
            previous.cancel.cancel();
        }

        let cancel = CancellationToken::new();
        let (paused_tx, paused_rx) = watch::channel(false);
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some(ActiveUtterance {
            id: utterance.id,
            cancel: cancel.clone(),
            paused: paused_tx,
        });

        tracing::debug!(
            utterance = %utterance.id,
            words = words.len(),
            "Simulated utterance started"
        );

        runtime.spawn(Self::narrate(
            utterance.id,
            words,
            Duration::from_millis(self.config.word_delay_ms),
            cancel,
            paused_rx,
            self.sink.clone(),
        ));
        Ok(())
    }

    fn pause(&self) -> Result<(), SpeechError> {
        let id = self.with_active(|active| {
            active.paused.send_replace(true);
            active.id
        })?;
        self.sink.emit(SpeechEvent::new(id, SpeechEventKind::Paused));
        Ok(())
    }

    fn resume(&self) -> Result<(), SpeechError> {
        let id = self.with_active(|active| {
            active.paused.send_replace(false);
            active.id
        })?;
        self.sink.emit(SpeechEvent::new(id, SpeechEventKind::Resumed));
        Ok(())
    }

    fn stop(&self) {
        if let Some(active) = self.take_active() {
            tracing::debug!(utterance = %active.id, "Simulated utterance cancelled");
            active.cancel.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::runtime::{Mailbox, Message};

    #[test]
    fn test_word_ranges_split_on_whitespace() {
        let ranges = word_ranges("Hello  big world.", 10);
        assert_eq!(
            ranges,
            vec![
                TextRange::new(0, 5),
                TextRange::new(7, 3),
                TextRange::new(11, 6)
            ]
        );
    }

    #[test]
    fn test_word_ranges_chunk_long_runs() {
        let ranges = word_ranges("今天天气很好。", 4);
        assert_eq!(ranges, vec![TextRange::new(0, 4), TextRange::new(4, 3)]);
    }

    #[test]
    fn test_speak_without_runtime_is_unavailable() {
        let engine = SimulatedSpeechEngine::new(
            SimulatedSpeechConfig::default(),
            SpeechEventSink::detached(),
        );
        let result = engine.speak(Utterance {
            id: UtteranceId(1),
            text: "Hello.".to_string(),
        });
        assert!(matches!(result, Err(SpeechError::Unavailable(_))));
    }

    #[test]
    fn test_pause_without_utterance() {
        let engine = SimulatedSpeechEngine::new(
            SimulatedSpeechConfig::default(),
            SpeechEventSink::detached(),
        );
        assert!(matches!(engine.pause(), Err(SpeechError::NoActiveUtterance)));
    }

    #[tokio::test]
    async fn test_reports_words_then_finished() {
        let mut mailbox = Mailbox::new();
        let engine = SimulatedSpeechEngine::new(
            SimulatedSpeechConfig {
                word_delay_ms: 1,
                ..Default::default()
            },
            mailbox.speech_sink(),
        );

        engine
            .speak(Utterance {
                id: UtteranceId(3),
                text: "Two words.".to_string(),
            })
            .unwrap();

        let mut kinds = Vec::new();
        while let Some(message) = mailbox.rx.recv().await {
            if let Message::Speech(event) = message {
                assert_eq!(event.utterance_id, UtteranceId(3));
                let done = event.kind == SpeechEventKind::Finished;
                kinds.push(event.kind);
                if done {
                    break;
                }
            }
        }
        assert_eq!(
            kinds,
            vec![
                SpeechEventKind::RangeSpoken {
                    range: TextRange::new(0, 3)
                },
                SpeechEventKind::RangeSpoken {
                    range: TextRange::new(4, 6)
                },
                SpeechEventKind::Finished,
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_suppresses_finished() {
        let mut mailbox = Mailbox::new();
        let engine = SimulatedSpeechEngine::new(
            SimulatedSpeechConfig {
                word_delay_ms: 20,
                ..Default::default()
            },
            mailbox.speech_sink(),
        );

        engine
            .speak(Utterance {
                id: UtteranceId(1),
                text: "Several words to be read.".to_string(),
            })
            .unwrap();
        engine.stop();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(mailbox.rx.try_recv().is_err());
    }
}
