//! Playback Runtime Implementation

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::mailbox::{Mailbox, Message, PlaybackCommand};
use crate::application::ports::PageTextProviderPort;
use crate::application::{Directive, PlaybackController, PlaybackError, PlaybackSnapshot};

/// Handle 调用错误
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Playback runtime is not running")]
    Closed,

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

/// 播放 runtime
///
/// 独占控制器；`run` 在收到 Shutdown 前一直运行
pub struct PlaybackRuntime {
    controller: PlaybackController,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl PlaybackRuntime {
    pub fn new(controller: PlaybackController, mailbox: Mailbox) -> (Self, PlaybackHandle) {
        let handle = PlaybackHandle {
            tx: mailbox.tx.clone(),
        };
        let runtime = Self {
            controller,
            tx: mailbox.tx,
            rx: mailbox.rx,
        };
        (runtime, handle)
    }

    /// 启动 runtime
    pub async fn run(mut self) {
        tracing::info!("PlaybackRuntime started");

        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Command { command, reply } => {
                    let name = command.name();
                    let result = self.apply(command);
                    if let Err(e) = &result {
                        tracing::warn!(command = name, error = %e, "Playback command failed");
                    }
                    // 调用方可能已放弃等待
                    let _ = reply.send(result);
                }
                Message::Speech(event) => {
                    if let Some(directive) = self.controller.handle_speech_event(event) {
                        self.schedule(directive);
                    }
                }
                Message::AdvanceDue(generation) => self.controller.advance(generation),
                Message::Snapshot(reply) => {
                    let _ = reply.send(self.controller.snapshot());
                }
                Message::Shutdown => {
                    self.controller.stop();
                    break;
                }
            }
        }

        tracing::info!("PlaybackRuntime stopped");
    }

    fn apply(&mut self, command: PlaybackCommand) -> Result<(), PlaybackError> {
        tracing::debug!(command = command.name(), "Applying playback command");
        match command {
            PlaybackCommand::OpenDocument {
                document,
                start_page,
            } => self.controller.open_document(document, start_page),
            PlaybackCommand::Speak => self.controller.speak(),
            PlaybackCommand::Pause => self.controller.pause(),
            PlaybackCommand::Resume => self.controller.resume(),
            PlaybackCommand::Stop => {
                self.controller.stop();
                Ok(())
            }
            PlaybackCommand::NextSentence => self.controller.next_sentence(),
            PlaybackCommand::PreviousSentence => self.controller.previous_sentence(),
            PlaybackCommand::JumpToSentence(index) => self.controller.jump_to_sentence(index),
            PlaybackCommand::JumpToPage(page_index) => self.controller.jump_to_page(page_index),
        }
    }

    /// 延迟到期后把 AdvanceDue 投回 mailbox
    fn schedule(&self, directive: Directive) {
        match directive {
            Directive::ScheduleAdvance { generation, delay } => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if tx.send(Message::AdvanceDue(generation)).is_err() {
                        tracing::debug!(generation = generation, "Runtime gone, advance dropped");
                    }
                });
            }
        }
    }
}

/// 播放控制句柄
#[derive(Clone)]
pub struct PlaybackHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl PlaybackHandle {
    /// 发送命令并等待控制器处理结果
    pub async fn execute(&self, command: PlaybackCommand) -> Result<(), RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Command { command, reply })
            .map_err(|_| RuntimeError::Closed)?;
        rx.await.map_err(|_| RuntimeError::Closed)??;
        Ok(())
    }

    pub async fn open_document(
        &self,
        document: Arc<dyn PageTextProviderPort>,
        start_page: usize,
    ) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::OpenDocument {
            document,
            start_page,
        })
        .await
    }

    pub async fn speak(&self) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::Speak).await
    }

    pub async fn pause(&self) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::Resume).await
    }

    pub async fn stop(&self) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::Stop).await
    }

    pub async fn next_sentence(&self) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::NextSentence).await
    }

    pub async fn previous_sentence(&self) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::PreviousSentence).await
    }

    pub async fn jump_to_sentence(&self, index: usize) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::JumpToSentence(index)).await
    }

    pub async fn jump_to_page(&self, page_index: usize) -> Result<(), RuntimeError> {
        self.execute(PlaybackCommand::JumpToPage(page_index)).await
    }

    pub async fn snapshot(&self) -> Result<PlaybackSnapshot, RuntimeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Message::Snapshot(reply))
            .map_err(|_| RuntimeError::Closed)?;
        rx.await.map_err(|_| RuntimeError::Closed)
    }

    /// 停止播放并结束 runtime
    pub fn shutdown(&self) {
        if self.tx.send(Message::Shutdown).is_err() {
            tracing::debug!("Playback runtime already stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::broadcast;

    use crate::application::ports::PlaybackEvent;
    use crate::application::{
        HighlightOverlay, LocatorConfig, PlaybackConfig, PlaybackState, SpeechEngines, TextLocator,
    };
    use crate::domain::{DocumentKey, PositionValidator, SegmentConfig};
    use crate::infrastructure::adapters::{
        InMemoryDocument, LayoutConfig, SimulatedSpeechConfig, SimulatedSpeechEngine,
        TracingRenderer,
    };
    use crate::infrastructure::events::EventPublisher;
    use crate::infrastructure::memory::InMemoryResultCache;

    struct Running {
        handle: PlaybackHandle,
        events: broadcast::Receiver<PlaybackEvent>,
        join: tokio::task::JoinHandle<()>,
    }

    fn start(word_delay_ms: u64) -> Running {
        let mailbox = Mailbox::new();
        let engine = Arc::new(SimulatedSpeechEngine::new(
            SimulatedSpeechConfig {
                word_delay_ms,
                ..Default::default()
            },
            mailbox.speech_sink(),
        ));
        let publisher = EventPublisher::with_capacity(1024).arc();
        let events = publisher.subscribe();
        let locator = TextLocator::new(
            LocatorConfig::default(),
            PositionValidator::default(),
            InMemoryResultCache::default().arc(),
        );
        let controller = PlaybackController::new(
            PlaybackConfig { advance_delay_ms: 5 },
            SegmentConfig::default(),
            locator,
            HighlightOverlay::new(Arc::new(TracingRenderer::new())),
            SpeechEngines::new(engine),
            publisher,
        );
        let (runtime, handle) = PlaybackRuntime::new(controller, mailbox);
        let join = tokio::spawn(runtime.run());
        Running {
            handle,
            events,
            join,
        }
    }

    fn document(pages: &[&str]) -> Arc<InMemoryDocument> {
        Arc::new(InMemoryDocument::new(
            DocumentKey::new("runtime-test"),
            pages.iter().map(|page| page.to_string()).collect(),
            LayoutConfig::default(),
        ))
    }

    async fn until_finished(events: &mut broadcast::Receiver<PlaybackEvent>) -> Vec<PlaybackEvent> {
        let collect = async {
            let mut seen = Vec::new();
            loop {
                match events.recv().await {
                    Ok(PlaybackEvent::PlaybackFinished) => {
                        seen.push(PlaybackEvent::PlaybackFinished);
                        return seen;
                    }
                    Ok(event) => seen.push(event),
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return seen,
                }
            }
        };
        tokio::time::timeout(Duration::from_secs(5), collect)
            .await
            .expect("playback should finish")
    }

    #[tokio::test]
    async fn test_reads_whole_document_in_order() {
        let mut running = start(1);
        running
            .handle
            .open_document(document(&["First sentence. Second one.", "Next page here."]), 0)
            .await
            .unwrap();
        running.handle.speak().await.unwrap();

        let events = until_finished(&mut running.events).await;
        let changed: Vec<(usize, usize)> = events
            .iter()
            .filter_map(|event| match event {
                PlaybackEvent::SentenceChanged {
                    page_index,
                    sentence_index,
                    ..
                } => Some((*page_index, *sentence_index)),
                _ => None,
            })
            .collect();
        assert_eq!(changed, vec![(0, 0), (0, 1), (1, 0)]);
        assert!(events
            .iter()
            .any(|event| matches!(event, PlaybackEvent::WordSpoken { .. })));

        let snapshot = running.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Idle);

        running.handle.shutdown();
        running.join.await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_cancels_pending_speech() {
        let running = start(50);
        running
            .handle
            .open_document(document(&["A fairly long sentence to read. Another one."]), 0)
            .await
            .unwrap();
        running.handle.speak().await.unwrap();
        running.handle.stop().await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let snapshot = running.handle.snapshot().await.unwrap();
        assert_eq!(snapshot.state, PlaybackState::Stopped);
        assert_eq!(snapshot.sentence_index, None);

        running.handle.shutdown();
        running.join.await.unwrap();
    }

    #[tokio::test]
    async fn test_jump_reads_single_sentence() {
        let mut running = start(1);
        running
            .handle
            .open_document(document(&["One here. Two here. Three here."]), 0)
            .await
            .unwrap();
        running.handle.jump_to_sentence(1).await.unwrap();

        let events = until_finished(&mut running.events).await;
        let spoken: Vec<usize> = events
            .iter()
            .filter_map(|event| match event {
                PlaybackEvent::SentenceChanged { sentence_index, .. } => Some(*sentence_index),
                _ => None,
            })
            .collect();
        assert_eq!(spoken, vec![1]);

        running.handle.shutdown();
        running.join.await.unwrap();
    }

    #[tokio::test]
    async fn test_command_errors_are_returned() {
        let running = start(1);
        let err = running.handle.speak().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Playback(PlaybackError::NoDocument)));

        running
            .handle
            .open_document(document(&["Only one."]), 0)
            .await
            .unwrap();
        let err = running.handle.jump_to_sentence(4).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Playback(PlaybackError::SentenceOutOfRange { index: 4, count: 1 })
        ));

        running.handle.shutdown();
        running.join.await.unwrap();
    }

    #[tokio::test]
    async fn test_handle_after_shutdown_reports_closed() {
        let running = start(1);
        running.handle.shutdown();
        running.join.await.unwrap();

        let err = running.handle.speak().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Closed));
    }
}
