//! Mailbox - runtime 的消息通道

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::application::ports::{PageTextProviderPort, SpeechEvent};
use crate::application::{PlaybackError, PlaybackSnapshot};

/// 用户命令
pub enum PlaybackCommand {
    OpenDocument {
        document: Arc<dyn PageTextProviderPort>,
        start_page: usize,
    },
    Speak,
    Pause,
    Resume,
    Stop,
    NextSentence,
    PreviousSentence,
    JumpToSentence(usize),
    JumpToPage(usize),
}

impl PlaybackCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PlaybackCommand::OpenDocument { .. } => "open_document",
            PlaybackCommand::Speak => "speak",
            PlaybackCommand::Pause => "pause",
            PlaybackCommand::Resume => "resume",
            PlaybackCommand::Stop => "stop",
            PlaybackCommand::NextSentence => "next_sentence",
            PlaybackCommand::PreviousSentence => "previous_sentence",
            PlaybackCommand::JumpToSentence(_) => "jump_to_sentence",
            PlaybackCommand::JumpToPage(_) => "jump_to_page",
        }
    }
}

pub(crate) enum Message {
    Command {
        command: PlaybackCommand,
        reply: oneshot::Sender<Result<(), PlaybackError>>,
    },
    Speech(SpeechEvent),
    AdvanceDue(u64),
    Snapshot(oneshot::Sender<PlaybackSnapshot>),
    Shutdown,
}

/// runtime 的收件箱
///
/// 先创建 mailbox，把 `speech_sink()` 交给语音引擎，再用它启动 runtime
pub struct Mailbox {
    pub(crate) tx: mpsc::UnboundedSender<Message>,
    pub(crate) rx: mpsc::UnboundedReceiver<Message>,
}

impl Mailbox {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    pub fn speech_sink(&self) -> SpeechEventSink {
        SpeechEventSink {
            tx: self.tx.clone(),
        }
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

/// 引擎回调入口，可以在任意线程调用
#[derive(Clone)]
pub struct SpeechEventSink {
    tx: mpsc::UnboundedSender<Message>,
}

impl SpeechEventSink {
    pub fn emit(&self, event: SpeechEvent) {
        if self.tx.send(Message::Speech(event)).is_err() {
            tracing::debug!("Playback runtime gone, dropping speech event");
        }
    }

    /// 不连接任何 runtime 的 sink，事件全部丢弃
    pub fn detached() -> Self {
        let (tx, _) = mpsc::unbounded_channel();
        Self { tx }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::UtteranceId;

    #[test]
    fn test_sink_delivers_into_mailbox() {
        let mut mailbox = Mailbox::new();
        let sink = mailbox.speech_sink();
        sink.emit(SpeechEvent::finished(UtteranceId(7)));

        match mailbox.rx.try_recv() {
            Ok(Message::Speech(event)) => assert_eq!(event.utterance_id, UtteranceId(7)),
            _ => panic!("expected a speech message"),
        }
    }

    #[test]
    fn test_detached_sink_drops_events() {
        let sink = SpeechEventSink::detached();
        sink.emit(SpeechEvent::finished(UtteranceId(1)));
    }

    #[test]
    fn test_command_names() {
        assert_eq!(PlaybackCommand::JumpToSentence(3).name(), "jump_to_sentence");
        assert_eq!(PlaybackCommand::Stop.name(), "stop");
    }
}
