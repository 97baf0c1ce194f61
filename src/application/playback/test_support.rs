//! 播放控制测试替身

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{PlaybackConfig, PlaybackController, SpeechEngines};
use crate::application::locator::{LocatorConfig, TextLocator};
use crate::application::overlay::HighlightOverlay;
use crate::application::ports::{
    DocumentError, PageTextProviderPort, PlaybackEvent, PlaybackEventPort, RendererPort,
    SpeechEnginePort, SpeechError, Utterance, UtteranceId,
};
use crate::domain::{DocumentKey, PositionValidator, Rect, SegmentConfig, TextRange};
use crate::infrastructure::adapters::{InMemoryDocument, LayoutConfig};
use crate::infrastructure::memory::InMemoryResultCache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    Speak(UtteranceId, String),
    Pause,
    Resume,
    Stop,
}

/// 记录调用的语音引擎，不产生任何回调
pub(crate) struct RecordingSpeechEngine {
    name: String,
    failing: AtomicBool,
    calls: Mutex<Vec<EngineCall>>,
}

impl RecordingSpeechEngine {
    pub(crate) fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            failing: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn failing(name: &str) -> Arc<Self> {
        let engine = Self::new(name);
        engine.failing.store(true, Ordering::SeqCst);
        engine
    }

    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn spoken(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Speak(_, text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_utterance(&self) -> Option<UtteranceId> {
        self.calls().into_iter().rev().find_map(|call| match call {
            EngineCall::Speak(id, _) => Some(id),
            _ => None,
        })
    }
}

impl SpeechEnginePort for RecordingSpeechEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn speak(&self, utterance: Utterance) -> Result<(), SpeechError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SpeechError::Unavailable(format!("{} is offline", self.name)));
        }
        self.calls
            .lock()
            .unwrap()
            .push(EngineCall::Speak(utterance.id, utterance.text));
        Ok(())
    }

    fn pause(&self) -> Result<(), SpeechError> {
        self.calls.lock().unwrap().push(EngineCall::Pause);
        Ok(())
    }

    fn resume(&self) -> Result<(), SpeechError> {
        self.calls.lock().unwrap().push(EngineCall::Resume);
        Ok(())
    }

    fn stop(&self) {
        self.calls.lock().unwrap().push(EngineCall::Stop);
    }
}

#[derive(Default)]
pub(crate) struct RecordingRenderer {
    pub(crate) highlights: Mutex<Vec<(usize, Rect)>>,
    pub(crate) clears: Mutex<usize>,
}

impl RendererPort for RecordingRenderer {
    fn highlight(&self, bounds: Rect, page_index: usize) {
        self.highlights.lock().unwrap().push((page_index, bounds));
    }

    fn clear_highlight(&self) {
        *self.clears.lock().unwrap() += 1;
    }
}

#[derive(Default)]
pub(crate) struct RecordingEvents {
    events: Mutex<Vec<PlaybackEvent>>,
}

impl RecordingEvents {
    pub(crate) fn events(&self) -> Vec<PlaybackEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn finished_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|event| matches!(event, PlaybackEvent::PlaybackFinished))
            .count()
    }

    pub(crate) fn changed_sentences(&self) -> Vec<(usize, usize)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PlaybackEvent::SentenceChanged {
                    page_index,
                    sentence_index,
                    ..
                } => Some((page_index, sentence_index)),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackEventPort for RecordingEvents {
    fn publish(&self, event: PlaybackEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// 页面文本可用但没有几何信息的文档
pub(crate) struct NoGeometryDocument {
    key: DocumentKey,
    pages: Vec<String>,
}

impl NoGeometryDocument {
    pub(crate) fn new(pages: &[&str]) -> Self {
        Self {
            key: DocumentKey::new("no-geometry"),
            pages: pages.iter().map(|page| page.to_string()).collect(),
        }
    }
}

impl PageTextProviderPort for NoGeometryDocument {
    fn document_key(&self) -> &DocumentKey {
        &self.key
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, page_index: usize) -> Result<String, DocumentError> {
        self.pages
            .get(page_index)
            .cloned()
            .ok_or(DocumentError::PageOutOfRange {
                page_index,
                page_count: self.pages.len(),
            })
    }

    fn geometry(&self, _page_index: usize, _range: TextRange) -> Option<Rect> {
        None
    }
}

/// 指定页读取失败的文档
pub(crate) struct FlakyDocument {
    inner: InMemoryDocument,
    broken_page: usize,
}

impl FlakyDocument {
    pub(crate) fn new(pages: &[&str], broken_page: usize) -> Self {
        Self {
            inner: InMemoryDocument::new(
                DocumentKey::new("flaky"),
                pages.iter().map(|page| page.to_string()).collect(),
                LayoutConfig::default(),
            ),
            broken_page,
        }
    }
}

impl PageTextProviderPort for FlakyDocument {
    fn document_key(&self) -> &DocumentKey {
        self.inner.document_key()
    }

    fn page_count(&self) -> usize {
        self.inner.page_count()
    }

    fn page_text(&self, page_index: usize) -> Result<String, DocumentError> {
        if page_index == self.broken_page {
            return Err(DocumentError::TextUnavailable(format!("page {}", page_index)));
        }
        self.inner.page_text(page_index)
    }

    fn geometry(&self, page_index: usize, range: TextRange) -> Option<Rect> {
        self.inner.geometry(page_index, range)
    }
}

pub(crate) fn document(key: &str, pages: &[&str]) -> Arc<InMemoryDocument> {
    Arc::new(InMemoryDocument::new(
        DocumentKey::new(key),
        pages.iter().map(|page| page.to_string()).collect(),
        LayoutConfig::default(),
    ))
}

pub(crate) struct Harness {
    pub(crate) controller: PlaybackController,
    pub(crate) engine: Arc<RecordingSpeechEngine>,
    pub(crate) renderer: Arc<RecordingRenderer>,
    pub(crate) events: Arc<RecordingEvents>,
    pub(crate) cache: Arc<InMemoryResultCache>,
}

pub(crate) fn harness_with(engines: SpeechEngines, engine: Arc<RecordingSpeechEngine>) -> Harness {
    let renderer = Arc::new(RecordingRenderer::default());
    let events = Arc::new(RecordingEvents::default());
    let cache = InMemoryResultCache::default().arc();
    let locator = TextLocator::new(
        LocatorConfig::default(),
        PositionValidator::default(),
        cache.clone(),
    );
    let controller = PlaybackController::new(
        PlaybackConfig::default(),
        SegmentConfig::default(),
        locator,
        HighlightOverlay::new(renderer.clone()),
        engines,
        events.clone(),
    );
    Harness {
        controller,
        engine,
        renderer,
        events,
        cache,
    }
}

pub(crate) fn harness() -> Harness {
    let engine = RecordingSpeechEngine::new("recording");
    harness_with(SpeechEngines::new(engine.clone()), engine)
}
