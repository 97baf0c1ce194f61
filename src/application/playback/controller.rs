//! Playback Controller - 朗读状态机
//!
//! 持有当前页面的句子列表与游标，驱动语音引擎、定位器与高亮层。
//! 所有输入（用户命令、引擎回调、延迟推进）都在同一个所有者上串行执行；
//! 每次停止/跳转都会递增 generation，使尚未触发的延迟推进失效

use std::sync::Arc;

use super::state::{Directive, PlaybackConfig, PlaybackSnapshot, PlaybackState};
use crate::application::error::PlaybackError;
use crate::application::locator::TextLocator;
use crate::application::overlay::HighlightOverlay;
use crate::application::ports::{
    PageTextProviderPort, PlaybackEvent, PlaybackEventPort, SpeechEnginePort, SpeechEvent,
    SpeechEventKind, Utterance, UtteranceId,
};
use crate::domain::{segment_page, SegmentConfig, Sentence};

/// 主引擎与可选的备用引擎
pub struct SpeechEngines {
    primary: Arc<dyn SpeechEnginePort>,
    fallback: Option<Arc<dyn SpeechEnginePort>>,
}

impl SpeechEngines {
    pub fn new(primary: Arc<dyn SpeechEnginePort>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// 主引擎失败后切换到备用引擎，之后一直使用备用引擎
    pub fn with_fallback(mut self, fallback: Arc<dyn SpeechEnginePort>) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

pub struct PlaybackController {
    config: PlaybackConfig,
    segment_config: SegmentConfig,
    locator: TextLocator,
    overlay: HighlightOverlay,
    engines: SpeechEngines,
    using_fallback: bool,
    events: Arc<dyn PlaybackEventPort>,

    document: Option<Arc<dyn PageTextProviderPort>>,
    page_index: usize,
    sentences: Vec<Sentence>,
    cursor: Option<usize>,
    state: PlaybackState,
    /// 当前句子由用户跳转触发，读完后不自动推进
    user_initiated: bool,
    /// 已读完当前句，正在等待延迟推进
    awaiting_advance: bool,
    generation: u64,
    next_utterance: u64,
    current_utterance: Option<UtteranceId>,
    spoken_offset: usize,
}

impl PlaybackController {
    pub fn new(
        config: PlaybackConfig,
        segment_config: SegmentConfig,
        locator: TextLocator,
        overlay: HighlightOverlay,
        engines: SpeechEngines,
        events: Arc<dyn PlaybackEventPort>,
    ) -> Self {
        Self {
            config,
            segment_config,
            locator,
            overlay,
            engines,
            using_fallback: false,
            events,
            document: None,
            page_index: 0,
            sentences: Vec::new(),
            cursor: None,
            state: PlaybackState::Idle,
            user_initiated: false,
            awaiting_advance: false,
            generation: 0,
            next_utterance: 0,
            current_utterance: None,
            spoken_offset: 0,
        }
    }

    /// 打开文档并定位到起始页
    ///
    /// 文档标识变化时清空定位缓存
    pub fn open_document(
        &mut self,
        document: Arc<dyn PageTextProviderPort>,
        start_page: usize,
    ) -> Result<(), PlaybackError> {
        let page_count = document.page_count();
        if start_page >= page_count {
            return Err(PlaybackError::PageOutOfRange {
                index: start_page,
                count: page_count,
            });
        }

        self.interrupt();
        let changed = self
            .document
            .as_ref()
            .map_or(true, |current| current.document_key() != document.document_key());
        if changed {
            self.locator.invalidate_document();
        }

        tracing::info!(
            document_key = %document.document_key(),
            page_count = page_count,
            start_page = start_page,
            "Document opened"
        );

        self.document = Some(document);
        self.user_initiated = false;
        let loaded = self.load_page(start_page);
        self.stop_on_error(loaded)?;
        self.set_state(PlaybackState::Idle);
        Ok(())
    }

    /// 开始朗读
    ///
    /// 正在朗读时无操作；暂停时等同 resume；否则从游标处（默认第一句）开始
    pub fn speak(&mut self) -> Result<(), PlaybackError> {
        match self.state {
            PlaybackState::Speaking { .. } => Ok(()),
            PlaybackState::Paused { .. } => self.resume(),
            PlaybackState::Idle | PlaybackState::Stopped => {
                if self.document.is_none() {
                    return Err(PlaybackError::NoDocument);
                }
                if self.sentences.is_empty() && !self.seek_forward(self.page_index)? {
                    tracing::info!(page_index = self.page_index, "Nothing left to read");
                    self.finish();
                    return Ok(());
                }
                let index = self
                    .cursor
                    .unwrap_or(0)
                    .min(self.sentences.len().saturating_sub(1));
                self.user_initiated = false;
                self.speak_sentence(index);
                Ok(())
            }
        }
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        let sentence = match &self.state {
            PlaybackState::Speaking { sentence } => sentence.clone(),
            _ => return Ok(()),
        };

        let resume_offset = if self.awaiting_advance {
            // 句间间隔中暂停：取消推进，恢复时直接进入下一句
            self.generation += 1;
            self.awaiting_advance = false;
            sentence.char_count()
        } else {
            self.active_engine().pause()?;
            self.spoken_offset
        };

        self.set_state(PlaybackState::Paused {
            sentence,
            resume_offset,
        });
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        let sentence = match &self.state {
            PlaybackState::Paused { sentence, .. } => sentence.clone(),
            _ => return Ok(()),
        };

        if self.current_utterance.is_none() {
            self.set_state(PlaybackState::Speaking { sentence });
            self.advance_now();
            return Ok(());
        }

        self.active_engine().resume()?;
        self.set_state(PlaybackState::Speaking { sentence });
        Ok(())
    }

    /// 停止朗读并重置游标
    pub fn stop(&mut self) {
        if matches!(self.state, PlaybackState::Idle | PlaybackState::Stopped) {
            return;
        }
        self.interrupt();
        self.cursor = None;
        self.user_initiated = false;
        self.set_state(PlaybackState::Stopped);
        tracing::info!(page_index = self.page_index, "Playback stopped");
    }

    /// 跳到下一句，必要时翻到下一个非空页
    pub fn next_sentence(&mut self) -> Result<(), PlaybackError> {
        self.require_document()?;
        self.interrupt();

        let mut target = self.cursor.map_or(0, |index| index + 1);
        if target >= self.sentences.len() {
            let found = self.seek_forward(self.page_index + 1);
            if !self.stop_on_error(found)? {
                self.cursor = None;
                self.finish();
                return Ok(());
            }
            target = 0;
        }

        self.user_initiated = true;
        self.speak_sentence(target);
        Ok(())
    }

    /// 跳到上一句，必要时翻到上一个非空页的最后一句
    pub fn previous_sentence(&mut self) -> Result<(), PlaybackError> {
        self.require_document()?;
        self.interrupt();

        let target = match self.cursor {
            Some(index) if index > 0 => index - 1,
            _ => {
                let found = self.seek_backward(self.page_index);
                if self.stop_on_error(found)? {
                    self.sentences.len() - 1
                } else if self.sentences.is_empty() {
                    self.finish();
                    return Ok(());
                } else {
                    0
                }
            }
        };

        self.user_initiated = true;
        self.speak_sentence(target);
        Ok(())
    }

    /// 跳到当前页的第 index 句，读完后不自动推进
    pub fn jump_to_sentence(&mut self, index: usize) -> Result<(), PlaybackError> {
        self.require_document()?;
        let count = self.sentences.len();
        if index >= count {
            return Err(PlaybackError::SentenceOutOfRange { index, count });
        }

        self.interrupt();
        self.user_initiated = true;
        self.speak_sentence(index);
        Ok(())
    }

    /// 跳到指定页并从第一句开始朗读
    pub fn jump_to_page(&mut self, page_index: usize) -> Result<(), PlaybackError> {
        let document = self.require_document()?;
        let count = document.page_count();
        if page_index >= count {
            return Err(PlaybackError::PageOutOfRange {
                index: page_index,
                count,
            });
        }

        self.interrupt();
        let loaded = self.load_page(page_index);
        self.stop_on_error(loaded)?;
        if self.sentences.is_empty() {
            tracing::info!(page_index = page_index, "Page has no sentences");
            self.finish();
            return Ok(());
        }

        self.user_initiated = true;
        self.speak_sentence(0);
        Ok(())
    }

    /// 处理引擎回调
    ///
    /// 句子读完且需要自动推进时返回 ScheduleAdvance，由宿主延迟后调用 `advance`
    pub fn handle_speech_event(&mut self, event: SpeechEvent) -> Option<Directive> {
        if self.current_utterance != Some(event.utterance_id) {
            tracing::trace!(
                utterance = %event.utterance_id,
                "Ignoring event from stale utterance"
            );
            return None;
        }

        match event.kind {
            SpeechEventKind::RangeSpoken { range } => {
                self.spoken_offset = range.end();
                if let Some(sentence_index) = self.cursor {
                    self.publish(PlaybackEvent::WordSpoken {
                        page_index: self.page_index,
                        sentence_index,
                        range,
                    });
                }
                None
            }
            SpeechEventKind::Paused => {
                if let PlaybackState::Speaking { sentence } = &self.state {
                    let sentence = sentence.clone();
                    let resume_offset = self.spoken_offset;
                    self.set_state(PlaybackState::Paused {
                        sentence,
                        resume_offset,
                    });
                }
                None
            }
            SpeechEventKind::Resumed => {
                if let PlaybackState::Paused { sentence, .. } = &self.state {
                    let sentence = sentence.clone();
                    self.set_state(PlaybackState::Speaking { sentence });
                }
                None
            }
            SpeechEventKind::Failed { reason } => {
                self.handle_engine_failure(reason);
                None
            }
            SpeechEventKind::Finished => self.complete_utterance(),
        }
    }

    /// 延迟到期后推进到下一句
    ///
    /// generation 不匹配说明期间发生过停止或跳转，直接忽略
    pub fn advance(&mut self, generation: u64) {
        if generation != self.generation || !self.awaiting_advance {
            tracing::debug!(
                generation = generation,
                current = self.generation,
                "Ignoring stale advance"
            );
            return;
        }
        self.advance_now();
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state.clone(),
            page_index: self.page_index,
            sentence_index: self.cursor,
            sentence_count: self.sentences.len(),
            user_initiated: self.user_initiated,
            generation: self.generation,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    // ========================================================================
    // 内部流程
    // ========================================================================

    /// 唯一的朗读入口：更新游标、状态、高亮，然后交给引擎
    fn speak_sentence(&mut self, index: usize) {
        let sentence = self.sentences[index].clone();
        self.cursor = Some(index);
        self.spoken_offset = 0;
        self.awaiting_advance = false;

        tracing::debug!(
            page_index = sentence.page_index(),
            sentence_index = index,
            user_initiated = self.user_initiated,
            "Speaking sentence"
        );

        self.set_state(PlaybackState::Speaking {
            sentence: sentence.clone(),
        });
        self.publish(PlaybackEvent::SentenceChanged {
            text: sentence.text().to_string(),
            page_index: sentence.page_index(),
            sentence_index: index,
        });
        self.update_highlight(&sentence);
        self.start_utterance(sentence.text().to_string());
    }

    fn update_highlight(&mut self, sentence: &Sentence) {
        let located = match self.document.clone() {
            Some(document) => self.locator.locate(sentence, document.as_ref(), self.page_index),
            None => None,
        };

        let highlight = match located {
            Some(result) => Some(self.overlay.show(result.bounds, result.page_index)),
            None => {
                tracing::debug!(
                    page_index = sentence.page_index(),
                    sentence_index = sentence.index(),
                    "Sentence not located, highlight suppressed"
                );
                self.overlay.clear();
                None
            }
        };
        self.publish(PlaybackEvent::HighlightChanged { highlight });
    }

    fn start_utterance(&mut self, text: String) {
        self.next_utterance += 1;
        let id = UtteranceId(self.next_utterance);
        self.current_utterance = Some(id);

        if let Err(e) = self.active_engine().speak(Utterance { id, text }) {
            self.handle_engine_failure(e.to_string());
        }
    }

    /// 引擎失败：有备用引擎时用它重读当前句一次，否则结束播放
    fn handle_engine_failure(&mut self, error: String) {
        let engine = self.active_engine().name().to_string();
        tracing::warn!(engine = %engine, error = %error, "Speech engine failed");
        self.current_utterance = None;

        if !self.using_fallback && self.engines.fallback.is_some() {
            if let PlaybackState::Speaking { sentence } = &self.state {
                let text = sentence.text().to_string();
                self.using_fallback = true;
                tracing::info!(
                    engine = %self.active_engine().name(),
                    "Retrying sentence with fallback engine"
                );
                self.start_utterance(text);
                return;
            }
        }

        self.publish(PlaybackEvent::EngineFailed { engine, error });
        self.interrupt();
        self.cursor = None;
        self.user_initiated = false;
        self.set_state(PlaybackState::Stopped);
        self.publish(PlaybackEvent::PlaybackFinished);
    }

    fn complete_utterance(&mut self) -> Option<Directive> {
        self.current_utterance = None;
        let sentence = match &self.state {
            PlaybackState::Speaking { sentence } => sentence.clone(),
            _ => {
                tracing::debug!(
                    state = self.state.as_str(),
                    "Utterance finished while not speaking"
                );
                return None;
            }
        };

        self.publish(PlaybackEvent::SentenceFinished {
            page_index: sentence.page_index(),
            sentence_index: sentence.index(),
        });
        self.clear_highlight();

        if std::mem::take(&mut self.user_initiated) {
            tracing::debug!(
                sentence_index = sentence.index(),
                "Jumped sentence finished, not advancing"
            );
            self.finish();
            return None;
        }

        self.awaiting_advance = true;
        Some(Directive::ScheduleAdvance {
            generation: self.generation,
            delay: self.config.advance_delay(),
        })
    }

    fn advance_now(&mut self) {
        self.awaiting_advance = false;
        let next = self.cursor.map_or(0, |index| index + 1);
        if next < self.sentences.len() {
            self.speak_sentence(next);
            return;
        }

        match self.seek_forward(self.page_index + 1) {
            Ok(true) => {
                tracing::info!(page_index = self.page_index, "Advanced to next page");
                self.speak_sentence(0);
            }
            Ok(false) => {
                self.cursor = None;
                self.finish();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load next page");
                self.cursor = None;
                self.finish();
            }
        }
    }

    /// 中断后翻页失败：不能停在 Speaking，转为 Stopped 再把错误交给调用方
    fn stop_on_error<T>(&mut self, result: Result<T, PlaybackError>) -> Result<T, PlaybackError> {
        if let Err(e) = &result {
            tracing::warn!(
                page_index = self.page_index,
                error = %e,
                "Page load failed, playback stopped"
            );
            self.cursor = None;
            self.user_initiated = false;
            self.set_state(PlaybackState::Stopped);
        }
        result
    }

    /// 自然结束：回到 Idle 并发布 PlaybackFinished
    fn finish(&mut self) {
        self.awaiting_advance = false;
        self.set_state(PlaybackState::Idle);
        tracing::info!(page_index = self.page_index, "Playback finished");
        self.publish(PlaybackEvent::PlaybackFinished);
    }

    /// 取消在途朗读与延迟推进
    fn interrupt(&mut self) {
        self.generation += 1;
        self.awaiting_advance = false;
        if let Some(id) = self.current_utterance.take() {
            tracing::debug!(utterance = %id, "Stopping in-flight utterance");
            self.active_engine().stop();
        }
        self.spoken_offset = 0;
        self.clear_highlight();
    }

    fn clear_highlight(&mut self) {
        if self.overlay.clear() {
            self.publish(PlaybackEvent::HighlightChanged { highlight: None });
        }
    }

    fn load_page(&mut self, page_index: usize) -> Result<(), PlaybackError> {
        let document = self.require_document()?;
        let text = document.page_text(page_index)?;
        self.sentences = segment_page(page_index, &text, &self.segment_config);
        self.page_index = page_index;
        self.cursor = None;
        tracing::debug!(
            page_index = page_index,
            sentences = self.sentences.len(),
            "Page segmented"
        );
        Ok(())
    }

    /// 从 from 开始向后找第一个有句子的页并载入
    fn seek_forward(&mut self, from: usize) -> Result<bool, PlaybackError> {
        let document = self.require_document()?;
        for page_index in from..document.page_count() {
            if self.try_load(document.as_ref(), page_index)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// 在 before 之前向前找最近一个有句子的页并载入
    fn seek_backward(&mut self, before: usize) -> Result<bool, PlaybackError> {
        let document = self.require_document()?;
        for page_index in (0..before).rev() {
            if self.try_load(document.as_ref(), page_index)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn try_load(
        &mut self,
        document: &dyn PageTextProviderPort,
        page_index: usize,
    ) -> Result<bool, PlaybackError> {
        let text = document.page_text(page_index)?;
        let sentences = segment_page(page_index, &text, &self.segment_config);
        if sentences.is_empty() {
            tracing::debug!(page_index = page_index, "Skipping empty page");
            return Ok(false);
        }
        self.sentences = sentences;
        self.page_index = page_index;
        self.cursor = None;
        Ok(true)
    }

    fn require_document(&self) -> Result<Arc<dyn PageTextProviderPort>, PlaybackError> {
        self.document.clone().ok_or(PlaybackError::NoDocument)
    }

    fn active_engine(&self) -> &Arc<dyn SpeechEnginePort> {
        match (&self.engines.fallback, self.using_fallback) {
            (Some(fallback), true) => fallback,
            _ => &self.engines.primary,
        }
    }

    fn set_state(&mut self, state: PlaybackState) {
        let changed = self.state.as_str() != state.as_str();
        self.state = state;
        if changed {
            self.publish(PlaybackEvent::StateChanged {
                state: self.state.as_str().to_string(),
            });
        }
    }

    fn publish(&self, event: PlaybackEvent) {
        self.events.publish(event);
    }
}
