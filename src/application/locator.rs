//! Text Locator - 句子定位服务
//!
//! 把句子拆成若干搜索片段，在提示页附近逐页搜索，
//! 多片段结果经过位置校验后合并为一个高亮区域

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::application::ports::{
    CacheEntry, CacheKey, DocumentError, PageTextProviderPort, ResultCachePort,
};
use crate::domain::locator::{
    normalize_needle, select_segments, NormalizedText, SegmentSelectionConfig,
};
use crate::domain::{
    DocumentKey, PositionValidator, Rect, SearchResult, SegmentRole, Sentence, TextSegment,
    Validation,
};

/// 定位配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocatorConfig {
    #[serde(default)]
    pub selection: SegmentSelectionConfig,
    /// 向前/向后搜索的页数
    #[serde(default = "default_search_radius")]
    pub search_radius: usize,
}

fn default_search_radius() -> usize {
    2
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            selection: SegmentSelectionConfig::default(),
            search_radius: default_search_radius(),
        }
    }
}

/// 上一次成功定位的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Anchor {
    page_index: usize,
    offset: usize,
}

/// 文本定位器
///
/// 页面归一化文本按页缓存，文档切换时清空
pub struct TextLocator {
    config: LocatorConfig,
    validator: PositionValidator,
    cache: Arc<dyn ResultCachePort>,
    document_key: Option<DocumentKey>,
    pages: HashMap<usize, NormalizedText>,
    last_match: Option<Anchor>,
}

impl TextLocator {
    pub fn new(
        config: LocatorConfig,
        validator: PositionValidator,
        cache: Arc<dyn ResultCachePort>,
    ) -> Self {
        Self {
            config,
            validator,
            cache,
            document_key: None,
            pages: HashMap::new(),
            last_match: None,
        }
    }

    /// 活动文档变更：清空页面文本、邻近位置和结果缓存
    pub fn invalidate_document(&mut self) {
        self.pages.clear();
        self.last_match = None;
        self.document_key = None;
        self.cache.invalidate_all();
    }

    /// 定位句子在页面上的位置
    ///
    /// 找不到时返回 None，调用方应取消高亮而不是中断播放
    pub fn locate(
        &mut self,
        sentence: &Sentence,
        document: &dyn PageTextProviderPort,
        page_hint: usize,
    ) -> Option<SearchResult> {
        self.sync_document(document);

        let text = sentence.source_text();
        let segments = select_segments(text, &self.config.selection);
        if segments.is_empty() {
            return None;
        }

        let mut results: Vec<SearchResult> = Vec::new();
        for segment in segments {
            let candidates = match results.last() {
                None => self.first_segment_candidates(page_hint, document.page_count()),
                Some(previous) => {
                    Self::following_candidates(previous, document.page_count())
                }
            };
            if let Some(result) = self.search_segment(&segment, document, page_hint, &candidates) {
                results.push(result);
            }
        }

        let located = self.aggregate(sentence, results, document)?;
        self.last_match = Some(Anchor {
            page_index: located.page_index,
            offset: located.range.end(),
        });
        Some(located)
    }

    fn sync_document(&mut self, document: &dyn PageTextProviderPort) {
        if self.document_key.as_ref() != Some(document.document_key()) {
            self.pages.clear();
            self.last_match = None;
            self.document_key = Some(document.document_key().clone());
        }
    }

    /// 首片段的候选页及参考偏移：
    /// 上次匹配页 -> 提示页 -> 向后 radius 页 -> 向前 radius 页
    fn first_segment_candidates(&self, page_hint: usize, page_count: usize) -> Vec<(usize, usize)> {
        let mut pages = Vec::new();
        if let Some(anchor) = self.last_match {
            pages.push(anchor.page_index);
        }
        pages.push(page_hint);
        for distance in 1..=self.config.search_radius {
            pages.push(page_hint + distance);
        }
        for distance in 1..=self.config.search_radius {
            if let Some(page) = page_hint.checked_sub(distance) {
                pages.push(page);
            }
        }

        let mut candidates: Vec<(usize, usize)> = Vec::with_capacity(pages.len());
        for page in pages {
            if page >= page_count || candidates.iter().any(|(p, _)| *p == page) {
                continue;
            }
            let reference = match self.last_match {
                Some(anchor) if anchor.page_index == page => anchor.offset,
                _ => 0,
            };
            candidates.push((page, reference));
        }
        candidates
    }

    /// 后续片段：先在上一片段所在页向后找，再看下一页开头
    fn following_candidates(previous: &SearchResult, page_count: usize) -> Vec<(usize, usize)> {
        let mut candidates = vec![(previous.page_index, previous.range.end())];
        if previous.page_index + 1 < page_count {
            candidates.push((previous.page_index + 1, 0));
        }
        candidates
    }

    fn search_segment(
        &mut self,
        segment: &TextSegment,
        document: &dyn PageTextProviderPort,
        page_hint: usize,
        candidates: &[(usize, usize)],
    ) -> Option<SearchResult> {
        let needle = normalize_needle(&segment.text);
        if needle.is_empty() {
            return None;
        }
        let needle_text: String = needle.iter().collect();
        let key = CacheKey::new(document.document_key().clone(), page_hint, &needle_text);

        if let Some(entry) = self.cache.get(&key) {
            // 落在参考位置之前的缓存结果对本次查询无效
            let usable = candidates.iter().any(|(page, reference)| {
                entry.result.page_index == *page && entry.result.range.start >= *reference
            });
            if usable {
                tracing::trace!(
                    segment = %segment.text,
                    page_index = entry.page_index,
                    "Segment cache hit"
                );
                return Some(SearchResult {
                    segment: segment.clone(),
                    ..entry.result
                });
            }
        }

        for &(page_index, reference) in candidates {
            let page = match self.page_text(document, page_index) {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(page_index = page_index, error = %e, "Page text unavailable");
                    continue;
                }
            };
            let Some(range) = page.find_nearest(&needle, reference) else {
                continue;
            };
            let Some(bounds) = document.geometry(page_index, range) else {
                tracing::debug!(page_index = page_index, "No geometry for matched range");
                continue;
            };

            let result = SearchResult {
                segment: segment.clone(),
                page_index,
                range,
                bounds,
            };
            self.cache.put(key, CacheEntry::new(result.clone()));
            return Some(result);
        }

        None
    }

    fn page_text(
        &mut self,
        document: &dyn PageTextProviderPort,
        page_index: usize,
    ) -> Result<&NormalizedText, DocumentError> {
        if !self.pages.contains_key(&page_index) {
            let text = document.page_text(page_index)?;
            self.pages.insert(page_index, NormalizedText::new(&text));
        }
        self.pages
            .get(&page_index)
            .ok_or(DocumentError::TextUnavailable(format!("page {}", page_index)))
    }

    fn aggregate(
        &self,
        sentence: &Sentence,
        mut results: Vec<SearchResult>,
        document: &dyn PageTextProviderPort,
    ) -> Option<SearchResult> {
        match results.len() {
            0 => {
                tracing::debug!(
                    page_index = sentence.page_index(),
                    sentence_index = sentence.index(),
                    "Sentence not found within search radius"
                );
                None
            }
            1 => results.pop(),
            _ => match self.validator.validate(&results) {
                Validation::Valid => Some(Self::merge(sentence, &results, document)),
                Validation::Invalid(reason) => {
                    tracing::debug!(
                        reason = %reason,
                        segments = results.len(),
                        "Segment positions inconsistent, using first segment only"
                    );
                    results.into_iter().next()
                }
            },
        }
    }

    /// 合并首结果所在页上的全部结果
    fn merge(
        sentence: &Sentence,
        results: &[SearchResult],
        document: &dyn PageTextProviderPort,
    ) -> SearchResult {
        let first = &results[0];
        let same_page: Vec<&SearchResult> = results
            .iter()
            .filter(|r| r.page_index == first.page_index)
            .collect();

        let range = same_page
            .iter()
            .fold(first.range, |range, r| range.extend_to(&r.range));
        let bounds = document
            .geometry(first.page_index, range)
            .unwrap_or_else(|| {
                same_page
                    .iter()
                    .fold(first.bounds, |bounds: Rect, r| bounds.union(&r.bounds))
            });

        SearchResult {
            segment: TextSegment::new(sentence.source_text(), SegmentRole::Start, 0),
            page_index: first.page_index,
            range,
            bounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ResultCachePort;
    use crate::domain::{segment_page, SegmentConfig, TextRange};
    use crate::infrastructure::adapters::{InMemoryDocument, LayoutConfig};
    use crate::infrastructure::memory::InMemoryResultCache;

    fn document(pages: &[&str]) -> InMemoryDocument {
        InMemoryDocument::new(
            DocumentKey::new("book"),
            pages.iter().map(|p| p.to_string()).collect(),
            LayoutConfig::default(),
        )
    }

    fn locator() -> (TextLocator, Arc<InMemoryResultCache>) {
        let cache = InMemoryResultCache::default().arc();
        let locator = TextLocator::new(
            LocatorConfig::default(),
            PositionValidator::default(),
            cache.clone(),
        );
        (locator, cache)
    }

    fn sentences(page_index: usize, text: &str) -> Vec<Sentence> {
        segment_page(page_index, text, &SegmentConfig::default())
    }

    #[test]
    fn test_locates_sentence_on_hinted_page() {
        let doc = document(&["The quick brown fox. Jumps over the lazy dog."]);
        let (mut locator, _) = locator();
        let sentence = &sentences(0, &doc.page_text(0).unwrap())[1];

        let result = locator.locate(sentence, &doc, 0).unwrap();
        assert_eq!(result.page_index, 0);
        assert_eq!(result.range, TextRange::new(21, 24));
        assert_eq!(result.bounds, doc.geometry(0, TextRange::new(21, 24)).unwrap());
    }

    #[test]
    fn test_locates_across_line_break_and_case() {
        let doc = document(&["Intro line.\nCAFÉ au lait\nis hot."]);
        let (mut locator, _) = locator();
        let sentence = Sentence::new("café au lait is hot.".to_string(), 0, 1, true, false);

        let result = locator.locate(&sentence, &doc, 0).unwrap();
        assert_eq!(result.range.start, 12);
        assert_eq!(result.range.end(), 32);
    }

    #[test]
    fn test_falls_back_to_neighbouring_page() {
        let doc = document(&["Nothing here.", "Still nothing.", "Target sentence lives here."]);
        let (mut locator, _) = locator();
        let sentence = Sentence::new("Target sentence lives here.".to_string(), 2, 0, true, false);

        let result = locator.locate(&sentence, &doc, 0).unwrap();
        assert_eq!(result.page_index, 2);
    }

    #[test]
    fn test_outside_radius_is_not_found() {
        let doc = document(&["a.", "b.", "c.", "Far away text."]);
        let (mut locator, _) = locator();
        let sentence = Sentence::new("Far away text.".to_string(), 3, 0, true, false);

        assert!(locator.locate(&sentence, &doc, 0).is_none());
        assert!(locator.locate(&sentence, &doc, 1).is_some());
    }

    #[test]
    fn test_synthetic_terminator_not_searched() {
        let doc = document(&["trailing words without end"]);
        let (mut locator, _) = locator();
        let sentence = &sentences(0, &doc.page_text(0).unwrap())[0];
        assert!(sentence.has_synthetic_terminator());

        let result = locator.locate(sentence, &doc, 0).unwrap();
        assert_eq!(result.range, TextRange::new(0, 26));
    }

    #[test]
    fn test_repeated_sentence_prefers_reading_position() {
        let doc = document(&["Say it again. Middle part. Say it again."]);
        let (mut locator, _) = locator();
        let all = sentences(0, &doc.page_text(0).unwrap());

        let first = locator.locate(&all[0], &doc, 0).unwrap();
        assert_eq!(first.range.start, 0);
        let middle = locator.locate(&all[1], &doc, 0).unwrap();
        assert_eq!(middle.range.start, 14);
        let last = locator.locate(&all[2], &doc, 0).unwrap();
        assert_eq!(last.range.start, 27);
    }

    #[test]
    fn test_results_are_cached_and_reused() {
        let doc = document(&["Alpha beta gamma delta."]);
        let (mut locator, cache) = locator();
        let sentence = &sentences(0, &doc.page_text(0).unwrap())[0];

        let first = locator.locate(sentence, &doc, 0).unwrap();
        assert!(!cache.is_empty());
        let misses = cache.stats().miss_count;

        locator.last_match = None;
        let second = locator.locate(sentence, &doc, 0).unwrap();
        assert_eq!(first, second);
        assert!(cache.stats().hit_count > 0);
        assert_eq!(cache.stats().miss_count, misses);
    }

    #[test]
    fn test_invalidate_document_clears_cache() {
        let doc = document(&["Alpha beta gamma delta."]);
        let (mut locator, cache) = locator();
        let sentence = &sentences(0, &doc.page_text(0).unwrap())[0];
        locator.locate(sentence, &doc, 0).unwrap();

        locator.invalidate_document();
        assert!(cache.is_empty());
        assert!(locator.last_match.is_none());
    }

    /// 行高拉大，使相邻行的中心距离超出同行容差
    fn narrow_document(text: &str, chars_per_line: usize) -> InMemoryDocument {
        InMemoryDocument::new(
            DocumentKey::new("narrow"),
            vec![text.to_string()],
            LayoutConfig {
                chars_per_line,
                line_height: 40.0,
                ..LayoutConfig::default()
            },
        )
    }

    const LETTERS: &str = "abcdefghijklmnopqr";

    #[test]
    fn test_segments_on_too_many_lines_fall_back_to_first() {
        // 每行 3 个字符：片段 abc/def/jkl/pqr 各占一行，换行 3 次
        let doc = narrow_document(LETTERS, 3);
        let (mut locator, _) = locator();
        let sentence = Sentence::new(LETTERS.to_string(), 0, 0, true, false);

        let result = locator.locate(&sentence, &doc, 0).unwrap();
        assert_eq!(result.range, TextRange::new(0, 3));
        assert_eq!(result.segment.text, "abc");
        assert_eq!(result.segment.role, SegmentRole::Start);
        assert_eq!(result.bounds, doc.geometry(0, TextRange::new(0, 3)).unwrap());
    }

    #[test]
    fn test_segments_on_two_lines_are_merged() {
        // 每行 9 个字符：片段分布在两行，只换行一次
        let doc = narrow_document(LETTERS, 9);
        let (mut locator, _) = locator();
        let sentence = Sentence::new(LETTERS.to_string(), 0, 0, true, false);

        let result = locator.locate(&sentence, &doc, 0).unwrap();
        assert_eq!(result.range, TextRange::new(0, 18));
        assert_eq!(result.segment.text, LETTERS);
        assert_eq!(result.bounds, doc.geometry(0, TextRange::new(0, 18)).unwrap());
    }
}
