//! 页面文本归一化
//!
//! 小写 + NFKD 分解后去除组合附加符号 + 换行折叠 + 空白合并。
//! 每个归一化字符记录其在原始文本中的码点偏移，用于把匹配结果映射回页面区间。

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::domain::document::TextRange;

/// 归一化后的文本
#[derive(Debug, Clone, Default)]
pub struct NormalizedText {
    chars: Vec<char>,
    /// chars[i] 对应的原始码点偏移
    source_offsets: Vec<usize>,
}

impl NormalizedText {
    pub fn new(text: &str) -> Self {
        let mut chars = Vec::with_capacity(text.len());
        let mut source_offsets = Vec::with_capacity(text.len());

        for (offset, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                if chars.last().map_or(false, |&last| last != ' ') {
                    chars.push(' ');
                    source_offsets.push(offset);
                }
                continue;
            }

            for lower in ch.to_lowercase() {
                for folded in std::iter::once(lower).nfkd() {
                    if is_combining_mark(folded) {
                        continue;
                    }
                    chars.push(folded);
                    source_offsets.push(offset);
                }
            }
        }

        if chars.last() == Some(&' ') {
            chars.pop();
            source_offsets.pop();
        }

        Self {
            chars,
            source_offsets,
        }
    }

    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// 查找 needle 的所有出现位置，返回原始文本区间
    pub fn find_all(&self, needle: &[char]) -> Vec<TextRange> {
        if needle.is_empty() || needle.len() > self.chars.len() {
            return Vec::new();
        }

        self.chars
            .windows(needle.len())
            .enumerate()
            .filter(|(_, window)| *window == needle)
            .map(|(i, _)| self.source_range(i, needle.len()))
            .collect()
    }

    /// 查找离 reference（原始码点偏移）最近的出现位置
    pub fn find_nearest(&self, needle: &[char], reference: usize) -> Option<TextRange> {
        self.find_all(needle)
            .into_iter()
            .min_by_key(|range| range.start.abs_diff(reference))
    }

    fn source_range(&self, start: usize, len: usize) -> TextRange {
        let source_start = self.source_offsets[start];
        let source_end = self.source_offsets[start + len - 1] + 1;
        TextRange::new(source_start, source_end - source_start)
    }
}

/// 归一化搜索词
pub fn normalize_needle(text: &str) -> Vec<char> {
    NormalizedText::new(text).chars
}
