//! 句子分割器
//!
//! 基于标点的单遍扫描分句，支持拉丁与中日韩标点，可选逗号类软分隔

use serde::{Deserialize, Serialize};

use super::document::Sentence;

/// 默认软分隔最小字符数
/// 片段字符数未达到此限制时，软分隔符不会触发分割
pub const DEFAULT_MIN_CHARS_FOR_SOFT: usize = 20;

/// 默认补充终止符
pub const DEFAULT_SYNTHETIC_TERMINATOR: char = '。';

/// 分句配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentConfig {
    /// 强分隔符（句末标点，总是分割）
    #[serde(default = "default_strong_delimiters")]
    pub strong_delimiters: Vec<char>,
    /// 软分隔符（逗号、分号、冒号）
    #[serde(default = "default_soft_delimiters")]
    pub soft_delimiters: Vec<char>,
    /// 是否启用软分隔
    #[serde(default)]
    pub soft_breaks: bool,
    /// 软分隔生效的最小字符数
    #[serde(default = "default_min_chars_for_soft")]
    pub min_chars_for_soft: usize,
    /// 末尾缺少终止符时补充的字符
    #[serde(default = "default_synthetic_terminator")]
    pub synthetic_terminator: char,
}

fn default_strong_delimiters() -> Vec<char> {
    vec!['。', '？', '！', '.', '?', '!', '…']
}

fn default_soft_delimiters() -> Vec<char> {
    vec!['，', '；', '：', ',', ';', ':']
}

fn default_min_chars_for_soft() -> usize {
    DEFAULT_MIN_CHARS_FOR_SOFT
}

fn default_synthetic_terminator() -> char {
    DEFAULT_SYNTHETIC_TERMINATOR
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            strong_delimiters: default_strong_delimiters(),
            soft_delimiters: default_soft_delimiters(),
            soft_breaks: false,
            min_chars_for_soft: default_min_chars_for_soft(),
            synthetic_terminator: default_synthetic_terminator(),
        }
    }
}

impl SegmentConfig {
    /// 启用软分隔的配置
    pub fn with_soft_breaks(mut self, min_chars: usize) -> Self {
        self.soft_breaks = true;
        self.min_chars_for_soft = min_chars;
        self
    }

    #[inline]
    fn is_strong_delimiter(&self, ch: char) -> bool {
        self.strong_delimiters.contains(&ch)
    }

    #[inline]
    fn is_soft_delimiter(&self, ch: char) -> bool {
        self.soft_breaks && self.soft_delimiters.contains(&ch)
    }
}

/// 分句结果（尚未绑定页面）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentedSentence {
    pub text: String,
    pub synthetic_terminator: bool,
}

/// 检查是否为紧跟终止符的闭合标点（引号、括号）
#[inline]
fn is_closing_mark(ch: char) -> bool {
    matches!(
        ch,
        '"' | '\'' | '\u{201D}' | '\u{2019}' | '」' | '』' | ')' | '）' | ']' | '】' | '》'
    )
}

/// 检查片段是否只包含引号或空白（应该合并到前一句）
#[inline]
fn is_trivial_segment(s: &str) -> bool {
    s.chars()
        .all(|c| is_closing_mark(c) || matches!(c, '\u{201C}' | '\u{2018}' | ' ' | '\t'))
}

/// 将连续空白（含换行）归一化为单个空格
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_sentence(sentences: &mut Vec<SegmentedSentence>, buffer: &str) {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return;
    }

    if is_trivial_segment(trimmed) {
        if let Some(last) = sentences.last_mut() {
            last.text.push_str(trimmed);
            return;
        }
    }

    sentences.push(SegmentedSentence {
        text: trimmed.to_string(),
        synthetic_terminator: false,
    });
}

/// 对文本进行分句
///
/// 分句策略：
/// 1. 归一化空白
/// 2. 遇到强分隔符（或满足最小字符数的软分隔符）时切分，
///    紧随其后的终止符和闭合引号归入同一句
/// 3. 末尾剩余内容成为最后一句，并补充终止符
pub fn segment_text(text: &str, config: &SegmentConfig) -> Vec<SegmentedSentence> {
    let normalized = normalize_whitespace(text);
    let mut sentences: Vec<SegmentedSentence> = Vec::new();
    let mut current = String::new();
    let mut char_count = 0;
    let mut chars = normalized.chars().peekable();

    while let Some(ch) = chars.next() {
        current.push(ch);
        char_count += 1;

        let should_split = config.is_strong_delimiter(ch)
            || (config.is_soft_delimiter(ch) && char_count >= config.min_chars_for_soft);

        if should_split {
            while let Some(&next) = chars.peek() {
                if config.is_strong_delimiter(next) || is_closing_mark(next) {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            push_sentence(&mut sentences, &current);
            current.clear();
            char_count = 0;
        }
    }

    // 剩余内容
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        match sentences.last_mut() {
            Some(last) if is_trivial_segment(trimmed) => last.text.push_str(trimmed),
            _ => {
                let mut text = trimmed.to_string();
                text.push(config.synthetic_terminator);
                sentences.push(SegmentedSentence {
                    text,
                    synthetic_terminator: true,
                });
            }
        }
    }

    sentences
}

/// 对页面文本分句，并标注页面索引与页内序号
pub fn segment_page(page_index: usize, text: &str, config: &SegmentConfig) -> Vec<Sentence> {
    let segmented = segment_text(text, config);
    let total = segmented.len();

    segmented
        .into_iter()
        .enumerate()
        .map(|(index, s)| {
            Sentence::new(
                s.text,
                page_index,
                index,
                index + 1 == total,
                s.synthetic_terminator,
            )
        })
        .collect()
}
