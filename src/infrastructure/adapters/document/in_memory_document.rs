//! In-Memory Document - 纯文本分页文档
//!
//! 以换页符分页，使用等宽排版推算字符几何，供演示宿主和测试使用

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::application::ports::{DocumentError, PageTextProviderPort};
use crate::domain::{DocumentKey, Rect, TextRange};

/// 页面分隔符（换页符）
pub const PAGE_BREAK: char = '\u{0C}';

/// 等宽排版参数（单位: pt）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_char_width")]
    pub char_width: f64,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    /// 每行最多字符数，超过时自动折行
    #[serde(default = "default_chars_per_line")]
    pub chars_per_line: usize,
}

fn default_margin() -> f64 {
    36.0
}

fn default_char_width() -> f64 {
    6.0
}

fn default_line_height() -> f64 {
    14.0
}

fn default_chars_per_line() -> usize {
    80
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            char_width: default_char_width(),
            line_height: default_line_height(),
            chars_per_line: default_chars_per_line(),
        }
    }
}

/// 内存文档
pub struct InMemoryDocument {
    key: DocumentKey,
    pages: Vec<String>,
    layout: LayoutConfig,
}

impl InMemoryDocument {
    pub fn new(key: DocumentKey, pages: Vec<String>, layout: LayoutConfig) -> Self {
        Self { key, pages, layout }
    }

    /// 按换页符拆分文本
    pub fn from_text(key: DocumentKey, text: &str, layout: LayoutConfig) -> Self {
        let pages = text.split(PAGE_BREAK).map(str::to_string).collect();
        Self::new(key, pages, layout)
    }

    /// 读取文本文件，文件路径作为文档 key
    pub fn from_file(path: impl AsRef<Path>, layout: LayoutConfig) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| DocumentError::IoError(format!("{}: {}", path.display(), e)))?;
        let document = Self::from_text(DocumentKey::new(path.display().to_string()), &text, layout);
        tracing::info!(
            path = %path.display(),
            pages = document.pages.len(),
            "Document loaded"
        );
        Ok(document)
    }

    fn char_rect(&self, line: usize, column: usize) -> Rect {
        Rect::new(
            self.layout.margin + column as f64 * self.layout.char_width,
            self.layout.margin + line as f64 * self.layout.line_height,
            self.layout.char_width,
            self.layout.line_height,
        )
    }
}

impl PageTextProviderPort for InMemoryDocument {
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

    fn geometry(&self, page_index: usize, range: TextRange) -> Option<Rect> {
        let text = self.pages.get(page_index)?;
        if range.is_empty() {
            return None;
        }

        let chars_per_line = self.layout.chars_per_line.max(1);
        let (mut line, mut column) = (0usize, 0usize);
        let mut bounds: Option<Rect> = None;

        for (offset, ch) in text.chars().enumerate() {
            if offset >= range.end() {
                break;
            }
            if ch == '\n' {
                line += 1;
                column = 0;
                continue;
            }
            if column >= chars_per_line {
                line += 1;
                column = 0;
            }
            if offset >= range.start {
                let rect = self.char_rect(line, column);
                bounds = Some(bounds.map_or(rect, |b| b.union(&rect)));
            }
            column += 1;
        }

        bounds
    }
}
