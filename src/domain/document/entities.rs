//! Document Context - Entities

use serde::{Deserialize, Serialize};

use super::{Rect, TextRange};

/// 句子 - 最小朗读/高亮单位
///
/// 不变量:
/// - index 在所属页面内唯一且有序
/// - text 不为空，且以终止符结尾
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// 句子文本（空白已归一化）
    text: String,
    /// 所属页面索引
    page_index: usize,
    /// 在页面句子列表中的索引
    index: usize,
    /// 是否为页面最后一句
    is_last: bool,
    /// 终止符是否由分句器补充
    synthetic_terminator: bool,
}

impl Sentence {
    pub fn new(
        text: String,
        page_index: usize,
        index: usize,
        is_last: bool,
        synthetic_terminator: bool,
    ) -> Self {
        Self {
            text,
            page_index,
            index,
            is_last,
            synthetic_terminator,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_last(&self) -> bool {
        self.is_last
    }

    pub fn has_synthetic_terminator(&self) -> bool {
        self.synthetic_terminator
    }

    /// 页面上真实存在的文本（去掉补充的终止符）
    pub fn source_text(&self) -> &str {
        if self.synthetic_terminator {
            let mut chars = self.text.chars();
            chars.next_back();
            chars.as_str()
        } else {
            &self.text
        }
    }

    /// 字符数（码点）
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 片段在句子中的位置角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentRole {
    Start,
    Middle,
    End,
}

/// 搜索片段 - 句子的短子串，作为定位锚点
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSegment {
    pub text: String,
    pub role: SegmentRole,
    /// 在句子中的码点偏移
    pub offset: usize,
}

impl TextSegment {
    pub fn new(text: impl Into<String>, role: SegmentRole, offset: usize) -> Self {
        Self {
            text: text.into(),
            role,
            offset,
        }
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// 片段定位结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub segment: TextSegment,
    pub page_index: usize,
    pub range: TextRange,
    pub bounds: Rect,
}
