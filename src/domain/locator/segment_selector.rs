//! 搜索片段选择策略

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::document::{SegmentRole, TextSegment};

/// 片段选择配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSelectionConfig {
    /// 片段长度（码点）
    #[serde(default = "default_segment_len")]
    pub segment_len: usize,
    /// 选中片段需要覆盖的句子长度比例
    #[serde(default = "default_coverage_ratio")]
    pub coverage_ratio: f64,
    /// 最大片段数
    #[serde(default = "default_max_segments")]
    pub max_segments: usize,
}

fn default_segment_len() -> usize {
    3
}

fn default_coverage_ratio() -> f64 {
    0.6
}

fn default_max_segments() -> usize {
    5
}

impl Default for SegmentSelectionConfig {
    fn default() -> Self {
        Self {
            segment_len: default_segment_len(),
            coverage_ratio: default_coverage_ratio(),
            max_segments: default_max_segments(),
        }
    }
}

/// 从句子中挑选搜索片段
///
/// 策略：
/// 1. 总是包含首片段
/// 2. 片段数 > 2 时包含中间片段（与末片段重叠时改用前一个）
/// 3. 片段数 > 1 时包含末片段
/// 4. 按均匀间隔补充，直到覆盖比例达标或达到最大片段数
///
/// 返回结果按句内偏移排序
pub fn select_segments(text: &str, config: &SegmentSelectionConfig) -> Vec<TextSegment> {
    let chars: Vec<char> = text.chars().collect();
    let total = chars.len();
    if total == 0 {
        return Vec::new();
    }

    let segment_len = config.segment_len.max(1);
    if total <= segment_len {
        return vec![TextSegment::new(text, SegmentRole::Start, 0)];
    }

    let count = total.div_ceil(segment_len);
    let offset_of = |chunk: usize| {
        if chunk + 1 == count {
            total - segment_len
        } else {
            chunk * segment_len
        }
    };

    // 末片段与结尾对齐；长度不能整除时倒数第二个片段与其重叠，不参与选择
    let overlaps_last =
        |chunk: usize| chunk != 0 && chunk + 2 == count && total % segment_len != 0;
    let available = if (1..count).any(overlaps_last) {
        count - 1
    } else {
        count
    };

    let mut selected = BTreeSet::new();
    selected.insert(0);
    if count > 2 {
        let middle = if overlaps_last(count / 2) {
            count / 2 - 1
        } else {
            count / 2
        };
        if middle != 0 {
            selected.insert(middle);
        }
    }
    if count > 1 {
        selected.insert(count - 1);
    }

    let target = (config.coverage_ratio * total as f64).ceil() as usize;
    let max_segments = config.max_segments.max(1);
    let covered = |selected: &BTreeSet<usize>| (selected.len() * segment_len).min(total);

    let mut slots = selected.len();
    while covered(&selected) < target
        && selected.len() < max_segments
        && selected.len() < available
    {
        slots += 1;
        for j in 0..slots {
            if selected.len() >= max_segments || covered(&selected) >= target {
                break;
            }
            let chunk = j * (count - 1) / (slots - 1);
            if !overlaps_last(chunk) {
                selected.insert(chunk);
            }
        }
    }

    selected
        .into_iter()
        .map(|chunk| {
            let offset = offset_of(chunk);
            let role = if chunk == 0 {
                SegmentRole::Start
            } else if chunk + 1 == count {
                SegmentRole::End
            } else {
                SegmentRole::Middle
            };
            let segment: String = chars[offset..offset + segment_len].iter().collect();
            TextSegment::new(segment, role, offset)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_segment() {
        let segments = select_segments("ab", &SegmentSelectionConfig::default());
        assert_eq!(segments, vec![TextSegment::new("ab", SegmentRole::Start, 0)]);
        assert!(select_segments("", &SegmentSelectionConfig::default()).is_empty());
    }

    #[test]
    fn test_two_chunks_first_and_last() {
        let segments = select_segments("abcde", &SegmentSelectionConfig::default());
        assert_eq!(
            segments,
            vec![
                TextSegment::new("abc", SegmentRole::Start, 0),
                TextSegment::new("cde", SegmentRole::End, 2),
            ]
        );
    }

    #[test]
    fn test_first_middle_last_when_coverage_met() {
        // 12 字符 -> 4 个片段，首/中/末覆盖 9 >= ceil(12 * 0.6) = 8
        let segments = select_segments("abcdefghijkl", &SegmentSelectionConfig::default());
        let texts: Vec<_> = segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["abc", "ghi", "jkl"]);
        assert_eq!(segments[1].role, SegmentRole::Middle);
    }

    #[test]
    fn test_middle_steps_back_from_overlapping_chunk() {
        // 10 字符 -> 片段偏移 0/3/6，末片段对齐到 7，与偏移 6 的片段重叠，
        // 中间片段退到偏移 3
        let segments = select_segments("abcdefghij", &SegmentSelectionConfig::default());
        let offsets: Vec<_> = segments.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 3, 7]);
        let roles: Vec<_> = segments.iter().map(|s| s.role).collect();
        assert_eq!(
            roles,
            vec![SegmentRole::Start, SegmentRole::Middle, SegmentRole::End]
        );
        assert!(segments
            .windows(2)
            .all(|w| w[0].offset + w[0].char_count() <= w[1].offset));
    }

    #[test]
    fn test_three_chunks_without_room_for_middle() {
        // 7 字符 -> 中间片段与末片段重叠，退一步又回到首片段
        let segments = select_segments("abcdefg", &SegmentSelectionConfig::default());
        let offsets: Vec<_> = segments.iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0, 4]);
    }

    #[test]
    fn test_long_text_capped_at_max_segments() {
        let text = "abcdefghijklmnopqrstuvwxyz0123456789";
        let segments = select_segments(text, &SegmentSelectionConfig::default());
        assert_eq!(segments.len(), 5);
        assert_eq!(segments.first().map(|s| s.role), Some(SegmentRole::Start));
        assert_eq!(segments.last().map(|s| s.role), Some(SegmentRole::End));
        assert!(segments.windows(2).all(|w| w[0].offset < w[1].offset));
    }

    #[test]
    fn test_coverage_reached_before_max() {
        let config = SegmentSelectionConfig {
            max_segments: 10,
            ..Default::default()
        };
        // 30 字符 -> 10 个片段，需要覆盖 18 字符 -> 6 个片段
        let text = "abcdefghijklmnopqrstuvwxyz0123";
        let segments = select_segments(text, &config);
        assert_eq!(segments.len(), 6);
    }
}
