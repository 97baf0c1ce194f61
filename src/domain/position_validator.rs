//! 位置校验器
//!
//! 多片段匹配的几何一致性检查，拒绝散落在页面各处的伪匹配

use serde::{Deserialize, Serialize};

use super::document::SearchResult;

/// 校验阈值（单位: pt）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// 跨页时上一结果底边与下一结果顶边的最大距离
    #[serde(default = "default_page_gap_tolerance")]
    pub page_gap_tolerance: f64,
    /// 判定为同一行的垂直中心最大差值
    #[serde(default = "default_line_tolerance")]
    pub line_tolerance: f64,
    /// 允许的换行次数
    #[serde(default = "default_max_line_changes")]
    pub max_line_changes: usize,
    /// 同一行相邻结果的最大水平间距
    #[serde(default = "default_horizontal_tolerance")]
    pub horizontal_tolerance: f64,
    /// 同一行间距相对平均间距的最大偏差
    #[serde(default = "default_spacing_tolerance")]
    pub spacing_tolerance: f64,
}

fn default_page_gap_tolerance() -> f64 {
    30.0
}

fn default_line_tolerance() -> f64 {
    30.0
}

fn default_max_line_changes() -> usize {
    2
}

fn default_horizontal_tolerance() -> f64 {
    100.0
}

fn default_spacing_tolerance() -> f64 {
    50.0
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            page_gap_tolerance: default_page_gap_tolerance(),
            line_tolerance: default_line_tolerance(),
            max_line_changes: default_max_line_changes(),
            horizontal_tolerance: default_horizontal_tolerance(),
            spacing_tolerance: default_spacing_tolerance(),
        }
    }
}

/// 校验失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    DifferentPages,
    DifferentLines,
    WrongOrder,
    InconsistentLayout,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::DifferentPages => "different_pages",
            InvalidReason::DifferentLines => "different_lines",
            InvalidReason::WrongOrder => "wrong_order",
            InvalidReason::InconsistentLayout => "inconsistent_layout",
        }
    }
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 校验结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    Valid,
    Invalid(InvalidReason),
}

/// 位置校验器
#[derive(Debug, Clone, Default)]
pub struct PositionValidator {
    config: ValidatorConfig,
}

impl PositionValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// 校验按片段偏移排序的结果
    ///
    /// 依次检查：跨页连续性、垂直一致性、同行水平顺序、同行间距一致性
    pub fn validate(&self, results: &[SearchResult]) -> Validation {
        if results.len() < 2 {
            return Validation::Valid;
        }

        if let Err(reason) = self.check_page_continuity(results) {
            return Validation::Invalid(reason);
        }
        if let Err(reason) = self.check_vertical_consistency(results) {
            return Validation::Invalid(reason);
        }

        let gaps = match self.same_line_gaps(results) {
            Ok(gaps) => gaps,
            Err(reason) => return Validation::Invalid(reason),
        };
        if let Err(reason) = self.check_layout(&gaps) {
            return Validation::Invalid(reason);
        }

        Validation::Valid
    }

    fn check_page_continuity(&self, results: &[SearchResult]) -> Result<(), InvalidReason> {
        for pair in results.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if first.page_index == second.page_index {
                continue;
            }
            if second.page_index != first.page_index + 1 {
                return Err(InvalidReason::DifferentPages);
            }
            let gap = (second.bounds.top() - first.bounds.bottom()).abs();
            if gap > self.config.page_gap_tolerance {
                return Err(InvalidReason::DifferentPages);
            }
        }
        Ok(())
    }

    fn check_vertical_consistency(&self, results: &[SearchResult]) -> Result<(), InvalidReason> {
        let line_changes = results
            .windows(2)
            .filter(|pair| !self.on_same_line(&pair[0], &pair[1]))
            .count();

        if line_changes > self.config.max_line_changes {
            return Err(InvalidReason::DifferentLines);
        }
        Ok(())
    }

    /// 同行相邻结果的水平间距，顺序错误或间距过大时失败
    fn same_line_gaps(&self, results: &[SearchResult]) -> Result<Vec<f64>, InvalidReason> {
        let mut gaps = Vec::new();
        for pair in results.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if first.page_index != second.page_index || !self.on_same_line(first, second) {
                continue;
            }
            let gap = second.bounds.left() - first.bounds.right();
            if gap < 0.0 || gap > self.config.horizontal_tolerance {
                return Err(InvalidReason::WrongOrder);
            }
            gaps.push(gap);
        }
        Ok(gaps)
    }

    fn check_layout(&self, gaps: &[f64]) -> Result<(), InvalidReason> {
        if gaps.len() < 2 {
            return Ok(());
        }
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        if gaps
            .iter()
            .any(|gap| (gap - mean).abs() > self.config.spacing_tolerance)
        {
            return Err(InvalidReason::InconsistentLayout);
        }
        Ok(())
    }

    fn on_same_line(&self, first: &SearchResult, second: &SearchResult) -> bool {
        (first.bounds.center_y() - second.bounds.center_y()).abs() <= self.config.line_tolerance
    }
}
