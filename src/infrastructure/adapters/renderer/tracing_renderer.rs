//! Tracing Renderer - 把高亮输出到日志
//!
//! 没有图形界面的宿主（命令行演示、测试）使用

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::application::ports::RendererPort;
use crate::domain::Rect;

#[derive(Debug, Default)]
pub struct TracingRenderer {
    drawn: AtomicUsize,
}

impl TracingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已绘制的高亮次数
    pub fn drawn(&self) -> usize {
        self.drawn.load(Ordering::Relaxed)
    }
}

impl RendererPort for TracingRenderer {
    fn highlight(&self, bounds: Rect, page_index: usize) {
        self.drawn.fetch_add(1, Ordering::Relaxed);
        tracing::info!(
            page_index = page_index,
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            "Highlight"
        );
    }

    fn clear_highlight(&self) {
        tracing::debug!("Highlight cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_highlights() {
        let renderer = TracingRenderer::new();
        renderer.highlight(Rect::new(1.0, 2.0, 3.0, 4.0), 0);
        renderer.clear_highlight();
        renderer.highlight(Rect::new(1.0, 2.0, 3.0, 4.0), 1);
        assert_eq!(renderer.drawn(), 2);
    }
}
