//! Highlight Overlay - 单一高亮区域
//!
//! 任意时刻最多一个高亮；显示新高亮前先清除旧高亮，清除操作幂等

use std::sync::Arc;

use crate::application::ports::{Highlight, RendererPort};
use crate::domain::Rect;

pub struct HighlightOverlay {
    renderer: Arc<dyn RendererPort>,
    current: Option<Highlight>,
}

impl HighlightOverlay {
    pub fn new(renderer: Arc<dyn RendererPort>) -> Self {
        Self {
            renderer,
            current: None,
        }
    }

    /// 显示高亮，替换已有高亮
    pub fn show(&mut self, bounds: Rect, page_index: usize) -> Highlight {
        if self.current.take().is_some() {
            self.renderer.clear_highlight();
        }
        self.renderer.highlight(bounds, page_index);
        let highlight = Highlight { page_index, bounds };
        self.current = Some(highlight);
        highlight
    }

    /// 清除高亮，没有高亮时不做任何事
    ///
    /// 返回是否真的清除了高亮
    pub fn clear(&mut self) -> bool {
        if self.current.take().is_some() {
            self.renderer.clear_highlight();
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&Highlight> {
        self.current.as_ref()
    }
}
