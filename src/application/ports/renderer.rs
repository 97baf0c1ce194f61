//! Renderer Port - 高亮渲染

use crate::domain::Rect;

/// Renderer Port
///
/// 负责页面上的视觉呈现，核心只下发高亮矩形
pub trait RendererPort: Send + Sync {
    fn highlight(&self, bounds: Rect, page_index: usize);

    fn clear_highlight(&self);
}
