//! Viewport-relative geometry reported by the host.

use serde::{Deserialize, Serialize};

/// Bounding rectangle relative to the viewport's top-left corner (CSS pixels).
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(top: f32, left: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }
}

/// Visible area plus the document scroll state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scroll_y: f32,
    pub document_height: f32,
}

impl Viewport {
    #[inline]
    pub fn max_scroll(&self) -> f32 {
        (self.document_height - self.height).max(0.0)
    }

    /// Whole-document scroll progress in `[0, 1]`, 0 when the page does not scroll.
    pub fn document_progress(&self) -> f32 {
        let max = self.max_scroll();
        if max <= 0.0 {
            return 0.0;
        }
        (self.scroll_y / max).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_progress_clamps() {
        let mut vp = Viewport {
            width: 1280.0,
            height: 800.0,
            scroll_y: 600.0,
            document_height: 2000.0,
        };
        assert_eq!(vp.document_progress(), 0.5);
        vp.scroll_y = 5000.0;
        assert_eq!(vp.document_progress(), 1.0);
        vp.document_height = 500.0;
        assert_eq!(vp.document_progress(), 0.0);
    }
}
