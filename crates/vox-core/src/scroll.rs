//! Transcript scroll policy.
//!
//! The transcript always follows the newest content: after every change to
//! the display order, and before the new frame is shown, the viewport is
//! moved to its maximum scroll position.

/// A scrollable transcript viewport, in whatever unit the host measures
/// (pixels in a page, lines in a terminal).
pub trait Viewport {
    /// Total height of the content.
    fn scroll_height(&self) -> usize;
    /// Visible height.
    fn client_height(&self) -> usize;
    fn scroll_top(&self) -> usize;
    fn set_scroll_top(&mut self, top: usize);

    /// Largest valid scroll position.
    fn max_scroll_top(&self) -> usize {
        self.scroll_height().saturating_sub(self.client_height())
    }

    fn is_at_bottom(&self) -> bool {
        self.scroll_top() >= self.max_scroll_top()
    }
}

/// Keeps the viewport pinned to the newest content.
///
/// Call `after_commit` from the host's layout-commit hook, synchronously,
/// so no unscrolled frame is ever visible.
#[derive(Debug, Clone, Default)]
pub struct ScrollController {
    /// Display order length seen at the last commit.
    observed_len: Option<usize>,
}

impl ScrollController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins to the bottom if the display order changed since the last commit.
    ///
    /// Returns true if the scroll position was written.
    pub fn after_commit(&mut self, order_len: usize, viewport: &mut impl Viewport) -> bool {
        if self.observed_len == Some(order_len) {
            return false;
        }
        self.observed_len = Some(order_len);
        Self::pin_to_bottom(viewport)
    }

    /// Moves the viewport to its maximum scroll position.
    ///
    /// A no-op when already at the bottom. Returns true if the scroll
    /// position was written.
    pub fn pin_to_bottom(viewport: &mut impl Viewport) -> bool {
        let bottom = viewport.max_scroll_top();
        if viewport.scroll_top() == bottom {
            return false;
        }
        viewport.set_scroll_top(bottom);
        true
    }

    /// Forgets the observed length so the next commit pins unconditionally.
    pub fn reset(&mut self) {
        self.observed_len = None;
    }
}

/// An in-memory viewport measured in lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineViewport {
    pub content_lines: usize,
    pub height: usize,
    pub offset: usize,
}

impl LineViewport {
    pub fn new(height: usize) -> Self {
        Self {
            content_lines: 0,
            height,
            offset: 0,
        }
    }

    /// Updates the content height after a render.
    pub fn update_line_count(&mut self, line_count: usize) {
        self.content_lines = line_count;
        self.offset = self.offset.min(self.max_scroll_top());
    }

    /// Range of visible content lines.
    pub fn visible_range(&self) -> std::ops::Range<usize> {
        let end = (self.offset + self.height).min(self.content_lines);
        self.offset.min(end)..end
    }
}

impl Viewport for LineViewport {
    fn scroll_height(&self) -> usize {
        self.content_lines
    }

    fn client_height(&self) -> usize {
        self.height
    }

    fn scroll_top(&self) -> usize {
        self.offset
    }

    fn set_scroll_top(&mut self, top: usize) {
        self.offset = top.min(self.max_scroll_top());
    }
}
