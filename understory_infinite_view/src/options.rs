// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Configuration for [`InfiniteView`](crate::InfiniteView).

use kurbo::{Insets, Rect, Size};

/// Behavior switches for an [`InfiniteView`](crate::InfiniteView).
///
/// ```rust
/// use understory_infinite_view::ViewOptions;
///
/// let options = ViewOptions::default().with_reusable(false).with_spacing(1.0);
/// assert!(options.infinite);
/// assert!(!options.reusable);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewOptions {
    /// Wrap around at both horizontal ends.
    pub infinite: bool,
    /// Recycle row cells through the reuse pool and create pages lazily.
    pub reusable: bool,
    /// Snap drag targets to page boundaries.
    pub paging: bool,
    /// Accept drag input.
    pub scroll_enabled: bool,
    /// Width of the gap between adjacent pages, where separators are drawn.
    pub spacing: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            infinite: true,
            reusable: true,
            paging: false,
            scroll_enabled: true,
            spacing: 0.0,
        }
    }
}

impl ViewOptions {
    /// Sets [`ViewOptions::infinite`].
    #[must_use]
    pub const fn with_infinite(mut self, infinite: bool) -> Self {
        self.infinite = infinite;
        self
    }

    /// Sets [`ViewOptions::reusable`].
    #[must_use]
    pub const fn with_reusable(mut self, reusable: bool) -> Self {
        self.reusable = reusable;
        self
    }

    /// Sets [`ViewOptions::paging`].
    #[must_use]
    pub const fn with_paging(mut self, paging: bool) -> Self {
        self.paging = paging;
        self
    }

    /// Sets [`ViewOptions::scroll_enabled`].
    #[must_use]
    pub const fn with_scroll_enabled(mut self, enabled: bool) -> Self {
        self.scroll_enabled = enabled;
        self
    }

    /// Sets [`ViewOptions::spacing`]. Negative values are clamped to zero.
    #[must_use]
    pub const fn with_spacing(mut self, spacing: f64) -> Self {
        self.spacing = if spacing > 0.0 { spacing } else { 0.0 };
        self
    }
}

/// Where pages sit inside the control.
///
/// The page frame is the region pages are laid out in; everything outside it still
/// shows neighbouring pages, which is what makes buffer pages necessary.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ContentLayout {
    /// Inset the page frame from the control edges.
    Insets(Insets),
    /// Use a fixed page width, centered horizontally, full height.
    Width(f64),
}

impl Default for ContentLayout {
    fn default() -> Self {
        Self::Insets(Insets::ZERO)
    }
}

impl ContentLayout {
    /// Resolves the page frame for a control of size `bounds`, in control space.
    #[must_use]
    pub fn page_frame(&self, bounds: Size) -> Rect {
        match *self {
            Self::Insets(insets) => {
                let x0 = insets.x0;
                let y0 = insets.y0;
                let x1 = (bounds.width - insets.x1).max(x0);
                let y1 = (bounds.height - insets.y1).max(y0);
                Rect::new(x0, y0, x1, y1)
            }
            Self::Width(width) => {
                let width = width.clamp(0.0, bounds.width.max(0.0));
                let x0 = (bounds.width - width) / 2.0;
                Rect::new(x0, 0.0, x0 + width, bounds.height.max(0.0))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Insets, Rect, Size};

    use super::{ContentLayout, ViewOptions};

    #[test]
    fn centered_width_leaves_equal_margins() {
        let frame = ContentLayout::Width(100.0).page_frame(Size::new(300.0, 50.0));
        assert_eq!(frame, Rect::new(100.0, 0.0, 200.0, 50.0));
    }

    #[test]
    fn oversized_insets_collapse_to_empty_frame() {
        let layout = ContentLayout::Insets(Insets::new(80.0, 0.0, 80.0, 0.0));
        let frame = layout.page_frame(Size::new(100.0, 40.0));
        assert_eq!(frame.width(), 0.0);
        assert_eq!(frame.height(), 40.0);
    }

    #[test]
    fn negative_spacing_is_clamped() {
        assert_eq!(ViewOptions::default().with_spacing(-2.0).spacing, 0.0);
    }
}
