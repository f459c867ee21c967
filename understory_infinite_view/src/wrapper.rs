// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The externally visible scroll surface and its wraparound remap.

use kurbo::{Point, Rect, Size};
use tracing::debug;

use crate::observe::{Publisher, Subscription};
use crate::util::{ceil, floor, wrap_into};

/// Outer scroll surface.
///
/// Its horizontal extent is the real content width (one period of pages); the buffer
/// pages on either side are exposed as content insets. The offset may leave the real
/// extent while the user scrolls, and is remapped by exactly the number of periods
/// needed to bring it back between the remap bounds.
#[derive(Debug, Default)]
pub(crate) struct Wrapper {
    offset: Point,
    bounds: Size,
    page_frame: Rect,
    /// One period: page stride times page count.
    content_width: f64,
    content_height: f64,
    leading_inset: f64,
    trailing_inset: f64,
    infinite: bool,
    offsets: Publisher<Point>,
}

impl Wrapper {
    pub(crate) fn new(infinite: bool) -> Self {
        Self {
            infinite,
            ..Self::default()
        }
    }

    pub(crate) fn offset(&self) -> Point {
        self.offset
    }

    /// Stores a raw offset. Nothing is published until the next remap.
    pub(crate) fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    pub(crate) fn set_geometry(&mut self, bounds: Size, page_frame: Rect) {
        self.bounds = bounds;
        self.page_frame = page_frame;
    }

    pub(crate) fn set_infinite(&mut self, infinite: bool) {
        self.infinite = infinite;
    }

    /// Sets the real content width and the widths of the buffer regions.
    pub(crate) fn set_content(&mut self, width: f64, leading_inset: f64, trailing_inset: f64) {
        self.content_width = width.max(0.0);
        self.leading_inset = leading_inset.max(0.0);
        self.trailing_inset = trailing_inset.max(0.0);
    }

    pub(crate) fn set_content_height(&mut self, height: f64) {
        self.content_height = height.max(0.0);
    }

    pub(crate) fn content_size(&self) -> Size {
        Size::new(self.content_width, self.content_height)
    }

    /// Offsets in `[lower, upper)` need no remap.
    pub(crate) fn remap_bounds(&self) -> (f64, f64) {
        let x0 = self.page_frame.x0;
        let lower = x0 - self.leading_inset;
        let upper = self.content_width + self.trailing_inset + x0 - self.bounds.width;
        (lower, upper)
    }

    /// Returns `offset` moved by whole periods into the remap bounds.
    ///
    /// Offsets already inside the bounds, and every offset in finite mode, are
    /// returned unchanged.
    pub(crate) fn remap(&self, offset: Point) -> Point {
        let period = self.content_width;
        if !self.infinite || period <= 0.0 {
            return offset;
        }
        let (lower, upper) = self.remap_bounds();
        let mut x = offset.x;
        if x < lower {
            x += period * ceil((lower - x) / period);
        } else if x >= upper {
            x -= period * (floor((x - upper) / period) + 1.0);
        }
        Point::new(x, offset.y)
    }

    /// Clamps `offset` to the scrollable range.
    ///
    /// The vertical offset is kept within the tallest page. The horizontal offset is
    /// only clamped in finite mode.
    pub(crate) fn clamp(&self, offset: Point) -> Point {
        let max_y = (self.content_height - self.page_frame.height()).max(0.0);
        let y = offset.y.clamp(0.0, max_y);
        let x = if self.infinite {
            offset.x
        } else {
            let max_x = (self.content_width - self.page_frame.width()).max(0.0);
            offset.x.clamp(0.0, max_x)
        };
        Point::new(x, y)
    }

    /// Remaps and clamps the stored offset, then publishes it.
    ///
    /// Returns the horizontal shift the remap applied (`0.0` when none).
    pub(crate) fn settle(&mut self) -> f64 {
        let raw = self.offset;
        let settled = self.clamp(self.remap(raw));
        let shift = settled.x - raw.x;
        if shift != 0.0 {
            debug!(from = raw.x, to = settled.x, "wrapped content offset");
        }
        self.offset = settled;
        self.publish();
        shift
    }

    pub(crate) fn publish(&mut self) {
        let offset = self.offset;
        self.offsets.publish(|| offset);
    }

    pub(crate) fn subscribe(&mut self, handler: impl Fn(&Point) + 'static) -> Subscription<Point> {
        self.offsets.subscribe(handler)
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.offsets.subscriber_count()
    }

    /// The offset as the user sees it: horizontally reduced into one period.
    pub(crate) fn visible_offset(&self) -> Point {
        if self.infinite && self.content_width > 0.0 {
            Point::new(wrap_into(self.offset.x, self.content_width), self.offset.y)
        } else {
            self.offset
        }
    }
}
