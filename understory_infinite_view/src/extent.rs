// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row extents of one page, backed by prefix sums.

use alloc::vec::Vec;
use core::ops::Range;

use kurbo::Rect;

/// Heights of the rows of one page, stacked top to bottom from `y = 0`.
///
/// Offsets are precomputed when the extents are built; pages are rebuilt wholesale on
/// reload or resize, so there is no incremental update path.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RowExtents {
    extents: Vec<f64>,
    /// `starts[i]` is the top of row `i`; one extra entry holds the total.
    starts: Vec<f64>,
}

impl RowExtents {
    /// Builds extents from row heights. Negative and non-finite heights become `0.0`.
    pub(crate) fn from_heights(heights: impl IntoIterator<Item = f64>) -> Self {
        let mut extents = Vec::new();
        let mut starts = Vec::new();
        let mut pos = 0.0;
        for height in heights {
            let extent = if height.is_finite() && height > 0.0 {
                height
            } else {
                0.0
            };
            starts.push(pos);
            extents.push(extent);
            pos += extent;
        }
        starts.push(pos);
        Self { extents, starts }
    }

    pub(crate) fn len(&self) -> usize {
        self.extents.len()
    }

    /// Top of row `index`; past-the-end indices return the total.
    pub(crate) fn offset_at(&self, index: usize) -> f64 {
        self.starts
            .get(index)
            .or_else(|| self.starts.last())
            .copied()
            .unwrap_or(0.0)
    }

    pub(crate) fn extent_at(&self, index: usize) -> f64 {
        self.extents.get(index).copied().unwrap_or(0.0)
    }

    /// Sum of every row height.
    pub(crate) fn total(&self) -> f64 {
        self.starts.last().copied().unwrap_or(0.0)
    }

    /// Full-width rectangle of row `index` in page-local coordinates.
    pub(crate) fn rect(&self, index: usize, width: f64) -> Option<Rect> {
        if index >= self.len() {
            return None;
        }
        let y0 = self.offset_at(index);
        Some(Rect::new(0.0, y0, width, y0 + self.extent_at(index)))
    }

    /// Indices of rows whose vertical span strictly overlaps `[start, end)`.
    ///
    /// A row that only touches the range at one edge is excluded. Zero-height rows
    /// may still fall inside the returned range, so callers test each row rectangle.
    pub(crate) fn visible_range(&self, start: f64, end: f64) -> Range<usize> {
        if self.extents.is_empty() || end <= start {
            return 0..0;
        }
        let len = self.len();
        // First row whose bottom lies below `start`.
        let first = self.starts[1..].partition_point(|&bottom| bottom <= start);
        // First row whose top is at or beyond `end`.
        let last = self.starts[..len].partition_point(|&top| top < end);
        first.min(last)..last
    }
}
