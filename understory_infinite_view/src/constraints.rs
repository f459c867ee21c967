// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Horizontal spacing constraints between pages and the chain solver that places them.

use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use kurbo::{Rect, Size};
use tracing::warn;

use crate::page::PageId;

/// Fixed-width gap from the trailing edge of `leading` to the leading edge of `trailing`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Gap {
    pub(crate) leading: PageId,
    pub(crate) trailing: PageId,
    pub(crate) width: f64,
}

/// Pins a page to one end of the strip, `inset` away from it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Pin {
    pub(crate) page: PageId,
    pub(crate) inset: f64,
}

/// Constraints added together and replaced together.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ConstraintGroup {
    pub(crate) between: Vec<Gap>,
    pub(crate) leading: Vec<Pin>,
    pub(crate) trailing: Vec<Pin>,
}

impl ConstraintGroup {
    /// Chains `pages` left to right with `spacing`-wide gaps, pinning both ends.
    ///
    /// The trailing pin keeps one more gap after the last page, so a strip of `n`
    /// pages is exactly `n` strides wide.
    pub(crate) fn chain(pages: impl IntoIterator<Item = PageId>, spacing: f64) -> Self {
        let mut group = Self::default();
        let mut previous = None;
        for page in pages {
            match previous {
                None => group.leading.push(Pin { page, inset: 0.0 }),
                Some(leading) => group.between.push(Gap {
                    leading,
                    trailing: page,
                    width: spacing,
                }),
            }
            previous = Some(page);
        }
        if let Some(page) = previous {
            group.trailing.push(Pin {
                page,
                inset: spacing,
            });
        }
        group
    }

    fn is_empty(&self) -> bool {
        self.between.is_empty() && self.leading.is_empty() && self.trailing.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.between.len() + self.leading.len() + self.trailing.len()
    }
}

/// Frames produced by [`ConstraintSet::solve`].
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Solution {
    pub(crate) frames: Vec<(PageId, Rect)>,
    /// Gap rectangles with a positive width, left to right.
    pub(crate) separators: Vec<Rect>,
    pub(crate) content_width: f64,
}

/// The main pages' constraints plus the constraints that chain the buffers around them.
///
/// When the around group is present its pins take precedence over the main pins,
/// because the buffers extend the strip on both sides.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct ConstraintSet {
    main: ConstraintGroup,
    around: ConstraintGroup,
}

impl ConstraintSet {
    pub(crate) fn replace_main(&mut self, group: ConstraintGroup) {
        self.main = group;
    }

    /// Replaces the around group wholesale.
    pub(crate) fn replace_around(&mut self, group: ConstraintGroup) {
        self.around = group;
    }

    pub(crate) fn clear(&mut self) {
        self.main = ConstraintGroup::default();
        self.around = ConstraintGroup::default();
    }

    /// Number of constraints currently installed.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.main.len() + self.around.len()
    }

    fn gaps(&self) -> impl Iterator<Item = &Gap> {
        self.main.between.iter().chain(&self.around.between)
    }

    /// Walks the chain from the leading pin, giving every page `size`.
    pub(crate) fn solve(&self, size: Size) -> Solution {
        let pins = if self.around.is_empty() {
            &self.main
        } else {
            &self.around
        };
        let Some(start) = pins.leading.first().or_else(|| self.main.leading.first()) else {
            return Solution::default();
        };
        let next: HashMap<PageId, &Gap> = self.gaps().map(|gap| (gap.leading, gap)).collect();

        let mut solution = Solution::default();
        let mut visited = HashSet::new();
        let mut page = start.page;
        let mut x = start.inset;
        loop {
            if !visited.insert(page) {
                warn!(?page, "spacing constraints form a cycle; stopping layout");
                break;
            }
            let frame = Rect::new(x, 0.0, x + size.width, size.height);
            solution.frames.push((page, frame));
            x = frame.x1;
            let Some(gap) = next.get(&page) else {
                break;
            };
            if gap.width > 0.0 {
                solution
                    .separators
                    .push(Rect::new(x, 0.0, x + gap.width, size.height));
            }
            x += gap.width;
            page = gap.trailing;
        }

        let trailing = pins
            .trailing
            .first()
            .or_else(|| self.main.trailing.first());
        match trailing {
            Some(pin) if pin.page == page => {
                if pin.inset > 0.0 {
                    solution
                        .separators
                        .push(Rect::new(x, 0.0, x + pin.inset, size.height));
                }
                x += pin.inset;
            }
            Some(pin) => warn!(expected = ?pin.page, found = ?page, "chain ends away from the trailing pin"),
            None => {}
        }
        solution.content_width = x;
        solution
    }
}
