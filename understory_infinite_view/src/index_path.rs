// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Index paths addressing pages and rows.

use core::fmt;

/// Ordered `(section, item, row)` triple identifying one row of one page.
///
/// An *item path* has `row == 0` and identifies a page; a *full path* identifies a
/// row within a page. Ordering is lexicographic over section, item, then row.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexPath {
    section: usize,
    item: usize,
    row: usize,
}

impl IndexPath {
    /// Creates a full path.
    #[must_use]
    pub const fn new(section: usize, item: usize, row: usize) -> Self {
        Self { section, item, row }
    }

    /// Creates an item path (row `0`).
    #[must_use]
    pub const fn for_item(section: usize, item: usize) -> Self {
        Self::new(section, item, 0)
    }

    /// Section index.
    #[must_use]
    pub const fn section(&self) -> usize {
        self.section
    }

    /// Item (page) index within the section.
    #[must_use]
    pub const fn item(&self) -> usize {
        self.item
    }

    /// Row index within the page.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// The item path of the page containing this row.
    #[must_use]
    pub const fn item_path(&self) -> Self {
        Self::for_item(self.section, self.item)
    }

    /// Returns the path of `row` within the same page.
    #[must_use]
    pub const fn with_row(&self, row: usize) -> Self {
        Self::new(self.section, self.item, row)
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.section, self.item, self.row)
    }
}
