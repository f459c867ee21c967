// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_infinite_view --heading-base-level=0

//! Understory Infinite View: a headless, horizontally wrapping, two-level virtualized
//! scroll grid.
//!
//! Content is organized as sections of items. Each item is shown as a full-height
//! *page*, pages sit side by side in one horizontal strip, and each page scrolls its
//! own *rows* vertically. In infinite mode the strip wraps: scrolling past the last
//! page continues with the first one, in both directions, without a visible seam.
//!
//! The core concepts are:
//!
//! - [`InfiniteView`]: the control. It owns the pages, the cell pool and the scroll
//!   state, and runs a layout pass on every [`tick`](InfiniteView::tick).
//! - [`DataSource`]: supplies section, item and row counts and hands out a cell for
//!   every row that becomes visible.
//! - [`Delegate`]: optional row heights plus display, selection and scroll lifecycle
//!   callbacks.
//! - [`Cell`]: a recyclable row view with caller-defined [`CellContent`]. Cells are
//!   created through registered factories and recycled per reuse identifier.
//! - [`IndexPath`]: `(section, item, row)` addressing.
//! - [`Publisher`]: a small weak-subscriber observer used to fan scroll offsets out.
//!
//! Only the pages and rows that intersect the control are realized. Near the ends of
//! the strip, *buffer pages* mirror the first and last pages so that both ends can be
//! on screen at once. When the offset leaves the real content it is remapped by whole
//! periods and already-populated rows are handed over to the pages that now show the
//! same item, so the user never sees a reload.
//!
//! This crate does not draw anything. Renderers read back
//! [`InfiniteView::visible_pages`], [`InfiniteView::visible_cells`] and
//! [`InfiniteView::separator_rects`] after each pass, and input code feeds drags,
//! taps and frame times back in.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use kurbo::{Point, Size};
//! use understory_infinite_view::{
//!     CellContent, CellId, CellQueue, DataSource, IndexPath, InfiniteView, ViewOptions,
//! };
//!
//! #[derive(Default)]
//! struct Label(String);
//!
//! impl CellContent for Label {}
//!
//! struct Days;
//!
//! impl DataSource<Label> for Days {
//!     fn number_of_items(&self, _section: usize) -> usize {
//!         7
//!     }
//!
//!     fn cell_for_row(&mut self, cells: &mut CellQueue<'_, Label>, path: IndexPath) -> CellId {
//!         let id = cells.dequeue("day");
//!         if let Some(cell) = cells.get_mut(id) {
//!             cell.content_mut().0 = format!("day {}", path.item());
//!         }
//!         id
//!     }
//! }
//!
//! let days = Rc::new(RefCell::new(Days));
//! let mut view = InfiniteView::new(Size::new(300.0, 200.0), ViewOptions::default());
//! view.set_content_width(100.0);
//! view.register_cell_type("day", |_| Label::default());
//! view.set_data_source(&days);
//! view.reload_data();
//!
//! // The last day shows to the left of the first one.
//! let items: Vec<usize> = view.visible_pages().iter().map(|p| p.item_path.item()).collect();
//! assert_eq!(items, [6, 0, 1]);
//!
//! // Scrolling one full period lands back where it started.
//! view.set_content_offset(Point::new(700.0, 0.0), false);
//! assert_eq!(view.content_offset(), Point::ZERO);
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support in `kurbo` and `tracing`.
//! - `libm`: `no_std` float support for `kurbo`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod animation;
mod cell;
mod constraints;
mod error;
mod extent;
mod index_path;
mod observe;
mod options;
mod page;
mod page_scroller;
mod page_source;
mod reuse;
mod row_scroller;
mod source;
#[cfg(test)]
mod testing;
mod util;
mod view;
mod wrapper;

pub use cell::{Cell, CellContent, CellFlags, CellId, CellQueue};
pub use error::Error;
pub use index_path::IndexPath;
pub use observe::{Publisher, Subscription};
pub use options::{ContentLayout, ViewOptions};
pub use page::PageKind;
pub use source::{DataSource, Delegate};
pub use view::{InfiniteView, TickReason, VisiblePage};
