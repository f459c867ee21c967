// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Data source and delegate capabilities, and the environment that calls them.

use alloc::rc::Rc;
use core::cell::RefCell;

use hashbrown::HashSet;
use kurbo::{Point, Rect, Size, Vec2};
use tracing::warn;

use crate::cell::{CellQueue, CellStore};
use crate::{Cell, CellContent, CellId, IndexPath};

/// Supplies pages, rows and cells.
///
/// Only [`DataSource::number_of_items`] and [`DataSource::cell_for_row`] are required.
pub trait DataSource<T> {
    /// Number of sections. Defaults to `1`.
    fn number_of_sections(&self) -> usize {
        1
    }

    /// Number of items (pages) in `section`.
    fn number_of_items(&self, section: usize) -> usize;

    /// Number of rows in the page at `item_path`. Defaults to `1`.
    fn number_of_rows(&self, item_path: IndexPath) -> usize {
        let _ = item_path;
        1
    }

    /// Returns the cell for the row at `path`.
    ///
    /// The cell must come from [`CellQueue::dequeue`] (or [`CellQueue::try_dequeue`])
    /// during this call.
    fn cell_for_row(&mut self, cells: &mut CellQueue<'_, T>, path: IndexPath) -> CellId;
}

/// Optional callbacks about layout, display, selection and scrolling.
///
/// Every method has a default; implement only what you need.
#[allow(unused_variables, reason = "default bodies ignore their arguments")]
pub trait Delegate<T> {
    /// Height of the row at `path`, or `None` for the page height.
    fn height_for_row(&self, path: IndexPath) -> Option<f64> {
        None
    }

    /// The cell at `path` is about to become visible.
    fn will_display(&mut self, cell: &Cell<T>, path: IndexPath) {}

    /// The cell at `path` is no longer visible.
    fn did_end_displaying(&mut self, cell: &Cell<T>, path: IndexPath) {}

    /// The user selected the row at `path`.
    fn did_select_row(&mut self, path: IndexPath) {}

    /// The content offset changed.
    fn did_scroll(&mut self, offset: Point) {}

    /// A drag is starting.
    fn will_begin_dragging(&mut self) {}

    /// A drag is ending; `target` may be adjusted to change where scrolling settles.
    fn will_end_dragging(&mut self, velocity: Vec2, target: &mut Point) {}

    /// A drag ended; `decelerate` tells whether a deceleration follows.
    fn did_end_dragging(&mut self, decelerate: bool) {}

    /// A deceleration is starting.
    fn will_begin_decelerating(&mut self) {}

    /// A deceleration finished.
    fn did_end_decelerating(&mut self) {}

    /// An animated offset change is starting.
    fn will_begin_scrolling_animation(&mut self) {}

    /// An animated offset change finished.
    fn did_end_scrolling_animation(&mut self) {}
}

/// Calls `f` with the delegate, unless it is gone or already borrowed.
pub(crate) fn call_delegate<T, R>(
    delegate: Option<&Rc<RefCell<dyn Delegate<T>>>>,
    call: &str,
    f: impl FnOnce(&mut dyn Delegate<T>) -> R,
) -> Option<R> {
    match delegate?.try_borrow_mut() {
        Ok(mut delegate) => Some(f(&mut *delegate)),
        Err(_) => {
            warn!(call, "delegate is already borrowed; skipping");
            None
        }
    }
}

/// Everything a layout pass needs besides the pages themselves.
///
/// Collaborators are upgraded once per pass; a collaborator that has been dropped
/// behaves like one that reports nothing and implements no optional method.
pub(crate) struct Env<'a, T> {
    pub(crate) cells: &'a mut CellStore<T>,
    pub(crate) selection: &'a mut HashSet<IndexPath>,
    data_source: Option<Rc<RefCell<dyn DataSource<T>>>>,
    delegate: Option<Rc<RefCell<dyn Delegate<T>>>>,
    pub(crate) reusable: bool,
}

impl<T> core::fmt::Debug for Env<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Env")
            .field("cells", &self.cells)
            .field("selection", &self.selection.len())
            .field("data_source", &self.data_source.is_some())
            .field("delegate", &self.delegate.is_some())
            .field("reusable", &self.reusable)
            .finish()
    }
}

impl<'a, T> Env<'a, T> {
    pub(crate) fn new(
        cells: &'a mut CellStore<T>,
        selection: &'a mut HashSet<IndexPath>,
        data_source: Option<Rc<RefCell<dyn DataSource<T>>>>,
        delegate: Option<Rc<RefCell<dyn Delegate<T>>>>,
        reusable: bool,
    ) -> Self {
        Self {
            cells,
            selection,
            data_source,
            delegate,
            reusable,
        }
    }

    fn with_source<R>(&self, call: &str, f: impl FnOnce(&dyn DataSource<T>) -> R) -> Option<R> {
        let source = self.data_source.as_ref()?;
        match source.try_borrow() {
            Ok(source) => Some(f(&*source)),
            Err(_) => {
                warn!(call, "data source is already mutably borrowed; skipping");
                None
            }
        }
    }

    fn with_delegate<R>(&self, call: &str, f: impl FnOnce(&mut dyn Delegate<T>) -> R) -> Option<R> {
        call_delegate(self.delegate.as_ref(), call, f)
    }

    pub(crate) fn number_of_sections(&self) -> usize {
        self.with_source("number_of_sections", |s| s.number_of_sections())
            .unwrap_or(0)
    }

    pub(crate) fn number_of_items(&self, section: usize) -> usize {
        self.with_source("number_of_items", |s| s.number_of_items(section))
            .unwrap_or(0)
    }

    pub(crate) fn number_of_rows(&self, item_path: IndexPath) -> usize {
        self.with_source("number_of_rows", |s| s.number_of_rows(item_path))
            .unwrap_or(0)
    }

    pub(crate) fn height_for_row(&self, path: IndexPath) -> Option<f64> {
        let delegate = self.delegate.as_ref()?;
        match delegate.try_borrow() {
            Ok(delegate) => delegate.height_for_row(path),
            Err(_) => {
                warn!(call = "height_for_row", "delegate is already mutably borrowed; skipping");
                None
            }
        }
    }

    pub(crate) fn will_display(&mut self, id: CellId, path: IndexPath) {
        let Some(cell) = self.cells.get_mut(id) else {
            return;
        };
        cell.set_displayed(true);
        let Some(cell) = self.cells.get(id) else {
            return;
        };
        self.with_delegate("will_display", |d| d.will_display(cell, path));
    }

    pub(crate) fn did_end_displaying(&mut self, id: CellId, path: IndexPath) {
        let Some(cell) = self.cells.get_mut(id) else {
            return;
        };
        cell.set_displayed(false);
        let Some(cell) = self.cells.get(id) else {
            return;
        };
        self.with_delegate("did_end_displaying", |d| d.did_end_displaying(cell, path));
    }

    /// Adds `path` to the selection set and reports the selection.
    pub(crate) fn did_select_row(&mut self, path: IndexPath) {
        self.selection.insert(path);
        self.with_delegate("did_select_row", |d| d.did_select_row(path));
    }

    pub(crate) fn did_scroll(&self, offset: Point) {
        self.with_delegate("did_scroll", |d| d.did_scroll(offset));
    }
}

impl<T: CellContent> Env<'_, T> {
    /// Asks the data source for the cell at `path` and attaches it at `frame`.
    ///
    /// Returns `None` when there is no data source or it returned a cell that cannot
    /// be attached (already attached elsewhere, or not from this control).
    pub(crate) fn attach_cell_for_row(
        &mut self,
        path: IndexPath,
        frame: Rect,
        page_size: Size,
    ) -> Option<CellId> {
        let source = self.data_source.clone()?;
        let id = match source.try_borrow_mut() {
            Ok(mut source) => {
                let mut queue = CellQueue::new(&mut *self.cells, page_size);
                Some(source.cell_for_row(&mut queue, path))
            }
            Err(_) => {
                warn!(%path, "data source is already borrowed; cell not created");
                None
            }
        };
        let selected = self.selection.contains(&path);
        let attached = id.filter(|&id| self.cells.attach(id, path, frame, selected));
        if id.is_some() && attached.is_none() {
            warn!(%path, "data source returned a cell that is attached or unknown");
        }
        self.cells.release_reservations();
        attached
    }
}
