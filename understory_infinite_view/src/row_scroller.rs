// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Vertical virtualization of the rows of one page.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell as Slot;
use core::ops::Range;

use hashbrown::HashMap;
use kurbo::{Point, Rect, Size};
use tracing::trace;

use crate::extent::RowExtents;
use crate::observe::Subscription;
use crate::source::Env;
use crate::util::{contains, intersects};
use crate::wrapper::Wrapper;
use crate::{CellContent, CellId, IndexPath};

/// Row placement, cell attachment and display tracking for one page.
///
/// The scroller never owns cells. `cells` maps a row to the handle of the cell
/// attached for it, and entries are removed whenever the cell is detached.
#[derive(Debug)]
pub(crate) struct RowScroller {
    item_path: IndexPath,
    size: Size,
    rows: Rc<RowExtents>,
    cells: HashMap<IndexPath, CellId>,
    /// Rows announced through `will_display` and not yet ended, in display order.
    displayed: Vec<usize>,
    offset_y: f64,
    inbox: Rc<Slot<Option<Point>>>,
    _subscription: Subscription<Point>,
    dirty: bool,
    shown: bool,
}

impl RowScroller {
    /// Creates a scroller for the page at `item_path`, following `wrapper`'s vertical offset.
    pub(crate) fn new(
        item_path: IndexPath,
        size: Size,
        rows: Rc<RowExtents>,
        wrapper: &mut Wrapper,
    ) -> Self {
        let inbox = Rc::new(Slot::new(None));
        let subscription = {
            let inbox = inbox.clone();
            wrapper.subscribe(move |offset| inbox.set(Some(*offset)))
        };
        Self {
            item_path,
            size,
            rows,
            cells: HashMap::new(),
            displayed: Vec::new(),
            offset_y: wrapper.offset().y,
            inbox,
            _subscription: subscription,
            dirty: false,
            shown: false,
        }
    }

    pub(crate) fn item_path(&self) -> IndexPath {
        self.item_path
    }

    pub(crate) fn offset_y(&self) -> f64 {
        self.offset_y
    }

    /// Whether the page has been announced as displayed.
    pub(crate) fn is_shown(&self) -> bool {
        self.shown
    }

    pub(crate) fn set_shown(&mut self, shown: bool) {
        self.shown = shown;
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Visible window in row space.
    pub(crate) fn window(&self) -> Rect {
        Rect::new(
            0.0,
            self.offset_y,
            self.size.width,
            self.offset_y + self.size.height,
        )
    }

    fn row_rect(&self, index: usize) -> Option<Rect> {
        self.rows.rect(index, self.size.width)
    }

    fn visible_rows(&self) -> Range<usize> {
        let window = self.window();
        if window.width() <= 0.0 {
            return 0..0;
        }
        self.rows.visible_range(window.y0, window.y1)
    }

    fn is_row_visible(&self, index: usize) -> bool {
        self.row_rect(index)
            .is_some_and(|rect| intersects(rect, self.window()))
    }

    /// Takes the latest published offset, marking the scroller dirty if it moved.
    pub(crate) fn drain_inbox(&mut self) {
        if let Some(offset) = self.inbox.take() {
            if offset.y != self.offset_y {
                self.offset_y = offset.y;
                self.dirty = true;
            }
        }
    }

    /// Replaces the row table after a page resize, moving attached cells to their new frames.
    pub(crate) fn set_rows<T>(&mut self, env: &mut Env<'_, T>, rows: Rc<RowExtents>, size: Size) {
        self.rows = rows;
        self.size = size;
        for (path, id) in &self.cells {
            let frame = self.rows.rect(path.row(), size.width);
            if let (Some(cell), Some(frame)) = (env.cells.get_mut(*id), frame) {
                cell.set_frame(frame);
            }
        }
        self.dirty = true;
    }

    fn has_attached_cell<T>(&self, env: &Env<'_, T>, path: IndexPath) -> bool {
        self.cells
            .get(&path)
            .and_then(|id| env.cells.get(*id))
            .is_some_and(|cell| cell.is_attached())
    }

    /// Attaches cells for every row (`all`) or for the rows in the visible window.
    pub(crate) fn configure<T: CellContent>(&mut self, env: &mut Env<'_, T>, all: bool) {
        let range = if all {
            0..self.rows.len()
        } else {
            self.visible_rows()
        };
        for index in range {
            let Some(frame) = self.row_rect(index) else {
                continue;
            };
            if !all && !intersects(frame, self.window()) {
                continue;
            }
            let path = self.item_path.with_row(index);
            if self.has_attached_cell(env, path) {
                continue;
            }
            self.cells.remove(&path);
            if let Some(id) = env.attach_cell_for_row(path, frame, self.size) {
                self.cells.insert(path, id);
            }
        }
    }

    /// Announces every visible row with an attached, not yet displayed cell.
    pub(crate) fn will_display<T>(&mut self, env: &mut Env<'_, T>) {
        for index in self.visible_rows() {
            if !self.is_row_visible(index) || self.displayed.contains(&index) {
                continue;
            }
            let path = self.item_path.with_row(index);
            let Some(&id) = self.cells.get(&path) else {
                continue;
            };
            if !env.cells.get(id).is_some_and(|cell| cell.is_attached()) {
                continue;
            }
            trace!(%path, "will display row");
            env.will_display(id, path);
            self.displayed.push(index);
        }
    }

    /// Ends display of rows that left the window, or of every displayed row (`all`).
    ///
    /// In reusable mode the ended cells are detached and go back to the pool.
    pub(crate) fn did_end_displaying<T>(&mut self, env: &mut Env<'_, T>, all: bool) {
        let mut kept = Vec::with_capacity(self.displayed.len());
        for index in core::mem::take(&mut self.displayed) {
            if !all && self.is_row_visible(index) {
                kept.push(index);
                continue;
            }
            let path = self.item_path.with_row(index);
            let Some(&id) = self.cells.get(&path) else {
                continue;
            };
            trace!(%path, "did end displaying row");
            env.did_end_displaying(id, path);
            if env.reusable {
                env.cells.detach(id);
                self.cells.remove(&path);
            }
        }
        self.displayed = kept;
    }

    /// Detaches every cell without callbacks.
    pub(crate) fn teardown<T>(&mut self, env: &mut Env<'_, T>) {
        for (_, id) in self.cells.drain() {
            env.cells.detach(id);
        }
        self.displayed.clear();
        self.shown = false;
    }

    /// Row at `point` (row space) among the displayed rows.
    pub(crate) fn index_path_at(&self, point: Point) -> Option<IndexPath> {
        self.displayed
            .iter()
            .copied()
            .find(|&index| {
                self.row_rect(index)
                    .is_some_and(|rect| contains(rect, point.x, point.y))
            })
            .map(|index| self.item_path.with_row(index))
    }

    /// Marks the cell at `path` selected and reports the selection.
    pub(crate) fn select<T>(&mut self, env: &mut Env<'_, T>, path: IndexPath) {
        if let Some(cell) = self.cells.get(&path).and_then(|id| env.cells.get_mut(*id)) {
            cell.set_selected(true);
        }
        env.did_select_row(path);
    }

    pub(crate) fn cell_for_row(&self, path: IndexPath) -> Option<CellId> {
        self.cells.get(&path).copied()
    }

    /// Cells of the displayed rows, in display order.
    pub(crate) fn visible_cells(&self) -> impl Iterator<Item = CellId> + '_ {
        self.displayed
            .iter()
            .filter_map(|&index| self.cells.get(&self.item_path.with_row(index)).copied())
    }

    /// Cell under the middle of the visible window.
    pub(crate) fn visible_center_cell(&self) -> Option<CellId> {
        let window = self.window();
        let path = self.index_path_at(window.center())?;
        self.cell_for_row(path)
    }

    #[cfg(test)]
    pub(crate) fn attached_count(&self) -> usize {
        self.cells.len()
    }
}
