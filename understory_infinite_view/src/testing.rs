// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collaborators shared by the unit tests.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashSet;
use kurbo::{Point, Vec2};

use crate::cell::CellStore;
use crate::source::Env;
use crate::{Cell, CellContent, CellId, CellQueue, DataSource, Delegate, IndexPath};

pub(crate) const ROW: &str = "row";

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Label {
    pub(crate) text: String,
}

impl CellContent for Label {}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Event {
    WillDisplay(IndexPath),
    DidEndDisplaying(IndexPath),
    Select(IndexPath),
    Scroll,
    BeginDragging,
    EndDragging(bool),
    BeginDecelerating,
    EndDecelerating,
    BeginAnimation,
    EndAnimation,
}

/// Uniform grid: `items` pages per section, `rows` rows per page.
#[derive(Debug, Default)]
pub(crate) struct Grid {
    pub(crate) sections: Vec<usize>,
    pub(crate) rows: usize,
    pub(crate) row_height: Option<f64>,
    pub(crate) events: Vec<Event>,
    pub(crate) target_override: Option<Point>,
    pub(crate) created: usize,
}

impl Grid {
    pub(crate) fn new(items: usize, rows: usize) -> Self {
        Self {
            sections: alloc::vec![items],
            rows,
            ..Self::default()
        }
    }

    pub(crate) fn shared(self) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(self))
    }

    pub(crate) fn take_events(&mut self) -> Vec<Event> {
        core::mem::take(&mut self.events)
    }

    /// Panics if a path is displayed twice without an end, or ended without a display.
    pub(crate) fn assert_balanced(&self) {
        let mut shown: Vec<IndexPath> = Vec::new();
        for event in &self.events {
            match event {
                Event::WillDisplay(path) => {
                    assert!(!shown.contains(path), "{path} displayed twice");
                    shown.push(*path);
                }
                Event::DidEndDisplaying(path) => {
                    let before = shown.len();
                    shown.retain(|p| p != path);
                    assert_ne!(before, shown.len(), "{path} ended without being displayed");
                }
                _ => {}
            }
        }
    }

    /// Paths that received `will_display` and no matching `did_end_displaying` since.
    pub(crate) fn displayed(&self) -> Vec<IndexPath> {
        let mut shown: Vec<IndexPath> = Vec::new();
        for event in &self.events {
            match event {
                Event::WillDisplay(path) => shown.push(*path),
                Event::DidEndDisplaying(path) => shown.retain(|p| p != path),
                _ => {}
            }
        }
        shown.sort();
        shown
    }
}

impl DataSource<Label> for Grid {
    fn number_of_sections(&self) -> usize {
        self.sections.len()
    }

    fn number_of_items(&self, section: usize) -> usize {
        self.sections.get(section).copied().unwrap_or(0)
    }

    fn number_of_rows(&self, _item_path: IndexPath) -> usize {
        self.rows
    }

    fn cell_for_row(&mut self, cells: &mut CellQueue<'_, Label>, path: IndexPath) -> CellId {
        let id = cells.dequeue(ROW);
        if let Some(cell) = cells.get_mut(id) {
            cell.content_mut().text = format!("{path}");
        }
        self.created += 1;
        id
    }
}

impl Delegate<Label> for Grid {
    fn height_for_row(&self, _path: IndexPath) -> Option<f64> {
        self.row_height
    }

    fn will_display(&mut self, cell: &Cell<Label>, path: IndexPath) {
        assert_eq!(cell.index_path(), path, "cell path matches the callback");
        self.events.push(Event::WillDisplay(path));
    }

    fn did_end_displaying(&mut self, _cell: &Cell<Label>, path: IndexPath) {
        self.events.push(Event::DidEndDisplaying(path));
    }

    fn did_select_row(&mut self, path: IndexPath) {
        self.events.push(Event::Select(path));
    }

    fn did_scroll(&mut self, _offset: Point) {
        self.events.push(Event::Scroll);
    }

    fn will_begin_dragging(&mut self) {
        self.events.push(Event::BeginDragging);
    }

    fn will_end_dragging(&mut self, _velocity: Vec2, target: &mut Point) {
        if let Some(to) = self.target_override {
            *target = to;
        }
    }

    fn did_end_dragging(&mut self, decelerate: bool) {
        self.events.push(Event::EndDragging(decelerate));
    }

    fn will_begin_decelerating(&mut self) {
        self.events.push(Event::BeginDecelerating);
    }

    fn did_end_decelerating(&mut self) {
        self.events.push(Event::EndDecelerating);
    }

    fn will_begin_scrolling_animation(&mut self) {
        self.events.push(Event::BeginAnimation);
    }

    fn did_end_scrolling_animation(&mut self) {
        self.events.push(Event::EndAnimation);
    }
}

/// A cell store with the `row` identifier registered.
pub(crate) fn store(reusable: bool) -> CellStore<Label> {
    let mut store = CellStore::new(reusable);
    store.register_type(ROW, |_| Label::default());
    store
}

/// An environment whose data source and delegate are both `grid`.
pub(crate) fn env<'a>(
    cells: &'a mut CellStore<Label>,
    selection: &'a mut HashSet<IndexPath>,
    grid: &Rc<RefCell<Grid>>,
    reusable: bool,
) -> Env<'a, Label> {
    Env::new(
        cells,
        selection,
        Some(grid.clone() as Rc<RefCell<dyn DataSource<Label>>>),
        Some(grid.clone() as Rc<RefCell<dyn Delegate<Label>>>),
        reusable,
    )
}
