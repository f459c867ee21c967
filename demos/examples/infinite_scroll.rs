// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless walkthrough of an infinite, wrapping page strip.
//!
//! This example shows how to:
//! - register a cell type and serve rows from a data source,
//! - follow display callbacks through a delegate,
//! - scroll past the end of the strip and watch it wrap,
//! - drag with paging and run the settle animation to completion.
//!
//! Run:
//! - `cargo run -p understory_demos --example infinite_scroll`

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Size, Vec2};
use understory_infinite_view::{
    Cell, CellContent, CellId, CellQueue, DataSource, Delegate, IndexPath, InfiniteView,
    ViewOptions,
};

const ROW: &str = "row";

/// Row content: just the text a renderer would draw.
#[derive(Debug, Default)]
struct Label(String);

impl CellContent for Label {
    fn prepare_for_reuse(&mut self) {
        self.0.clear();
    }
}

/// Seven days, each with a handful of hourly rows.
#[derive(Default)]
struct Week {
    shown: Vec<IndexPath>,
}

impl DataSource<Label> for Week {
    fn number_of_items(&self, _section: usize) -> usize {
        7
    }

    fn number_of_rows(&self, _item_path: IndexPath) -> usize {
        6
    }

    fn cell_for_row(&mut self, cells: &mut CellQueue<'_, Label>, path: IndexPath) -> CellId {
        let id = cells.dequeue(ROW);
        if let Some(cell) = cells.get_mut(id) {
            cell.content_mut().0 = format!("day {} / hour {}", path.item(), path.row());
        }
        id
    }
}

impl Delegate<Label> for Week {
    fn height_for_row(&self, _path: IndexPath) -> Option<f64> {
        Some(40.0)
    }

    fn will_display(&mut self, _cell: &Cell<Label>, path: IndexPath) {
        self.shown.push(path);
    }

    fn did_end_displaying(&mut self, _cell: &Cell<Label>, path: IndexPath) {
        self.shown.retain(|p| *p != path);
    }

    fn did_select_row(&mut self, path: IndexPath) {
        println!("selected {path}");
    }
}

fn print_frame(view: &InfiniteView<Label>, label: &str) {
    println!("-- {label}: offset {:?}", view.content_offset());
    for page in view.visible_pages() {
        println!(
            "   {:?} item {} at x {:.0}..{:.0}{}",
            page.kind,
            page.item_path.item(),
            page.frame.x0,
            page.frame.x1,
            if page.has_content { "" } else { " (blank)" },
        );
    }
    for id in view.visible_cells() {
        if let Some(cell) = view.cell(id) {
            println!("     {}", cell.content().0);
        }
    }
}

fn main() {
    let week = Rc::new(RefCell::new(Week::default()));

    let mut view = InfiniteView::new(Size::new(300.0, 160.0), ViewOptions::default());
    view.set_content_width(100.0);
    view.register_cell_type(ROW, |_| Label::default());
    view.set_data_source(&week);
    view.set_delegate(&week);
    view.reload_data();
    print_frame(&view, "initial");

    // Seven pages of 100 make one period of 700: one more step wraps around.
    for step in 1..=7 {
        view.set_content_offset(Point::new(f64::from(step) * 100.0, 0.0), false);
    }
    print_frame(&view, "after one full period");

    // Scroll the rows of every page down by two hours.
    view.set_content_offset(Point::new(0.0, 80.0), false);
    print_frame(&view, "rows scrolled");

    // A paged drag settles on the next page boundary.
    view.set_paging(true);
    view.begin_dragging();
    view.drag_by(Vec2::new(130.0, 0.0));
    view.end_dragging(Vec2::new(5.0, 0.0));
    let mut frames = 0;
    while view.advance_animation(1.0 / 60.0) {
        frames += 1;
    }
    println!("settled after {frames} frames");
    print_frame(&view, "after paged drag");

    if let Some(path) = view.select_row_at(Point::new(150.0, 20.0)) {
        println!("tapped {path}, selection {:?}", view.selected_rows());
    }

    println!("{} rows announced as displayed", week.borrow().shown.len());
}
