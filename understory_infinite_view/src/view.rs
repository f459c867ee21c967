// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The public control: [`InfiniteView`].

use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::HashSet;
use kurbo::{Insets, Point, Rect, Size, Vec2};
use tracing::{debug, trace};

use crate::animation::{AnimationKind, ScrollAnimation};
use crate::cell::CellStore;
use crate::observe::Subscription;
use crate::page::PageKind;
use crate::page_scroller::{PageGeometry, PageScroller};
use crate::source::{Env, call_delegate};
use crate::util::{ceil, floor, intersects, round};
use crate::wrapper::Wrapper;
use crate::{
    Cell, CellContent, CellId, ContentLayout, DataSource, Delegate, Error, IndexPath, ViewOptions,
};

/// Why a layout pass runs. Only used for diagnostics; every pass does the same work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickReason {
    /// The control was resized.
    Resize,
    /// The content offset changed.
    Scroll,
    /// The host asked for a pass after invalidating the layout.
    Invalidate,
    /// Data was reloaded.
    Reload,
    /// An offset animation advanced.
    Animation,
}

/// Snapshot of one visible page, for renderers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VisiblePage {
    /// Item the page shows.
    pub item_path: IndexPath,
    /// Frame in control space.
    pub frame: Rect,
    /// Whether this is a main page or a wraparound buffer.
    pub kind: PageKind,
    /// `false` for a duplicate left blank because its twin already shows the rows.
    pub has_content: bool,
}

/// An infinite, horizontally wrapping grid of pages, each a vertical list of rows.
///
/// The control is headless: it decides which pages and cells exist and where they
/// are, and reports changes to its [`Delegate`]. The host renders from
/// [`InfiniteView::visible_pages`] and [`InfiniteView::visible_cells`], and calls
/// [`InfiniteView::tick`] (directly, or through the setters that do so) whenever the
/// geometry or offset changed.
///
/// Both collaborators are held weakly; keep your own `Rc` alive.
pub struct InfiniteView<T: CellContent> {
    options: ViewOptions,
    layout: ContentLayout,
    bounds: Size,
    cells: CellStore<T>,
    selection: HashSet<IndexPath>,
    data_source: Option<Weak<RefCell<dyn DataSource<T>>>>,
    delegate: Option<Weak<RefCell<dyn Delegate<T>>>>,
    wrapper: Wrapper,
    pages: PageScroller,
    animation: Option<ScrollAnimation>,
    dragging: bool,
}

impl<T: CellContent> fmt::Debug for InfiniteView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfiniteView")
            .field("options", &self.options)
            .field("layout", &self.layout)
            .field("bounds", &self.bounds)
            .field("cells", &self.cells)
            .field("selection", &self.selection)
            .field("wrapper", &self.wrapper)
            .field("pages", &self.pages)
            .field("animation", &self.animation)
            .field("dragging", &self.dragging)
            .finish_non_exhaustive()
    }
}

impl<T: CellContent> InfiniteView<T> {
    /// Creates a control of size `bounds`. Nothing is laid out until data is loaded.
    #[must_use]
    pub fn new(bounds: Size, options: ViewOptions) -> Self {
        let mut wrapper = Wrapper::new(options.infinite);
        let pages = PageScroller::new(&mut wrapper);
        Self {
            options,
            layout: ContentLayout::default(),
            bounds,
            cells: CellStore::new(options.reusable),
            selection: HashSet::new(),
            data_source: None,
            delegate: None,
            wrapper,
            pages,
            animation: None,
            dragging: false,
        }
    }

    /// Sets the data source. Takes effect on the next [`InfiniteView::reload_data`].
    pub fn set_data_source<S: DataSource<T> + 'static>(&mut self, source: &Rc<RefCell<S>>) {
        let source: Rc<RefCell<dyn DataSource<T>>> = source.clone();
        self.data_source = Some(Rc::downgrade(&source));
        self.pages.set_needs_reload();
    }

    /// Sets the delegate.
    pub fn set_delegate<D: Delegate<T> + 'static>(&mut self, delegate: &Rc<RefCell<D>>) {
        let delegate: Rc<RefCell<dyn Delegate<T>>> = delegate.clone();
        self.delegate = Some(Rc::downgrade(&delegate));
    }

    /// Registers a factory building cell content from the page size.
    pub fn register_cell_type(&mut self, identifier: &str, factory: impl Fn(Size) -> T + 'static) {
        self.cells.register_type(identifier, factory);
    }

    /// Registers a prototype that is cloned for every new cell.
    pub fn register_cell_template(&mut self, identifier: &str, template: T)
    where
        T: Clone,
    {
        self.cells.register_template(identifier, template);
    }

    /// Drops pooled cells for `identifier`. Attached cells go away when detached.
    pub fn evict_cells(&mut self, identifier: &str) {
        self.cells.evict(identifier);
    }

    /// Dequeues a cell outside of [`DataSource::cell_for_row`].
    ///
    /// # Panics
    ///
    /// Panics if nothing is registered for `identifier`.
    pub fn dequeue_cell(&mut self, identifier: &str) -> CellId {
        match self.try_dequeue_cell(identifier) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Dequeues a cell, reporting unregistered identifiers as errors.
    ///
    /// The cell is reserved until the end of the next [`tick`](Self::tick) (or the next
    /// row attach, whichever comes first). An unattached cell that is not pooled is then
    /// destroyed.
    pub fn try_dequeue_cell(&mut self, identifier: &str) -> Result<CellId, Error> {
        let size = self.layout.page_frame(self.bounds).size();
        self.cells.dequeue(identifier, size)
    }

    /// Shared access to a cell.
    #[must_use]
    pub fn cell(&self, id: CellId) -> Option<&Cell<T>> {
        self.cells.get(id)
    }

    /// Mutable access to a cell.
    pub fn cell_mut(&mut self, id: CellId) -> Option<&mut Cell<T>> {
        self.cells.get_mut(id)
    }

    fn collaborators(
        &self,
    ) -> (
        Option<Rc<RefCell<dyn DataSource<T>>>>,
        Option<Rc<RefCell<dyn Delegate<T>>>>,
    ) {
        (
            self.data_source.as_ref().and_then(Weak::upgrade),
            self.delegate.as_ref().and_then(Weak::upgrade),
        )
    }

    fn notify(&self, call: &str, f: impl FnOnce(&mut dyn Delegate<T>)) {
        let delegate = self.delegate.as_ref().and_then(Weak::upgrade);
        call_delegate(delegate.as_ref(), call, f);
    }

    fn geometry(&self) -> PageGeometry {
        PageGeometry {
            bounds: self.bounds,
            page_frame: self.layout.page_frame(self.bounds),
            spacing: self.options.spacing,
        }
    }

    /// Runs one layout pass.
    ///
    /// The wrapper offset is remapped and published first, then pages are reloaded,
    /// buffered, placed, handed over at wraparound and shown or hidden, and finally
    /// rows of displayed pages are refreshed. Running a pass with nothing changed
    /// fires no callbacks.
    pub fn tick(&mut self, reason: TickReason) {
        trace!(?reason, "layout pass");
        let geometry = self.geometry();
        let shift = self.wrapper.settle();
        if shift != 0.0 {
            if let Some(animation) = self.animation.as_mut() {
                animation.shift(Vec2::new(shift, 0.0));
            }
        }
        let (source, delegate) = self.collaborators();
        let mut env = Env::new(
            &mut self.cells,
            &mut self.selection,
            source,
            delegate,
            self.options.reusable,
        );
        self.pages.drain_row_inboxes();
        self.pages.layout(
            &mut env,
            &mut self.wrapper,
            geometry,
            self.options.infinite,
            shift,
        );
        self.pages.refresh_rows(&mut env);
        self.pages.clear_flags();
        self.cells.release_reservations();
    }

    /// Rebuilds every page from the data source and lays out immediately.
    ///
    /// Pages are torn down without display callbacks and the offset returns to the
    /// first page.
    pub fn reload_data(&mut self) {
        debug!("reload requested");
        let (source, delegate) = self.collaborators();
        let mut env = Env::new(
            &mut self.cells,
            &mut self.selection,
            source,
            delegate,
            self.options.reusable,
        );
        self.pages.reset(&mut env);
        self.tick(TickReason::Reload);
    }

    /// Schedules buffer and constraint maintenance for the next pass.
    pub fn invalidate_layout(&mut self) {
        self.pages.set_needs_layout();
    }

    /// Returns `true` if a reload is pending.
    #[must_use]
    pub fn needs_reload(&self) -> bool {
        self.pages.needs_reload()
    }

    /// Returns `true` if layout maintenance is pending.
    #[must_use]
    pub fn needs_layout(&self) -> bool {
        self.pages.needs_layout()
    }

    /// Size of the control.
    #[must_use]
    pub fn bounds(&self) -> Size {
        self.bounds
    }

    /// Resizes the control and lays out.
    pub fn set_bounds(&mut self, bounds: Size) {
        if self.bounds == bounds {
            return;
        }
        self.bounds = bounds;
        self.invalidate_layout();
        self.tick(TickReason::Resize);
    }

    /// Insets the page frame from the control edges.
    ///
    /// This only invalidates the layout; the new frame applies on the next
    /// [`tick`](Self::tick).
    pub fn set_content_inset(&mut self, insets: Insets) {
        self.layout = ContentLayout::Insets(insets);
        self.invalidate_layout();
    }

    /// Uses a fixed page width, centered in the control.
    ///
    /// This only invalidates the layout; the new width applies on the next
    /// [`tick`](Self::tick).
    pub fn set_content_width(&mut self, width: f64) {
        self.layout = ContentLayout::Width(width);
        self.invalidate_layout();
    }

    /// How pages are placed in the control.
    #[must_use]
    pub fn content_layout(&self) -> ContentLayout {
        self.layout
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> ViewOptions {
        self.options
    }

    /// Turns wraparound on or off. Reloads.
    pub fn set_infinite(&mut self, infinite: bool) {
        if self.options.infinite == infinite {
            return;
        }
        self.options.infinite = infinite;
        self.wrapper.set_infinite(infinite);
        self.reload_data();
    }

    /// Turns cell reuse and lazy page creation on or off. Reloads.
    pub fn set_reusable(&mut self, reusable: bool) {
        if self.options.reusable == reusable {
            return;
        }
        self.options.reusable = reusable;
        self.cells.set_reusable(reusable);
        self.reload_data();
    }

    /// Turns page snapping at the end of drags on or off.
    pub fn set_paging(&mut self, paging: bool) {
        self.options.paging = paging;
    }

    /// Accepts or ignores drag input.
    pub fn set_scroll_enabled(&mut self, enabled: bool) {
        self.options.scroll_enabled = enabled;
        if !enabled {
            self.dragging = false;
        }
    }

    /// Sets the gap between pages. Reloads.
    pub fn set_spacing(&mut self, spacing: f64) {
        self.options.spacing = spacing.max(0.0);
        self.reload_data();
    }

    /// Number of sections at the last reload.
    #[must_use]
    pub fn number_of_sections(&self) -> usize {
        self.pages.source().number_of_sections()
    }

    /// Number of items in `section` at the last reload.
    #[must_use]
    pub fn number_of_items(&self, section: usize) -> usize {
        self.pages.source().number_of_items(section)
    }

    /// Rectangle of the row at `path`, relative to its page.
    #[must_use]
    pub fn rect_for_row(&self, path: IndexPath) -> Option<Rect> {
        self.pages.source().rect_for_row(path)
    }

    /// Cell attached for the row at `path`, on whichever page currently shows it.
    #[must_use]
    pub fn cell_for_row(&self, path: IndexPath) -> Option<CellId> {
        self.pages.cell_for_row(path)
    }

    /// Visible content offset, horizontally reduced into one period of pages.
    #[must_use]
    pub fn content_offset(&self) -> Point {
        self.wrapper.visible_offset()
    }

    /// Width of one period of pages and the tallest page height.
    #[must_use]
    pub fn content_size(&self) -> Size {
        self.wrapper.content_size()
    }

    /// Observes every published offset change.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe_offset(&mut self, handler: impl Fn(&Point) + 'static) -> Subscription<Point> {
        self.wrapper.subscribe(handler)
    }

    fn apply_offset(&mut self, offset: Point, reason: TickReason) {
        self.wrapper.set_offset(offset);
        self.tick(reason);
        let offset = self.wrapper.visible_offset();
        self.notify("did_scroll", |d| d.did_scroll(offset));
    }

    fn end_animation(&self, kind: AnimationKind) {
        match kind {
            AnimationKind::Programmatic => {
                self.notify("did_end_scrolling_animation", |d| d.did_end_scrolling_animation());
            }
            AnimationKind::Deceleration => {
                self.notify("did_end_decelerating", |d| d.did_end_decelerating());
            }
        }
    }

    /// Moves the content to `offset`.
    ///
    /// Animated changes run over [`InfiniteView::advance_animation`]; a new request
    /// while animating re-targets the running animation.
    pub fn set_content_offset(&mut self, offset: Point, animated: bool) {
        let target = self.wrapper.clamp(offset);
        let current = self.wrapper.offset();
        if !animated {
            if let Some(animation) = self.animation.take() {
                self.end_animation(animation.kind());
            }
            if target != current {
                self.apply_offset(target, TickReason::Scroll);
            }
            return;
        }
        match self.animation.as_mut() {
            Some(animation) => {
                if animation.target() != target {
                    animation.retarget(current, target);
                }
            }
            None => {
                if target == current {
                    return;
                }
                self.notify("will_begin_scrolling_animation", |d| {
                    d.will_begin_scrolling_animation();
                });
                self.animation = Some(ScrollAnimation::new(
                    AnimationKind::Programmatic,
                    current,
                    target,
                ));
            }
        }
    }

    /// Scrolls to the page showing `path` (the copy nearest to the current position)
    /// with the row at the top.
    pub fn scroll_to_item(&mut self, path: IndexPath, animated: bool) -> Result<(), Error> {
        let offset = self
            .pages
            .offset_for_row(path)
            .ok_or(Error::IndexPathOutOfRange(path))?;
        self.set_content_offset(offset, animated);
        Ok(())
    }

    /// Returns `true` while an offset animation runs.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Advances the running animation by `elapsed` seconds.
    ///
    /// Returns `true` while the animation keeps running.
    pub fn advance_animation(&mut self, elapsed: f64) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };
        let (offset, done) = animation.advance(elapsed);
        let kind = animation.kind();
        if done {
            self.animation = None;
        }
        self.apply_offset(offset, TickReason::Animation);
        if done {
            self.end_animation(kind);
        }
        !done
    }

    /// Jumps the running animation to its end.
    pub fn finish_animation(&mut self) {
        if self.animation.is_some() {
            self.advance_animation(f64::INFINITY);
        }
    }

    /// Starts a drag. Ignored while scrolling is disabled.
    pub fn begin_dragging(&mut self) {
        if !self.options.scroll_enabled || self.dragging {
            return;
        }
        if let Some(animation) = self.animation.take() {
            self.end_animation(animation.kind());
        }
        self.dragging = true;
        self.notify("will_begin_dragging", |d| d.will_begin_dragging());
    }

    /// Moves the content offset by `delta` during a drag.
    pub fn drag_by(&mut self, delta: Vec2) {
        if !self.dragging {
            return;
        }
        let current = self.wrapper.offset();
        let target = self.wrapper.clamp(current + delta);
        if target != current {
            self.apply_offset(target, TickReason::Scroll);
        }
    }

    /// Ends a drag released with `velocity` (offset units per second).
    ///
    /// With paging on, the target snaps to a page boundary in the direction of travel.
    /// If the delegate or paging moves the target away from the current offset, a
    /// deceleration animation follows.
    pub fn end_dragging(&mut self, velocity: Vec2) {
        if !self.dragging {
            return;
        }
        self.dragging = false;
        let current = self.wrapper.offset();
        let mut target = if self.options.paging {
            self.snap_to_page(current, velocity)
        } else {
            current
        };
        self.notify("will_end_dragging", |d| d.will_end_dragging(velocity, &mut target));
        let target = self.wrapper.clamp(target);
        let decelerate = target != current;
        self.notify("did_end_dragging", |d| d.did_end_dragging(decelerate));
        if decelerate {
            self.notify("will_begin_decelerating", |d| d.will_begin_decelerating());
            self.animation = Some(ScrollAnimation::new(
                AnimationKind::Deceleration,
                current,
                target,
            ));
        }
    }

    fn snap_to_page(&self, offset: Point, velocity: Vec2) -> Point {
        let stride = self.geometry().stride();
        if stride <= 0.0 {
            return offset;
        }
        let pages = offset.x / stride;
        let snapped = if velocity.x > 0.0 {
            ceil(pages)
        } else if velocity.x < 0.0 {
            floor(pages)
        } else {
            round(pages)
        };
        Point::new(snapped * stride, offset.y)
    }

    /// Row under `point` (control space), among displayed rows.
    #[must_use]
    pub fn index_path_at(&self, point: Point) -> Option<IndexPath> {
        self.pages.index_path_at(point)
    }

    /// Selects the row under `point`, as a tap would. Returns the selected path.
    pub fn select_row_at(&mut self, point: Point) -> Option<IndexPath> {
        let (source, delegate) = self.collaborators();
        let mut env = Env::new(
            &mut self.cells,
            &mut self.selection,
            source,
            delegate,
            self.options.reusable,
        );
        self.pages.select_row_at(&mut env, point)
    }

    /// Removes `path` from the selection. Unselected paths are left alone.
    pub fn deselect_row(&mut self, path: IndexPath) {
        if !self.selection.remove(&path) {
            return;
        }
        if let Some(cell) = self
            .pages
            .cell_for_row(path)
            .and_then(|id| self.cells.get_mut(id))
        {
            cell.set_selected(false);
        }
    }

    /// Selected paths, in order.
    #[must_use]
    pub fn selected_rows(&self) -> Vec<IndexPath> {
        let mut rows: Vec<IndexPath> = self.selection.iter().copied().collect();
        rows.sort_unstable();
        rows
    }

    /// Cells of every displayed row, pages left to right.
    #[must_use]
    pub fn visible_cells(&self) -> Vec<CellId> {
        self.pages.visible_cells()
    }

    /// The cell at the middle of the page under the middle of the control.
    #[must_use]
    pub fn visible_center_cell(&self) -> Option<CellId> {
        self.pages
            .visible_center_page()?
            .row_scroller()?
            .visible_center_cell()
    }

    /// Pages intersecting the control, left to right.
    #[must_use]
    pub fn visible_pages(&self) -> Vec<VisiblePage> {
        let source = self.pages.source();
        self.pages
            .visible_pages()
            .filter_map(|page| {
                Some(VisiblePage {
                    item_path: source.item_path(page.reference())?,
                    frame: self.pages.to_control(page.frame()),
                    kind: page.id().kind(),
                    has_content: page.has_row_scroller(),
                })
            })
            .collect()
    }

    /// Gaps between pages intersecting the control, in control space.
    #[must_use]
    pub fn separator_rects(&self) -> Vec<Rect> {
        let control = Rect::from_origin_size(Point::ZERO, self.bounds);
        self.pages
            .source()
            .separators()
            .iter()
            .map(|&rect| self.pages.to_control(rect))
            .filter(|&rect| intersects(rect, control))
            .collect()
    }
}
