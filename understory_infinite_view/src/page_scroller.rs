// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The horizontal page scroller: page placement, buffering, wraparound transfers and
//! page visibility.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell as Slot;

use kurbo::{Point, Rect, Size, Vec2};
use tracing::{debug, trace};

use crate::observe::Subscription;
use crate::page::{Page, PageId};
use crate::page_source::PageSource;
use crate::source::Env;
use crate::util::{ceil_count, contains};
use crate::wrapper::Wrapper;
use crate::{CellContent, CellId, IndexPath};

/// Control geometry for one layout pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct PageGeometry {
    /// Size of the whole control.
    pub(crate) bounds: Size,
    /// Region of the control a page occupies when it is centered.
    pub(crate) page_frame: Rect,
    pub(crate) spacing: f64,
}

impl PageGeometry {
    pub(crate) fn page_size(&self) -> Size {
        self.page_frame.size()
    }

    /// Distance between the leading edges of adjacent pages.
    pub(crate) fn stride(&self) -> f64 {
        self.page_frame.width() + self.spacing
    }
}

/// Buffer pages needed on each side so that both ends can be covered at once.
///
/// Zero in finite mode and for degenerate page widths.
pub(crate) fn needed_buffer_count(geometry: &PageGeometry, infinite: bool) -> usize {
    let width = geometry.page_frame.width();
    let visible = geometry.bounds.width;
    if !infinite || width <= 0.0 || visible <= 0.0 {
        return 0;
    }
    let stride = geometry.stride();
    let x0 = geometry.page_frame.x0;
    ceil_count((visible - width) / width)
        .max(ceil_count(x0 / stride))
        .max(ceil_count((visible - x0) / stride))
}

#[allow(clippy::cast_precision_loss, reason = "page counts are far below 2^52")]
fn count_width(count: usize, stride: f64) -> f64 {
    count as f64 * stride
}

/// Owns the pages and coordinates them on every layout pass.
///
/// The scroller follows the wrapper through a subscription; its own offset is the
/// wrapper offset shifted right by the width of the left buffer.
#[derive(Debug)]
pub(crate) struct PageScroller {
    source: PageSource,
    /// Latest wrapper offset received.
    offset: Point,
    inbox: Rc<Slot<Option<Point>>>,
    _subscription: Subscription<Point>,
    needs_reload: bool,
    needs_layout: bool,
    geometry: Option<PageGeometry>,
    content_width: f64,
}

impl PageScroller {
    pub(crate) fn new(wrapper: &mut Wrapper) -> Self {
        let inbox = Rc::new(Slot::new(None));
        let subscription = {
            let inbox = inbox.clone();
            wrapper.subscribe(move |offset| inbox.set(Some(*offset)))
        };
        Self {
            source: PageSource::default(),
            offset: wrapper.offset(),
            inbox,
            _subscription: subscription,
            needs_reload: true,
            needs_layout: false,
            geometry: None,
            content_width: 0.0,
        }
    }

    pub(crate) fn source(&self) -> &PageSource {
        &self.source
    }

    pub(crate) fn set_needs_reload(&mut self) {
        self.needs_reload = true;
    }

    pub(crate) fn set_needs_layout(&mut self) {
        self.needs_layout = true;
    }

    pub(crate) fn needs_reload(&self) -> bool {
        self.needs_reload
    }

    pub(crate) fn needs_layout(&self) -> bool {
        self.needs_layout
    }

    pub(crate) fn clear_flags(&mut self) {
        self.needs_reload = false;
        self.needs_layout = false;
    }

    fn stride(&self) -> f64 {
        self.geometry.map_or(0.0, |g| g.stride())
    }

    /// Horizontal offset in page space.
    pub(crate) fn inner_x(&self) -> f64 {
        self.offset.x + count_width(self.source.left_len(), self.stride())
    }

    /// Tears every page down without callbacks and schedules a reload.
    pub(crate) fn reset<T>(&mut self, env: &mut Env<'_, T>) {
        self.source.teardown(env);
        self.needs_reload = true;
    }

    fn sync_offset(&mut self) {
        if let Some(offset) = self.inbox.take() {
            self.offset = offset;
        }
    }

    /// Step two of a pass: every row scroller takes its latest offset.
    pub(crate) fn drain_row_inboxes(&mut self) {
        for id in self.source.page_ids() {
            if let Some(scroller) = self
                .source
                .page_mut(id)
                .and_then(Page::row_scroller_mut)
            {
                scroller.drain_inbox();
            }
        }
    }

    /// The page pass.
    ///
    /// `shift` is the horizontal remap the wrapper applied in this pass; a non-zero
    /// shift means the user crossed into a buffer region and row scrollers are handed
    /// to the pages that now show the same content.
    pub(crate) fn layout<T: CellContent>(
        &mut self,
        env: &mut Env<'_, T>,
        wrapper: &mut Wrapper,
        geometry: PageGeometry,
        infinite: bool,
        shift: f64,
    ) {
        let reloading = self.needs_reload;
        let previous = self.geometry;
        let before_width = self.content_width;
        let old_stride = self.stride();
        self.sync_offset();
        let before_inner_x = self.inner_x();

        wrapper.set_geometry(geometry.bounds, geometry.page_frame);
        if reloading {
            let buffers = needed_buffer_count(&geometry, infinite);
            self.source
                .reload(env, geometry.page_size(), buffers, geometry.spacing);
            if !env.reusable {
                for index in 0..self.source.main_len() {
                    self.source
                        .configure_page(env, wrapper, PageId::Main(index), true);
                }
            }
        } else if previous.is_some_and(|p| p.page_size() != geometry.page_size()) {
            self.source.resize(env, geometry.page_size());
        }
        wrapper.set_content_height(self.source.content_height());
        self.geometry = Some(geometry);

        if self.source.main_len() == 0 {
            self.content_width = 0.0;
            wrapper.set_content(0.0, 0.0, 0.0);
            return;
        }

        let (mut added_left, mut added_right) = (0, 0);
        if infinite && (previous != Some(geometry) || self.needs_layout) {
            let needed = needed_buffer_count(&geometry, infinite);
            added_left = self.source.grow_left_buffer(needed);
            added_right = self.source.grow_right_buffer(needed);
            if added_left + added_right > 0 {
                self.source.rebuild_around_constraints();
            }
        }

        let width = self.source.solve();
        if reloading || width != before_width {
            let stride = geometry.stride();
            let x = if !reloading && before_width > 0.0 {
                let ratio = (width - count_width(added_left + added_right, stride)) / before_width;
                (before_inner_x + count_width(added_left, old_stride)) * ratio
                    - count_width(self.source.left_len(), stride)
            } else {
                0.0
            };
            self.content_width = width;
            self.recenter(env, wrapper, x);
        } else if !reloading && infinite && shift != 0.0 {
            self.follow_shift(shift);
        }

        let visible = self.visible_rect();
        self.move_displayed(env, visible);
        debug_assert!(self.holders_are_unique(), "a page and its twin both hold rows");
        self.change_display_status(env, wrapper, visible);
    }

    /// Points the wrapper at the real content and moves it to `x`.
    fn recenter<T>(&mut self, env: &mut Env<'_, T>, wrapper: &mut Wrapper, x: f64) {
        let stride = self.stride();
        wrapper.set_content(
            count_width(self.source.main_len(), stride),
            count_width(self.source.left_len(), stride),
            count_width(self.source.right_len(), stride),
        );
        let offset = wrapper.clamp(wrapper.remap(Point::new(x, wrapper.offset().y)));
        debug!(
            content_width = self.content_width,
            x = offset.x,
            "recentered content"
        );
        wrapper.set_offset(offset);
        wrapper.publish();
        self.sync_offset();
        env.did_scroll(wrapper.visible_offset());
    }

    /// The offset was remapped by `shift`: every row scroller moves to the twin that now
    /// sits where its page was shown before the remap.
    fn follow_shift(&mut self, shift: f64) {
        trace!(shift, "crossed an edge");
        let tolerance = self.stride() / 2.0;
        let holders: Vec<(PageId, usize, f64)> = self
            .source
            .pages()
            .filter(|page| page.has_row_scroller())
            .map(|page| (page.id(), page.reference(), page.frame().x0 + shift))
            .collect();
        for (from, main, x) in holders {
            let to = self.source.twins(main).into_iter().find(|&id| {
                self.source.page(id).is_some_and(|page| {
                    let d = page.frame().x0 - x;
                    d < tolerance && -d < tolerance
                })
            });
            if let Some(to) = to.filter(|&to| to != from) {
                if self.source.transfer(from, to) {
                    trace!(?from, ?to, "followed remap");
                }
            }
        }
    }

    /// Visible rectangle in page space.
    pub(crate) fn visible_rect(&self) -> Rect {
        let Some(geometry) = self.geometry else {
            return Rect::ZERO;
        };
        let x = self.inner_x() - geometry.page_frame.x0;
        let y = -geometry.page_frame.y0;
        Rect::new(
            x,
            y,
            x + geometry.bounds.width,
            y + geometry.bounds.height,
        )
    }

    /// The visible twin of main page `main` that belongs in the page frame.
    ///
    /// That is the twin containing the frame's center, or else the nearest one; ties
    /// go to the main page.
    fn preferred_twin(&self, main: usize, visible: Rect) -> Option<PageId> {
        let geometry = self.geometry?;
        let center = self.inner_x() + geometry.page_frame.width() / 2.0;
        let distance = |frame: Rect| {
            if frame.x0 <= center && center < frame.x1 {
                return 0.0;
            }
            let x = frame.center().x;
            if x > center { x - center } else { center - x }
        };
        self.source
            .twins(main)
            .into_iter()
            .filter_map(|id| self.source.page(id))
            .filter(|page| page.is_visible(visible))
            .min_by(|a, b| distance(a.frame()).total_cmp(&distance(b.frame())))
            .map(Page::id)
    }

    /// Hands every item's row scroller to its preferred visible twin.
    ///
    /// A holder that is itself still visible ends its display first. In reusable mode it
    /// is torn down instead of moved, and the begin pass configures the preferred twin.
    fn move_displayed<T>(&mut self, env: &mut Env<'_, T>, visible: Rect) {
        for main in 0..self.source.main_len() {
            let Some(target) = self.preferred_twin(main, visible) else {
                continue;
            };
            let Some(holder) = self.source.holder(main).filter(|&h| h != target) else {
                continue;
            };
            let Some(page) = self.source.page_mut(holder) else {
                continue;
            };
            if page.is_visible(visible) {
                if let Some(scroller) = page.row_scroller_mut() {
                    if scroller.is_shown() {
                        trace!(id = ?holder, path = %scroller.item_path(), "off-center twin did end displaying");
                        scroller.did_end_displaying(env, true);
                        scroller.set_shown(false);
                    }
                }
                if env.reusable {
                    if let Some(mut scroller) = page.take_row_scroller() {
                        scroller.teardown(env);
                    }
                    continue;
                }
            }
            if self.source.transfer(holder, target) {
                trace!(from = ?holder, to = ?target, "moved row scroller");
            }
        }
    }

    /// Ends display of pages that left `visible`, then displays the pages inside it.
    fn change_display_status<T: CellContent>(
        &mut self,
        env: &mut Env<'_, T>,
        wrapper: &mut Wrapper,
        visible: Rect,
    ) {
        let ids = self.source.page_ids();
        for &id in &ids {
            let Some(page) = self.source.page_mut(id) else {
                continue;
            };
            if page.is_visible(visible) {
                continue;
            }
            if let Some(scroller) = page.row_scroller_mut() {
                if scroller.is_shown() {
                    trace!(?id, path = %scroller.item_path(), "page did end displaying");
                    scroller.did_end_displaying(env, true);
                    scroller.set_shown(false);
                }
            }
            if env.reusable {
                if let Some(mut scroller) = page.take_row_scroller() {
                    scroller.teardown(env);
                }
            }
        }

        for &id in &ids {
            let Some(page) = self.source.page(id) else {
                continue;
            };
            if !page.is_visible(visible) {
                continue;
            }
            if !page.has_row_scroller()
                && env.reusable
                && self.source.holder(page.reference()).is_none()
                && self.preferred_twin(page.reference(), visible) == Some(id)
            {
                self.source.configure_page(env, wrapper, id, false);
            }
            if let Some(scroller) = self
                .source
                .page_mut(id)
                .and_then(Page::row_scroller_mut)
            {
                if !scroller.is_shown() {
                    trace!(?id, path = %scroller.item_path(), "page will display");
                    scroller.will_display(env);
                    scroller.set_shown(true);
                }
            }
        }
    }

    /// The row pass: displayed pages whose offset or rows changed re-evaluate their rows,
    /// every end before any begin.
    pub(crate) fn refresh_rows<T: CellContent>(&mut self, env: &mut Env<'_, T>) {
        let ids: Vec<PageId> = self
            .source
            .page_ids()
            .into_iter()
            .filter(|&id| {
                self.source
                    .page(id)
                    .and_then(Page::row_scroller)
                    .is_some_and(|s| s.is_dirty() && s.is_shown())
            })
            .collect();
        for &id in &ids {
            if let Some(scroller) = self.source.page_mut(id).and_then(Page::row_scroller_mut) {
                scroller.did_end_displaying(env, false);
            }
        }
        for &id in &ids {
            if let Some(scroller) = self.source.page_mut(id).and_then(Page::row_scroller_mut) {
                if env.reusable {
                    scroller.configure(env, false);
                }
                scroller.will_display(env);
            }
        }
        for id in self.source.page_ids() {
            if let Some(scroller) = self.source.page_mut(id).and_then(Page::row_scroller_mut) {
                scroller.clear_dirty();
            }
        }
    }

    /// At most one page of every twin set holds a row scroller.
    pub(crate) fn holders_are_unique(&self) -> bool {
        (0..self.source.main_len()).all(|main| {
            self.source
                .twins(main)
                .into_iter()
                .filter(|&id| self.source.page(id).is_some_and(Page::has_row_scroller))
                .count()
                <= 1
        })
    }

    /// Maps a page-space frame into control space.
    pub(crate) fn to_control(&self, frame: Rect) -> Rect {
        let Some(geometry) = self.geometry else {
            return frame;
        };
        let delta = Vec2::new(
            geometry.page_frame.x0 - self.inner_x(),
            geometry.page_frame.y0,
        );
        frame + delta
    }

    /// Visible pages, left to right.
    pub(crate) fn visible_pages(&self) -> impl Iterator<Item = &Page> {
        let visible = self.visible_rect();
        self.source.pages().filter(move |page| page.is_visible(visible))
    }

    fn page_at(&self, point: Point) -> Option<&Page> {
        self.visible_pages().find(|page| {
            let frame = self.to_control(page.frame());
            contains(frame, point.x, point.y)
        })
    }

    /// Row under `point` (control space), among displayed rows.
    pub(crate) fn index_path_at(&self, point: Point) -> Option<IndexPath> {
        let page = self.page_at(point)?;
        let scroller = page.row_scroller()?;
        let frame = self.to_control(page.frame());
        let local = Point::new(point.x - frame.x0, point.y - frame.y0 + scroller.offset_y());
        scroller.index_path_at(local)
    }

    /// Selects the row under `point` (control space). Returns its path.
    pub(crate) fn select_row_at<T>(&mut self, env: &mut Env<'_, T>, point: Point) -> Option<IndexPath> {
        let path = self.index_path_at(point)?;
        let id = self.page_at(point)?.id();
        let scroller = self.source.page_mut(id)?.row_scroller_mut()?;
        scroller.select(env, path);
        Some(path)
    }

    /// The attached cell for `path`, wherever its row scroller currently lives.
    pub(crate) fn cell_for_row(&self, path: IndexPath) -> Option<CellId> {
        let item_path = path.item_path();
        self.source
            .pages()
            .filter_map(Page::row_scroller)
            .find(|scroller| scroller.item_path() == item_path)
            .and_then(|scroller| scroller.cell_for_row(path))
    }

    /// Cells of every displayed row, pages left to right.
    pub(crate) fn visible_cells(&self) -> Vec<CellId> {
        self.visible_pages()
            .filter_map(Page::row_scroller)
            .filter(|scroller| scroller.is_shown())
            .flat_map(|scroller| scroller.visible_cells())
            .collect()
    }

    /// The page under the middle of the control.
    pub(crate) fn visible_center_page(&self) -> Option<&Page> {
        let geometry = self.geometry?;
        let center = Point::new(geometry.bounds.width / 2.0, geometry.bounds.height / 2.0);
        self.page_at(center)
    }

    /// Wrapper offset that brings the twin of `path`'s page nearest to the current
    /// position into the page frame, scrolled to the row's top.
    pub(crate) fn offset_for_row(&self, path: IndexPath) -> Option<Point> {
        let main = self.source.item_index(path)?;
        let row = self.source.rect_for_row(path)?;
        let inner_x = self.inner_x();
        let distance = |x: f64| if x > inner_x { x - inner_x } else { inner_x - x };
        let nearest = self
            .source
            .twins(main)
            .into_iter()
            .filter_map(|id| self.source.page(id))
            .map(|page| page.frame().x0)
            .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))?;
        let leading = count_width(self.source.left_len(), self.stride());
        Some(Point::new(nearest - leading, row.y0))
    }
}

#[cfg(test)]
mod tests {
    use kurbo::{Rect, Size};

    use super::{PageGeometry, needed_buffer_count};

    fn geometry(bounds_width: f64, page_frame: Rect, spacing: f64) -> PageGeometry {
        PageGeometry {
            bounds: Size::new(bounds_width, page_frame.height()),
            page_frame,
            spacing,
        }
    }

    #[test]
    fn control_three_pages_wide_needs_two_buffers() {
        let g = geometry(300.0, Rect::new(100.0, 0.0, 200.0, 100.0), 0.0);
        assert_eq!(needed_buffer_count(&g, true), 2);
        assert_eq!(needed_buffer_count(&g, false), 0);
    }

    #[test]
    fn full_width_pages_need_one_buffer() {
        let g = geometry(100.0, Rect::new(0.0, 0.0, 100.0, 100.0), 0.0);
        assert_eq!(needed_buffer_count(&g, true), 1);
    }

    #[test]
    fn off_center_frames_cover_the_wider_side() {
        let g = geometry(300.0, Rect::new(20.0, 0.0, 120.0, 100.0), 10.0);
        // (300 - 100) / 100 = 2, 20 / 110 -> 1, 280 / 110 -> 3.
        assert_eq!(needed_buffer_count(&g, true), 3);
    }

    #[test]
    fn degenerate_pages_need_no_buffers() {
        let g = geometry(300.0, Rect::new(150.0, 0.0, 150.0, 100.0), 0.0);
        assert_eq!(needed_buffer_count(&g, true), 0);
        let g = geometry(0.0, Rect::ZERO, 0.0);
        assert_eq!(needed_buffer_count(&g, true), 0);
    }
}
