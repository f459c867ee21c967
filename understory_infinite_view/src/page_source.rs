// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page data and layout: counts, row tables, page containers and their constraints.

use alloc::rc::Rc;
use alloc::vec::Vec;

use kurbo::{Rect, Size};
use smallvec::SmallVec;
use tracing::debug;

use crate::constraints::{ConstraintGroup, ConstraintSet, Gap, Pin};
use crate::extent::RowExtents;
use crate::page::{Page, PageId};
use crate::source::Env;
use crate::wrapper::Wrapper;
use crate::{CellContent, IndexPath};

/// The pages of the control and everything derived from the data source.
///
/// Main pages follow data order. Buffer pages are stored nearest-first, so growing a
/// buffer appends to the outer edge: `Left(j)` mirrors main page `N - 1 - (j mod N)`
/// and `Right(j)` mirrors main page `j mod N`.
#[derive(Debug, Default)]
pub(crate) struct PageSource {
    items_per_section: Vec<usize>,
    item_paths: Vec<IndexPath>,
    rows: Vec<Rc<RowExtents>>,
    content_height: f64,
    page_size: Size,
    spacing: f64,
    main: Vec<Page>,
    left: Vec<Page>,
    right: Vec<Page>,
    constraints: ConstraintSet,
    separators: Vec<Rect>,
}

impl PageSource {
    /// Rebuilds every page from the data source.
    ///
    /// Existing row scrollers are torn down without display callbacks.
    pub(crate) fn reload<T>(
        &mut self,
        env: &mut Env<'_, T>,
        page_size: Size,
        buffer_count: usize,
        spacing: f64,
    ) {
        self.teardown(env);
        self.page_size = page_size;
        self.spacing = spacing;

        let sections = env.number_of_sections();
        self.items_per_section = (0..sections).map(|s| env.number_of_items(s)).collect();
        self.item_paths = self
            .items_per_section
            .iter()
            .enumerate()
            .flat_map(|(section, &items)| (0..items).map(move |item| IndexPath::for_item(section, item)))
            .collect();
        self.measure(env);

        self.main = (0..self.item_paths.len()).map(Page::main).collect();
        self.left.clear();
        self.right.clear();
        self.constraints.clear();
        self.separators.clear();
        if self.main.is_empty() {
            debug!("reloaded without pages");
            return;
        }
        self.constraints.replace_main(ConstraintGroup::chain(
            (0..self.main.len()).map(PageId::Main),
            spacing,
        ));
        if buffer_count > 0 {
            self.grow_left_buffer(buffer_count);
            self.grow_right_buffer(buffer_count);
            self.rebuild_around_constraints();
        }
        debug!(
            pages = self.main.len(),
            buffers = buffer_count,
            content_height = self.content_height,
            "reloaded pages"
        );
    }

    /// Re-measures rows for a new page size and hands the new tables to live scrollers.
    pub(crate) fn resize<T>(&mut self, env: &mut Env<'_, T>, page_size: Size) {
        if self.page_size == page_size {
            return;
        }
        self.page_size = page_size;
        self.measure(env);
        let Self {
            rows, main, left, right, ..
        } = self;
        for page in main.iter_mut().chain(left.iter_mut()).chain(right.iter_mut()) {
            let Some(table) = rows.get(page.reference()).cloned() else {
                continue;
            };
            if let Some(scroller) = page.row_scroller_mut() {
                scroller.set_rows(env, table, page_size);
            }
        }
    }

    fn measure<T>(&mut self, env: &Env<'_, T>) {
        let height = self.page_size.height;
        self.rows = self
            .item_paths
            .iter()
            .map(|&item_path| {
                let count = env.number_of_rows(item_path);
                Rc::new(RowExtents::from_heights((0..count).map(|row| {
                    env.height_for_row(item_path.with_row(row))
                        .unwrap_or(height)
                })))
            })
            .collect();
        // Pages are top aligned; shorter pages leave empty space below their rows.
        self.content_height = self
            .rows
            .iter()
            .map(|rows| rows.total())
            .fold(0.0, f64::max);
    }

    /// Grows the left buffer to `count` pages. Returns how many were added.
    pub(crate) fn grow_left_buffer(&mut self, count: usize) -> usize {
        let n = self.main.len();
        if n == 0 || self.left.len() >= count {
            return 0;
        }
        let added = count - self.left.len();
        for j in self.left.len()..count {
            self.left.push(Page::buffer(PageId::Left(j), n - 1 - j % n));
        }
        debug!(added, total = count, "grew left buffer");
        added
    }

    /// Grows the right buffer to `count` pages. Returns how many were added.
    pub(crate) fn grow_right_buffer(&mut self, count: usize) -> usize {
        let n = self.main.len();
        if n == 0 || self.right.len() >= count {
            return 0;
        }
        let added = count - self.right.len();
        for j in self.right.len()..count {
            self.right.push(Page::buffer(PageId::Right(j), j % n));
        }
        debug!(added, total = count, "grew right buffer");
        added
    }

    /// Replaces the constraints that chain the buffers onto the main pages.
    pub(crate) fn rebuild_around_constraints(&mut self) {
        let n = self.main.len();
        let (l, r) = (self.left.len(), self.right.len());
        let mut group = ConstraintGroup::default();
        if n > 0 && (l > 0 || r > 0) {
            let gap = |leading, trailing| Gap {
                leading,
                trailing,
                width: self.spacing,
            };
            let first = if l > 0 { PageId::Left(l - 1) } else { PageId::Main(0) };
            group.leading.push(Pin {
                page: first,
                inset: 0.0,
            });
            for j in (1..l).rev() {
                group.between.push(gap(PageId::Left(j), PageId::Left(j - 1)));
            }
            if l > 0 {
                group.between.push(gap(PageId::Left(0), PageId::Main(0)));
            }
            if r > 0 {
                group.between.push(gap(PageId::Main(n - 1), PageId::Right(0)));
            }
            for j in 1..r {
                group.between.push(gap(PageId::Right(j - 1), PageId::Right(j)));
            }
            let last = if r > 0 {
                PageId::Right(r - 1)
            } else {
                PageId::Main(n - 1)
            };
            group.trailing.push(Pin {
                page: last,
                inset: self.spacing,
            });
        }
        self.constraints.replace_around(group);
    }

    /// Places every page. Returns the content width of the whole strip.
    pub(crate) fn solve(&mut self) -> f64 {
        let solution = self.constraints.solve(self.page_size);
        for (id, frame) in solution.frames {
            if let Some(page) = self.page_mut(id) {
                page.set_frame(frame);
            }
        }
        self.separators = solution.separators;
        solution.content_width
    }

    /// Detaches the cells of every page without callbacks.
    pub(crate) fn teardown<T>(&mut self, env: &mut Env<'_, T>) {
        for page in self
            .main
            .iter_mut()
            .chain(self.left.iter_mut())
            .chain(self.right.iter_mut())
        {
            if let Some(mut scroller) = page.take_row_scroller() {
                scroller.teardown(env);
            }
        }
    }

    /// Gives page `id` a fresh row scroller and attaches its cells.
    pub(crate) fn configure_page<T: CellContent>(
        &mut self,
        env: &mut Env<'_, T>,
        wrapper: &mut Wrapper,
        id: PageId,
        all: bool,
    ) {
        let size = self.page_size;
        let Some(main) = self.page(id).map(Page::reference) else {
            return;
        };
        let (Some(&item_path), Some(rows)) = (self.item_paths.get(main), self.rows.get(main).cloned())
        else {
            return;
        };
        let Some(page) = self.page_mut(id) else {
            return;
        };
        if let Some(mut replaced) = page.attach_row_scroller(item_path, size, rows, wrapper) {
            replaced.teardown(env);
        }
        if let Some(scroller) = page.row_scroller_mut() {
            scroller.configure(env, all);
        }
    }

    pub(crate) fn content_height(&self) -> f64 {
        self.content_height
    }

    pub(crate) fn main_len(&self) -> usize {
        self.main.len()
    }

    pub(crate) fn left_len(&self) -> usize {
        self.left.len()
    }

    pub(crate) fn right_len(&self) -> usize {
        self.right.len()
    }

    pub(crate) fn number_of_sections(&self) -> usize {
        self.items_per_section.len()
    }

    pub(crate) fn number_of_items(&self, section: usize) -> usize {
        self.items_per_section.get(section).copied().unwrap_or(0)
    }

    pub(crate) fn separators(&self) -> &[Rect] {
        &self.separators
    }

    pub(crate) fn page(&self, id: PageId) -> Option<&Page> {
        match id {
            PageId::Main(i) => self.main.get(i),
            PageId::Left(i) => self.left.get(i),
            PageId::Right(i) => self.right.get(i),
        }
    }

    pub(crate) fn page_mut(&mut self, id: PageId) -> Option<&mut Page> {
        match id {
            PageId::Main(i) => self.main.get_mut(i),
            PageId::Left(i) => self.left.get_mut(i),
            PageId::Right(i) => self.right.get_mut(i),
        }
    }

    /// Every page id, left to right.
    pub(crate) fn page_ids(&self) -> Vec<PageId> {
        (0..self.left.len())
            .rev()
            .map(PageId::Left)
            .chain((0..self.main.len()).map(PageId::Main))
            .chain((0..self.right.len()).map(PageId::Right))
            .collect()
    }

    /// Pages, left to right.
    pub(crate) fn pages(&self) -> impl Iterator<Item = &Page> {
        self.left
            .iter()
            .rev()
            .chain(&self.main)
            .chain(&self.right)
    }

    /// Main page index of the page showing `item_path`'s item.
    pub(crate) fn item_index(&self, path: IndexPath) -> Option<usize> {
        self.item_paths.binary_search(&path.item_path()).ok()
    }

    pub(crate) fn item_path(&self, main: usize) -> Option<IndexPath> {
        self.item_paths.get(main).copied()
    }

    /// Page-local rectangle of the row at `path`.
    pub(crate) fn rect_for_row(&self, path: IndexPath) -> Option<Rect> {
        let index = self.item_index(path)?;
        self.rows.get(index)?.rect(path.row(), self.page_size.width)
    }

    /// The main page `main` and every buffer page mirroring it.
    pub(crate) fn twins(&self, main: usize) -> SmallVec<[PageId; 4]> {
        let mut twins = SmallVec::new();
        if main < self.main.len() {
            twins.push(PageId::Main(main));
        }
        twins.extend(
            self.left
                .iter()
                .chain(&self.right)
                .filter(|page| page.reference() == main)
                .map(Page::id),
        );
        twins
    }

    /// The page among `main`'s twins that holds its row scroller.
    pub(crate) fn holder(&self, main: usize) -> Option<PageId> {
        self.twins(main)
            .into_iter()
            .find(|&id| self.page(id).is_some_and(Page::has_row_scroller))
    }

    /// Moves the row scroller of `from` into `to`, if `from` has one and `to` has none.
    pub(crate) fn transfer(&mut self, from: PageId, to: PageId) -> bool {
        match self.pair_mut(to, from) {
            Some((to, from)) => to.move_row_scroller_from(from),
            None => false,
        }
    }

    fn pair_mut(&mut self, a: PageId, b: PageId) -> Option<(&mut Page, &mut Page)> {
        fn split(pages: &mut [Page], i: usize, j: usize) -> Option<(&mut Page, &mut Page)> {
            if i == j || i.max(j) >= pages.len() {
                return None;
            }
            if i < j {
                let (lo, hi) = pages.split_at_mut(j);
                Some((&mut lo[i], &mut hi[0]))
            } else {
                let (lo, hi) = pages.split_at_mut(i);
                Some((&mut hi[0], &mut lo[j]))
            }
        }

        let Self {
            main, left, right, ..
        } = self;
        match (a, b) {
            (PageId::Main(i), PageId::Main(j)) => split(main, i, j),
            (PageId::Left(i), PageId::Left(j)) => split(left, i, j),
            (PageId::Right(i), PageId::Right(j)) => split(right, i, j),
            (PageId::Main(i), PageId::Left(j)) => Some((main.get_mut(i)?, left.get_mut(j)?)),
            (PageId::Main(i), PageId::Right(j)) => Some((main.get_mut(i)?, right.get_mut(j)?)),
            (PageId::Left(i), PageId::Main(j)) => Some((left.get_mut(i)?, main.get_mut(j)?)),
            (PageId::Left(i), PageId::Right(j)) => Some((left.get_mut(i)?, right.get_mut(j)?)),
            (PageId::Right(i), PageId::Main(j)) => Some((right.get_mut(i)?, main.get_mut(j)?)),
            (PageId::Right(i), PageId::Left(j)) => Some((right.get_mut(i)?, left.get_mut(j)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use hashbrown::HashSet;
    use kurbo::{Rect, Size};

    use super::PageSource;
    use crate::page::{Page, PageId};
    use crate::testing::{Grid, env, store};
    use crate::wrapper::Wrapper;
    use crate::IndexPath;

    const PAGE: Size = Size::new(100.0, 200.0);

    fn reloaded(grid: Grid, buffers: usize, spacing: f64) -> PageSource {
        let grid = grid.shared();
        let (mut cells, mut selection) = (store(true), HashSet::new());
        let mut env = env(&mut cells, &mut selection, &grid, true);
        let mut source = PageSource::default();
        source.reload(&mut env, PAGE, buffers, spacing);
        source
    }

    #[test]
    fn reload_counts_items_across_sections() {
        let mut grid = Grid::new(0, 2);
        grid.sections = alloc::vec![2, 0, 3];
        let source = reloaded(grid, 0, 0.0);
        assert_eq!(source.number_of_sections(), 3);
        assert_eq!(source.number_of_items(2), 3);
        assert_eq!(source.main_len(), 5);
        assert_eq!(source.item_index(IndexPath::new(2, 1, 1)), Some(3));
        assert_eq!(source.item_index(IndexPath::new(1, 0, 0)), None);
    }

    #[test]
    fn rows_default_to_page_height_and_pages_share_the_tallest_height() {
        let mut grid = Grid::new(2, 3);
        grid.row_height = Some(50.0);
        let source = reloaded(grid, 0, 0.0);
        assert_eq!(source.content_height(), 150.0);
        assert_eq!(
            source.rect_for_row(IndexPath::new(0, 1, 2)),
            Some(Rect::new(0.0, 100.0, 100.0, 150.0))
        );
        assert_eq!(source.rect_for_row(IndexPath::new(0, 1, 3)), None);

        let source = reloaded(Grid::new(2, 1), 0, 0.0);
        assert_eq!(source.content_height(), 200.0);
    }

    #[test]
    fn buffers_mirror_the_opposite_ends() {
        let source = reloaded(Grid::new(5, 1), 2, 0.0);
        assert_eq!(source.left_len(), 2);
        assert_eq!(source.right_len(), 2);
        let refs = |ids: &[PageId]| -> Vec<usize> {
            ids.iter()
                .map(|&id| source.page(id).map(Page::reference).unwrap())
                .collect()
        };
        assert_eq!(refs(&[PageId::Left(1), PageId::Left(0)]), [3, 4]);
        assert_eq!(refs(&[PageId::Right(0), PageId::Right(1)]), [0, 1]);
    }

    #[test]
    fn buffers_only_grow() {
        let mut source = reloaded(Grid::new(3, 1), 1, 0.0);
        assert_eq!(source.grow_left_buffer(1), 0);
        assert_eq!(source.grow_left_buffer(4), 3);
        assert_eq!(source.grow_left_buffer(2), 0);
        assert_eq!(source.left_len(), 4);
        // Wrapping references for more buffers than pages.
        assert_eq!(source.page(PageId::Left(3)).map(Page::reference), Some(2));
        assert_eq!(source.twins(2).len(), 3);
    }

    #[test]
    fn solved_frames_follow_the_chain_left_to_right() {
        let mut source = reloaded(Grid::new(3, 1), 1, 10.0);
        let width = source.solve();
        assert_eq!(width, 5.0 * 110.0);
        let xs: Vec<f64> = source.pages().map(|p| p.frame().x0).collect();
        assert_eq!(xs, [0.0, 110.0, 220.0, 330.0, 440.0]);
        assert_eq!(source.page_ids()[1], PageId::Main(0));
        assert_eq!(source.separators().len(), 5);
    }

    #[test]
    fn transfer_keeps_a_single_holder_per_twin_set() {
        let grid = Grid::new(3, 1).shared();
        let (mut cells, mut selection) = (store(true), HashSet::new());
        let mut env = env(&mut cells, &mut selection, &grid, true);
        let mut wrapper = Wrapper::new(true);
        let mut source = PageSource::default();
        source.reload(&mut env, PAGE, 1, 0.0);

        source.configure_page(&mut env, &mut wrapper, PageId::Main(0), false);
        assert_eq!(source.holder(0), Some(PageId::Main(0)));

        assert!(source.transfer(PageId::Main(0), PageId::Right(0)));
        assert_eq!(source.holder(0), Some(PageId::Right(0)));
        assert!(!source.page(PageId::Main(0)).unwrap().has_row_scroller());

        assert!(!source.transfer(PageId::Main(0), PageId::Right(0)));
        assert!(!source.transfer(PageId::Right(0), PageId::Right(0)));
        let holders = source
            .twins(0)
            .into_iter()
            .filter(|&id| source.page(id).unwrap().has_row_scroller())
            .count();
        assert_eq!(holders, 1);
    }
}
