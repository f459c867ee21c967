// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Page containers: one horizontal page, owning at most one row scroller.

use alloc::rc::Rc;

use kurbo::{Rect, Size};

use crate::extent::RowExtents;
use crate::row_scroller::RowScroller;
use crate::util::intersects;
use crate::wrapper::Wrapper;
use crate::IndexPath;

/// Where a page sits in the horizontal strip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageKind {
    /// One page per data-source item, in data order.
    Main,
    /// A duplicate left of the first main page.
    LeftBuffer,
    /// A duplicate right of the last main page.
    RightBuffer,
}

/// Position of a page in its collection.
///
/// Buffer indices count outward from the main pages: `Left(0)` sits directly left of
/// the first main page and `Right(0)` directly right of the last one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum PageId {
    Main(usize),
    Left(usize),
    Right(usize),
}

impl PageId {
    pub(crate) fn kind(self) -> PageKind {
        match self {
            Self::Main(_) => PageKind::Main,
            Self::Left(_) => PageKind::LeftBuffer,
            Self::Right(_) => PageKind::RightBuffer,
        }
    }
}

/// One page container.
#[derive(Debug)]
pub(crate) struct Page {
    id: PageId,
    /// Main page index this page mirrors (its own index for main pages).
    reference: usize,
    frame: Rect,
    scroller: Option<RowScroller>,
}

impl Page {
    pub(crate) fn main(index: usize) -> Self {
        Self {
            id: PageId::Main(index),
            reference: index,
            frame: Rect::ZERO,
            scroller: None,
        }
    }

    pub(crate) fn buffer(id: PageId, reference: usize) -> Self {
        Self {
            id,
            reference,
            frame: Rect::ZERO,
            scroller: None,
        }
    }

    pub(crate) fn id(&self) -> PageId {
        self.id
    }

    pub(crate) fn reference(&self) -> usize {
        self.reference
    }

    pub(crate) fn frame(&self) -> Rect {
        self.frame
    }

    pub(crate) fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }

    pub(crate) fn is_visible(&self, rect: Rect) -> bool {
        intersects(self.frame, rect)
    }

    pub(crate) fn row_scroller(&self) -> Option<&RowScroller> {
        self.scroller.as_ref()
    }

    pub(crate) fn row_scroller_mut(&mut self) -> Option<&mut RowScroller> {
        self.scroller.as_mut()
    }

    pub(crate) fn has_row_scroller(&self) -> bool {
        self.scroller.is_some()
    }

    pub(crate) fn take_row_scroller(&mut self) -> Option<RowScroller> {
        self.scroller.take()
    }

    /// Installs a fresh row scroller for `item_path`, returning the one it replaces.
    ///
    /// The replaced scroller still has its cells attached; callers tear it down.
    #[must_use = "the replaced scroller's cells stay attached until it is torn down"]
    pub(crate) fn attach_row_scroller(
        &mut self,
        item_path: IndexPath,
        size: Size,
        rows: Rc<RowExtents>,
        wrapper: &mut Wrapper,
    ) -> Option<RowScroller> {
        self.scroller
            .replace(RowScroller::new(item_path, size, rows, wrapper))
    }

    /// Moves `other`'s row scroller into this page.
    ///
    /// Nothing happens when `other` has none or this page already holds one, so a
    /// scroller is never duplicated nor dropped. Returns `true` if it moved.
    pub(crate) fn move_row_scroller_from(&mut self, other: &mut Self) -> bool {
        if self.scroller.is_some() {
            return false;
        }
        match other.scroller.take() {
            Some(scroller) => {
                self.scroller = Some(scroller);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;

    use kurbo::{Rect, Size};

    use super::{Page, PageId};
    use crate::extent::RowExtents;
    use crate::wrapper::Wrapper;
    use crate::IndexPath;

    fn attach(page: &mut Page, wrapper: &mut Wrapper) {
        let path = IndexPath::for_item(0, page.reference());
        let rows = Rc::new(RowExtents::from_heights([10.0]));
        let replaced = page.attach_row_scroller(path, Size::new(10.0, 10.0), rows, wrapper);
        assert!(replaced.is_none());
    }

    #[test]
    fn move_transfers_ownership_exactly_once() {
        let mut wrapper = Wrapper::new(true);
        let mut main = Page::main(0);
        let mut buffer = Page::buffer(PageId::Right(0), 0);
        attach(&mut main, &mut wrapper);

        assert!(buffer.move_row_scroller_from(&mut main));
        assert!(buffer.has_row_scroller());
        assert!(!main.has_row_scroller());

        // Moving from an empty page is a no-op.
        assert!(!buffer.move_row_scroller_from(&mut main));
        assert!(buffer.has_row_scroller());
        assert_eq!(wrapper.subscriber_count(), 1);
    }

    #[test]
    fn occupied_target_refuses_a_second_scroller() {
        let mut wrapper = Wrapper::new(true);
        let mut main = Page::main(1);
        let mut buffer = Page::buffer(PageId::Left(0), 1);
        attach(&mut main, &mut wrapper);
        attach(&mut buffer, &mut wrapper);

        assert!(!main.move_row_scroller_from(&mut buffer));
        assert!(main.has_row_scroller() && buffer.has_row_scroller());
    }

    #[test]
    fn visibility_is_strict_frame_overlap() {
        let mut page = Page::main(0);
        page.set_frame(Rect::new(100.0, 0.0, 200.0, 50.0));
        assert!(page.is_visible(Rect::new(150.0, 0.0, 400.0, 50.0)));
        assert!(!page.is_visible(Rect::new(200.0, 0.0, 400.0, 50.0)));
        assert_eq!(page.id().kind(), super::PageKind::Main);
    }
}
