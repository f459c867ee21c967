// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cells, their generational arena, and cell registration.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Rect, Size};
use smallvec::SmallVec;

use crate::reuse::ReusePool;
use crate::{Error, IndexPath};

/// Consumer content displayed by a [`Cell`].
pub trait CellContent: 'static {
    /// Called when a pooled cell is handed out again by a dequeue.
    fn prepare_for_reuse(&mut self) {}
}

/// Handle to a cell (generational).
///
/// Handles never keep a cell alive. Once the cell is destroyed the handle resolves
/// to nothing, even if its slot is reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct CellId(u32, u32);

impl CellId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Lifecycle state of a [`Cell`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct CellFlags: u8 {
        /// Attached to a row scroller at its row position.
        const ATTACHED  = 0b0000_0001;
        /// Inside the visible window and announced through `will_display`.
        const DISPLAYED = 0b0000_0010;
        /// Marked selected.
        const SELECTED  = 0b0000_0100;
        /// Tracked by the reuse pool.
        const POOLED    = 0b0000_1000;
        /// Handed out by a dequeue and not yet attached.
        const RESERVED  = 0b0001_0000;
    }
}

/// One row of one page.
#[derive(Debug)]
pub struct Cell<T> {
    index_path: IndexPath,
    reuse_identifier: Option<String>,
    frame: Rect,
    flags: CellFlags,
    content: T,
}

impl<T> Cell<T> {
    /// Path of the row this cell was last attached for.
    #[must_use]
    pub const fn index_path(&self) -> IndexPath {
        self.index_path
    }

    /// Reuse identifier the cell was dequeued with.
    #[must_use]
    pub fn reuse_identifier(&self) -> Option<&str> {
        self.reuse_identifier.as_deref()
    }

    /// Frame in the owning page's row space.
    #[must_use]
    pub const fn frame(&self) -> Rect {
        self.frame
    }

    /// Current lifecycle flags.
    #[must_use]
    pub const fn flags(&self) -> CellFlags {
        self.flags
    }

    /// Returns `true` while attached and announced as displayed.
    #[must_use]
    pub const fn is_displayed(&self) -> bool {
        self.flags.contains(CellFlags::DISPLAYED)
    }

    /// Returns `true` while attached to a page.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.flags.contains(CellFlags::ATTACHED)
    }

    /// Returns `true` if the cell is marked selected.
    #[must_use]
    pub const fn is_selected(&self) -> bool {
        self.flags.contains(CellFlags::SELECTED)
    }

    /// Marks the cell selected or not. This does not change the control's selection set.
    pub fn set_selected(&mut self, selected: bool) {
        self.flags.set(CellFlags::SELECTED, selected);
    }

    /// Shared access to the content.
    #[must_use]
    pub const fn content(&self) -> &T {
        &self.content
    }

    /// Mutable access to the content.
    pub fn content_mut(&mut self) -> &mut T {
        &mut self.content
    }

    pub(crate) fn set_displayed(&mut self, displayed: bool) {
        self.flags.set(CellFlags::DISPLAYED, displayed);
    }

    pub(crate) fn set_frame(&mut self, frame: Rect) {
        self.frame = frame;
    }
}

enum Registration<T> {
    Type(Box<dyn Fn(Size) -> T>),
    Template(Box<dyn Fn() -> T>),
}

impl<T> Registration<T> {
    fn instantiate(&self, size: Size) -> T {
        match self {
            Self::Type(factory) => factory(size),
            Self::Template(template) => template(),
        }
    }
}

impl<T> fmt::Debug for Registration<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(_) => f.write_str("Type"),
            Self::Template(_) => f.write_str("Template"),
        }
    }
}

/// Owner of every cell.
///
/// This plays the part of the view tree: attaching a cell marks it as part of a page,
/// and an unattached cell survives only while the reuse pool tracks it or a dequeue
/// has reserved it. Every other structure refers to cells through [`CellId`]s.
pub(crate) struct CellStore<T> {
    /// slots
    cells: Vec<Option<Cell<T>>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
    registry: HashMap<String, Registration<T>>,
    pool: ReusePool,
    reusable: bool,
    reserved: SmallVec<[CellId; 4]>,
}

impl<T> fmt::Debug for CellStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellStore")
            .field("cells_total", &self.cells.len())
            .field("cells_alive", &self.live_count())
            .field("free_list", &self.free_list.len())
            .field("registry", &self.registry)
            .field("reusable", &self.reusable)
            .finish_non_exhaustive()
    }
}

impl<T> CellStore<T> {
    pub(crate) fn new(reusable: bool) -> Self {
        Self {
            cells: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            registry: HashMap::new(),
            pool: ReusePool::default(),
            reusable,
            reserved: SmallVec::new(),
        }
    }

    pub(crate) fn register_type(&mut self, identifier: &str, factory: impl Fn(Size) -> T + 'static) {
        self.registry
            .insert(identifier.into(), Registration::Type(Box::new(factory)));
    }

    pub(crate) fn register_template(&mut self, identifier: &str, template: T)
    where
        T: Clone + 'static,
    {
        self.registry.insert(
            identifier.into(),
            Registration::Template(Box::new(move || template.clone())),
        );
    }

    pub(crate) fn get(&self, id: CellId) -> Option<&Cell<T>> {
        if self.generations.get(id.idx()) != Some(&id.1) {
            return None;
        }
        self.cells.get(id.idx())?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: CellId) -> Option<&mut Cell<T>> {
        if self.generations.get(id.idx()) != Some(&id.1) {
            return None;
        }
        self.cells.get_mut(id.idx())?.as_mut()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    #[cfg(test)]
    pub(crate) fn pooled_count(&self, identifier: &str) -> usize {
        self.pool.count(identifier)
    }

    /// Returns `true` if the pool may hand `id` out.
    fn is_available(&self, id: CellId) -> bool {
        self.get(id).is_some_and(|cell| {
            !cell
                .flags
                .intersects(CellFlags::ATTACHED | CellFlags::RESERVED)
        })
    }

    fn insert(&mut self, cell: Cell<T>) -> CellId {
        if let Some(idx) = self.free_list.pop() {
            self.cells[idx] = Some(cell);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "slot indices are created from u32 handles"
            )]
            return CellId::new(idx as u32, self.generations[idx]);
        }
        let idx = self.cells.len();
        self.cells.push(Some(cell));
        self.generations.push(0);
        #[allow(
            clippy::cast_possible_truncation,
            reason = "more than u32::MAX live cells is not a supported configuration"
        )]
        CellId::new(idx as u32, 0)
    }

    fn remove(&mut self, id: CellId) {
        if self.get(id).is_none() {
            return;
        }
        self.cells[id.idx()] = None;
        self.generations[id.idx()] = self.generations[id.idx()].wrapping_add(1);
        self.free_list.push(id.idx());
    }

    /// Destroys `id` unless something still owns it.
    fn collect(&mut self, id: CellId) {
        let orphaned = self.get(id).is_some_and(|cell| {
            !cell.flags.intersects(
                CellFlags::ATTACHED | CellFlags::POOLED | CellFlags::RESERVED,
            )
        });
        if orphaned {
            self.remove(id);
        }
    }

    /// Attaches a dequeued cell at `frame` for `path`.
    ///
    /// Returns `false` (and leaves the cell alone) if the handle is stale or the cell
    /// is already attached somewhere.
    pub(crate) fn attach(&mut self, id: CellId, path: IndexPath, frame: Rect, selected: bool) -> bool {
        let Some(cell) = self.get_mut(id) else {
            return false;
        };
        if cell.is_attached() {
            return false;
        }
        cell.index_path = path;
        cell.frame = frame;
        cell.flags.remove(CellFlags::RESERVED | CellFlags::DISPLAYED);
        cell.flags.insert(CellFlags::ATTACHED);
        cell.flags.set(CellFlags::SELECTED, selected);
        true
    }

    /// Detaches `id`; an unpooled cell is destroyed.
    pub(crate) fn detach(&mut self, id: CellId) {
        if let Some(cell) = self.get_mut(id) {
            cell.flags.remove(CellFlags::ATTACHED | CellFlags::DISPLAYED);
        }
        self.collect(id);
    }

    /// Ends every outstanding reservation, destroying cells nobody attached.
    pub(crate) fn release_reservations(&mut self) {
        let reserved = core::mem::take(&mut self.reserved);
        for id in reserved {
            if let Some(cell) = self.get_mut(id) {
                cell.flags.remove(CellFlags::RESERVED);
            }
            self.collect(id);
        }
    }

    /// Drops pooled cells for `identifier`; attached ones die on their next detach.
    pub(crate) fn evict(&mut self, identifier: &str) {
        let ids = self.pool.evict(identifier);
        self.unpool(ids);
    }

    pub(crate) fn set_reusable(&mut self, reusable: bool) {
        self.reusable = reusable;
        if !reusable {
            let ids = self.pool.evict_all();
            self.unpool(ids);
        }
    }

    fn unpool(&mut self, ids: Vec<CellId>) {
        for id in ids {
            if let Some(cell) = self.get_mut(id) {
                cell.flags.remove(CellFlags::POOLED);
            }
            self.collect(id);
        }
    }
}

impl<T: CellContent> CellStore<T> {
    /// Hands out a cell for `identifier`: a free pooled one in reusable mode, otherwise
    /// a new one from the registration. The cell stays reserved until attached or
    /// until [`CellStore::release_reservations`].
    pub(crate) fn dequeue(&mut self, identifier: &str, size: Size) -> Result<CellId, Error> {
        if self.reusable {
            if let Some(id) = self.pool.dequeue(identifier, |id| self.is_available(id)) {
                if let Some(cell) = self.get_mut(id) {
                    cell.reuse_identifier = Some(identifier.into());
                    cell.flags.insert(CellFlags::RESERVED);
                    cell.content.prepare_for_reuse();
                }
                self.reserved.push(id);
                return Ok(id);
            }
        }

        let registration = self
            .registry
            .get(identifier)
            .ok_or_else(|| Error::UnregisteredIdentifier(identifier.into()))?;
        let content = registration.instantiate(size);
        let mut flags = CellFlags::RESERVED;
        if self.reusable {
            flags |= CellFlags::POOLED;
        }
        let id = self.insert(Cell {
            index_path: IndexPath::default(),
            reuse_identifier: Some(identifier.into()),
            frame: Rect::from_origin_size((0.0, 0.0), size),
            flags,
            content,
        });
        if self.reusable {
            self.pool.enqueue(id, identifier);
        }
        self.reserved.push(id);
        Ok(id)
    }
}

/// Access to cell dequeuing, handed to [`DataSource::cell_for_row`](crate::DataSource::cell_for_row).
pub struct CellQueue<'a, T> {
    store: &'a mut CellStore<T>,
    size: Size,
}

impl<T> fmt::Debug for CellQueue<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellQueue")
            .field("store", &self.store)
            .field("size", &self.size)
            .finish()
    }
}

impl<'a, T> CellQueue<'a, T> {
    pub(crate) fn new(store: &'a mut CellStore<T>, size: Size) -> Self {
        Self { store, size }
    }

    /// Size of the page the cell is requested for.
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Shared access to a cell.
    #[must_use]
    pub fn get(&self, id: CellId) -> Option<&Cell<T>> {
        self.store.get(id)
    }

    /// Mutable access to a cell, typically to configure a freshly dequeued one.
    pub fn get_mut(&mut self, id: CellId) -> Option<&mut Cell<T>> {
        self.store.get_mut(id)
    }
}

impl<T: CellContent> CellQueue<'_, T> {
    /// Dequeues a cell for `identifier`.
    ///
    /// # Panics
    ///
    /// Panics if nothing is registered for `identifier`.
    pub fn dequeue(&mut self, identifier: &str) -> CellId {
        match self.try_dequeue(identifier) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Dequeues a cell for `identifier`, reporting unregistered identifiers as errors.
    pub fn try_dequeue(&mut self, identifier: &str) -> Result<CellId, Error> {
        self.store.dequeue(identifier, self.size)
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};

    use kurbo::{Rect, Size};

    use super::{CellContent, CellFlags, CellStore};
    use crate::{Error, IndexPath};

    #[derive(Clone, Debug, Default)]
    struct Label {
        text: String,
        reuses: u32,
    }

    impl CellContent for Label {
        fn prepare_for_reuse(&mut self) {
            self.reuses += 1;
            self.text.clear();
        }
    }

    const PAGE: Size = Size::new(100.0, 40.0);

    fn store(reusable: bool) -> CellStore<Label> {
        let mut store = CellStore::new(reusable);
        store.register_type("row", |_| Label::default());
        store
    }

    fn row_frame() -> Rect {
        Rect::new(0.0, 0.0, 100.0, 40.0)
    }

    #[test]
    fn unregistered_identifier_is_an_error() {
        let mut store = store(true);
        assert_eq!(
            store.dequeue("missing", PAGE),
            Err(Error::UnregisteredIdentifier("missing".to_string()))
        );
    }

    #[test]
    fn pool_never_returns_an_attached_cell() {
        let mut store = store(true);
        let first = store.dequeue("row", PAGE).unwrap();
        assert!(store.attach(first, IndexPath::new(0, 0, 0), row_frame(), false));
        store.release_reservations();

        let second = store.dequeue("row", PAGE).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.pooled_count("row"), 2);

        store.detach(first);
        store.release_reservations();
        let third = store.dequeue("row", PAGE).unwrap();
        assert_eq!(third, first);
        assert_eq!(store.get(third).unwrap().content().reuses, 1);
    }

    #[test]
    fn reserved_cells_are_not_handed_out_twice() {
        let mut store = store(true);
        let a = store.dequeue("row", PAGE).unwrap();
        let b = store.dequeue("row", PAGE).unwrap();
        assert_ne!(a, b);
        store.release_reservations();
        // Both stay pooled and become available again.
        assert_eq!(store.live_count(), 2);
        assert_eq!(store.dequeue("row", PAGE).unwrap(), a);
    }

    #[test]
    fn non_reusable_cells_die_when_detached_or_unused() {
        let mut store = store(false);
        let kept = store.dequeue("row", PAGE).unwrap();
        let dropped = store.dequeue("row", PAGE).unwrap();
        assert!(store.attach(kept, IndexPath::new(0, 1, 0), row_frame(), false));
        store.release_reservations();

        assert!(store.get(dropped).is_none());
        assert!(store.get(kept).unwrap().is_attached());

        store.detach(kept);
        assert!(store.get(kept).is_none());
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn stale_handles_do_not_resolve_after_slot_reuse() {
        let mut store = store(false);
        let old = store.dequeue("row", PAGE).unwrap();
        store.release_reservations();
        let new = store.dequeue("row", PAGE).unwrap();
        assert_eq!(old.idx(), new.idx());
        assert!(store.get(old).is_none());
        assert!(store.get(new).is_some());
    }

    #[test]
    fn evicted_cells_survive_until_detached() {
        let mut store = store(true);
        let attached = store.dequeue("row", PAGE).unwrap();
        let idle = store.dequeue("row", PAGE).unwrap();
        store.attach(attached, IndexPath::new(0, 0, 0), row_frame(), true);
        store.release_reservations();

        store.evict("row");
        assert!(store.get(idle).is_none());
        let cell = store.get(attached).unwrap();
        assert!(cell.is_selected());
        assert!(!cell.flags().contains(CellFlags::POOLED));

        store.detach(attached);
        assert!(store.get(attached).is_none());
    }

    #[test]
    fn templates_are_cloned_per_dequeue() {
        let mut store = CellStore::new(false);
        store.register_template(
            "title",
            Label {
                text: "title".to_string(),
                reuses: 0,
            },
        );
        let a = store.dequeue("title", PAGE).unwrap();
        let b = store.dequeue("title", PAGE).unwrap();
        store.get_mut(a).unwrap().content_mut().text.push('!');
        assert_eq!(store.get(a).unwrap().content().text, "title!");
        assert_eq!(store.get(b).unwrap().content().text, "title");
        assert_eq!(store.get(b).unwrap().reuse_identifier(), Some("title"));
    }
}
