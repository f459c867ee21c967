// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifier-keyed pool of cells available for reuse.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::CellId;

/// Pool of cell handles keyed by reuse identifier.
///
/// The pool only stores handles. Whether a pooled cell can be handed out is decided
/// by the caller (the cell arena knows which cells are attached), so the pool never
/// returns a cell that is currently part of a page.
#[derive(Clone, Debug, Default)]
pub(crate) struct ReusePool {
    queues: HashMap<String, Vec<CellId>>,
}

impl ReusePool {
    /// Returns the first pooled cell for `identifier`, in insertion order, that
    /// `is_available` accepts.
    pub(crate) fn dequeue(
        &self,
        identifier: &str,
        is_available: impl Fn(CellId) -> bool,
    ) -> Option<CellId> {
        self.queues
            .get(identifier)?
            .iter()
            .copied()
            .find(|&id| is_available(id))
    }

    /// Stores `id` for later reuse under `identifier`.
    pub(crate) fn enqueue(&mut self, id: CellId, identifier: &str) {
        if let Some(queue) = self.queues.get_mut(identifier) {
            queue.push(id);
        } else {
            self.queues.insert(identifier.into(), vec![id]);
        }
    }

    /// Drops every pooled handle for `identifier`, returning them.
    pub(crate) fn evict(&mut self, identifier: &str) -> Vec<CellId> {
        self.queues.remove(identifier).unwrap_or_default()
    }

    /// Drops every pooled handle, returning them.
    pub(crate) fn evict_all(&mut self) -> Vec<CellId> {
        self.queues.drain().flat_map(|(_, ids)| ids).collect()
    }

    /// Number of handles pooled under `identifier`.
    #[cfg(test)]
    pub(crate) fn count(&self, identifier: &str) -> usize {
        self.queues.get(identifier).map_or(0, Vec::len)
    }
}
