// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::string::String;

use crate::IndexPath;

/// Errors reported by [`InfiniteView`](crate::InfiniteView) operations.
///
/// Missing data-source methods and degenerate geometry are never errors; they fall
/// back to defaults or to "nothing visible".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No cell type or template was registered for this reuse identifier.
    #[error(
        "could not dequeue a cell with identifier `{0}`: register a cell type or template for it first"
    )]
    UnregisteredIdentifier(String),
    /// The index path does not address an existing page or row.
    #[error("index path {0} is out of range")]
    IndexPathOutOfRange(IndexPath),
}
