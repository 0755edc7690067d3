//! Core error types for memprobe-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Per the
//! construction error taxonomy, only two conditions are fatal enough to
//! abort the whole analysis -- everything else (a bad cast, a missing
//! field, a failed dereference) is absorbed by the destructuring walk,
//! which simply omits the unresolvable sub-tree.

use thiserror::Error;

use crate::id::TypeId;

/// Errors that abort `run_analysis` before a graph is produced.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The process state exposes no typed-block layer at all.
    #[error("process state exposes no typed-block layer")]
    NoTypedBlockLayer,

    /// A top-level typed block names a type id the repository doesn't know.
    #[error("unknown type id: {id}")]
    UnknownTypeId { id: TypeId },
}
