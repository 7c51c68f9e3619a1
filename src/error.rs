//! Error kinds surfaced by every public operation.
//!
//! Mirrors the policy in the design notes: `OutOfRange`, `Overlap`, and
//! `NotFound` are returned to the caller with no state change.
//! `StorageError` means the current operation's batch never committed.
//! `InvariantViolation` is a programmer error; see [`crate::config::CoreConfig`]
//! for whether it panics or is returned.

use thiserror::Error;

use crate::ids::{BlockId, FileId, LineId, TagId};

/// Errors produced by the versioning core.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// A line number or timeline index fell outside the current bounds.
    #[error("out of range: {what} = {value} (valid range {low}..={high})")]
    OutOfRange {
        what: &'static str,
        value: i64,
        low: i64,
        high: i64,
    },

    /// A requested child range overlaps an existing sibling's claimed lines.
    #[error("range overlaps an existing sibling block")]
    Overlap,

    /// An id did not resolve to a live object.
    #[error("not found: {0}")]
    NotFound(NotFoundKind),

    /// An internal invariant was violated. Returned only when
    /// [`crate::config::CoreConfig::invariant_violations_panic`] is `false`;
    /// otherwise the core panics instead of returning this variant.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    /// The transactional store could not commit the operation's batch;
    /// no Versions or Blocks were created.
    #[error("storage error: {0}")]
    StorageError(String),
}

/// Which kind of id a [`CoreError::NotFound`] failed to resolve.
#[derive(Debug, Clone, Error)]
pub enum NotFoundKind {
    #[error("file {0:?}")]
    File(FileId),
    #[error("line {0:?}")]
    Line(LineId),
    #[error("block {0:?}")]
    Block(BlockId),
    #[error("tag {0:?}")]
    Tag(TagId),
}

pub type CoreResult<T> = Result<T, CoreError>;
