//! Opaque identifiers and the global timestamp source.
//!
//! `FileId`/`LineId`/`TagId` follow the teacher's `BlockId(pub Uuid)`
//! newtype pattern from `core/mod.rs`. `BlockId` is the exception: spec
//! calls it a "stable id (string path)", so it wraps an `Arc<str>` instead.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(FileId);
uuid_id!(LineId);
uuid_id!(TagId);

/// A Block's stable, opaque path id. ROOT blocks are rooted at the file;
/// INLINE and CLONE blocks extend their parent/origin's path with a fresh
/// segment, so the id itself records nesting without needing a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub Arc<str>);

impl BlockId {
    /// Build the id of a file's ROOT block.
    pub fn for_root(file_id: FileId) -> Self {
        BlockId(Arc::from(format!("{file_id}/root")))
    }

    /// Build a fresh child id nested under `parent`.
    pub fn child_of(parent: &BlockId) -> Self {
        BlockId(Arc::from(format!("{}/{}", parent.0, Uuid::new_v4())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strictly-increasing 64-bit timestamp source. Single instance per
/// [`crate::store::Store`]; the value is a pure ordering token, never a
/// wall-clock reading.
#[derive(Debug, Default)]
pub struct TimestampProvider {
    last: AtomicU64,
}

impl TimestampProvider {
    pub fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Allocate and return the next timestamp. Timestamps start at 1 so
    /// that 0 can mean "before any version" in comparisons.
    pub fn next(&self) -> u64 {
        self.last.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// The most recently allocated timestamp, or 0 if none has been issued.
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_strictly_increase() {
        let provider = TimestampProvider::new();
        let a = provider.next();
        let b = provider.next();
        let c = provider.next();
        assert!(a < b);
        assert!(b < c);
        assert_eq!(provider.last(), c);
    }

    #[test]
    fn block_child_ids_nest_under_parent() {
        let file = FileId::new();
        let root = BlockId::for_root(file);
        let child = BlockId::child_of(&root);
        assert!(child.as_str().starts_with(root.as_str()));
    }
}
