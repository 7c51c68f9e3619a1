//! A single immutable snapshot of one line's content.

use serde::{Deserialize, Serialize};

use crate::ids::{BlockId, LineId};

/// What produced a [`Version`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VersionKind {
    /// Written at file load time.
    Imported,
    /// Hidden placeholder stamped the moment a line is born mid-editing.
    PreInsertion,
    /// The first visible content of a line born mid-editing.
    Insertion,
    /// A content replacement on an existing line.
    Change,
    /// Marks the line hidden from this timestamp forward.
    Deletion,
    /// Written when a CLONE block forks its own edit onto a shared line.
    Clone,
}

impl VersionKind {
    pub fn is_imported_or_clone(self) -> bool {
        matches!(self, VersionKind::Imported | VersionKind::Clone)
    }
}

/// One immutable entry in a [`crate::line::Line`]'s history. Never mutated
/// or deleted once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Version {
    pub line_id: LineId,
    /// Globally unique, monotonically increasing within this line's history.
    pub timestamp: u64,
    pub content: String,
    /// `false` means the line is hidden at or after this timestamp.
    pub is_active: bool,
    pub kind: VersionKind,
    /// For CLONE versions: the timestamp of the version it forked from.
    pub origin_version: Option<u64>,
    /// The Block whose edit produced this version, if any (not set for
    /// IMPORTED versions, which have no authoring block).
    pub source_block: Option<BlockId>,
}

impl Version {
    pub fn imported(line_id: LineId, timestamp: u64, content: String) -> Self {
        Version {
            line_id,
            timestamp,
            content,
            is_active: true,
            kind: VersionKind::Imported,
            origin_version: None,
            source_block: None,
        }
    }

    pub fn pre_insertion(line_id: LineId, timestamp: u64) -> Self {
        Version {
            line_id,
            timestamp,
            content: String::new(),
            is_active: false,
            kind: VersionKind::PreInsertion,
            origin_version: None,
            source_block: None,
        }
    }

    pub fn insertion(line_id: LineId, timestamp: u64, content: String, source_block: BlockId) -> Self {
        Version {
            line_id,
            timestamp,
            content,
            is_active: true,
            kind: VersionKind::Insertion,
            origin_version: None,
            source_block: Some(source_block),
        }
    }

    pub fn change(line_id: LineId, timestamp: u64, content: String, source_block: BlockId) -> Self {
        Version {
            line_id,
            timestamp,
            content,
            is_active: true,
            kind: VersionKind::Change,
            origin_version: None,
            source_block: Some(source_block),
        }
    }

    pub fn deletion(line_id: LineId, timestamp: u64, source_block: BlockId) -> Self {
        Version {
            line_id,
            timestamp,
            content: String::new(),
            is_active: false,
            kind: VersionKind::Deletion,
            origin_version: None,
            source_block: Some(source_block),
        }
    }

    pub fn clone_edit(line_id: LineId, timestamp: u64, content: String, source_block: BlockId, origin_version: Option<u64>) -> Self {
        Version {
            line_id,
            timestamp,
            content,
            is_active: true,
            kind: VersionKind::Clone,
            origin_version,
            source_block: Some(source_block),
        }
    }

    pub fn clone_deletion(line_id: LineId, timestamp: u64, source_block: BlockId, origin_version: Option<u64>) -> Self {
        Version {
            line_id,
            timestamp,
            content: String::new(),
            is_active: false,
            kind: VersionKind::Clone,
            origin_version,
            source_block: Some(source_block),
        }
    }

    /// Whether this version should be visible when reading lines from
    /// `perspective`'s point of view: every non-CLONE version always is;
    /// a CLONE version only to the clone that authored it.
    pub fn is_visible_to(&self, perspective: Option<&BlockId>) -> bool {
        self.kind != VersionKind::Clone || self.source_block.as_ref() == perspective
    }
}
