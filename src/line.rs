//! A node in a file's line list; owns an append-only version history.

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult};
use crate::ids::{BlockId, LineId};
use crate::order::OrderKey;
use crate::version::{Version, VersionKind};

/// One line of a file. Lines are never physically removed — "deletion" is
/// recorded as an inactive [`Version`].
#[derive(Debug, Clone)]
pub struct Line {
    pub id: LineId,
    pub order: OrderKey,
    /// Blocks currently claiming this line. Maintained by
    /// [`crate::store::Store`] whenever a Block's claim set changes.
    pub member_of: HashSet<BlockId>,
    /// Timestamp-ascending, append-only.
    history: Vec<Version>,
}

impl Line {
    /// A freshly imported line: one IMPORTED version, active immediately.
    pub fn imported(id: LineId, order: OrderKey, timestamp: u64, content: String) -> Self {
        Line {
            id,
            order,
            member_of: HashSet::new(),
            history: vec![Version::imported(id, timestamp, content)],
        }
    }

    /// A line born mid-editing: PRE_INSERTION at `t`, INSERTION at `t + 1`.
    /// See the pre-insertion contract in the design notes.
    pub fn born(
        id: LineId,
        order: OrderKey,
        pre_timestamp: u64,
        insertion_timestamp: u64,
        content: String,
        source_block: BlockId,
    ) -> Self {
        debug_assert!(insertion_timestamp > pre_timestamp);
        Line {
            id,
            order,
            member_of: HashSet::new(),
            history: vec![
                Version::pre_insertion(id, pre_timestamp),
                Version::insertion(id, insertion_timestamp, content, source_block),
            ],
        }
    }

    pub fn history(&self) -> &[Version] {
        &self.history
    }

    /// The last Version with `timestamp <= t`; if the line isn't born yet
    /// at `t`, returns its earliest Version (the PRE_INSERTION placeholder
    /// for lines born mid-editing, or the IMPORTED version for lines that
    /// predate every Block that could observe them).
    pub fn head_at(&self, t: u64) -> &Version {
        self.head_at_as(t, None)
    }

    /// As [`Self::head_at`], but CLONE-authored versions are only
    /// considered when they were authored by `perspective` itself — every
    /// other Block's read skips another clone's forked edits entirely, as
    /// if they were never appended.
    pub fn head_at_as(&self, t: u64, perspective: Option<&BlockId>) -> &Version {
        match self
            .history
            .iter()
            .rposition(|v| v.timestamp <= t && v.is_visible_to(perspective))
        {
            Some(idx) => &self.history[idx],
            None => &self.history[0],
        }
    }

    /// Append a version. Its timestamp must be strictly greater than the
    /// line's current latest timestamp.
    pub fn append(&mut self, version: Version) -> CoreResult<()> {
        if let Some(last) = self.history.last() {
            if version.timestamp <= last.timestamp {
                return Err(CoreError::InvariantViolation(format!(
                    "version timestamp {} does not exceed line {}'s last timestamp {}",
                    version.timestamp, self.id, last.timestamp
                )));
            }
        }
        self.history.push(version);
        Ok(())
    }

    /// Record a content replacement. When `as_clone` is set the version is
    /// tagged CLONE instead of CHANGE, so it stays invisible to every Block
    /// other than the one that wrote it (see [`Self::head_at_as`]).
    pub fn update_content(&mut self, block: BlockId, timestamp: u64, content: String, as_clone: bool) -> CoreResult<&Version> {
        let version = if as_clone {
            let origin_version = self.history.last().map(|v| v.timestamp);
            Version::clone_edit(self.id, timestamp, content, block, origin_version)
        } else {
            Version::change(self.id, timestamp, content, block)
        };
        self.append(version)?;
        Ok(self.history.last().unwrap())
    }

    /// Record a deletion. See [`Self::update_content`] for `as_clone`.
    pub fn delete(&mut self, block: BlockId, timestamp: u64, as_clone: bool) -> CoreResult<&Version> {
        let version = if as_clone {
            let origin_version = self.history.last().map(|v| v.timestamp);
            Version::clone_deletion(self.id, timestamp, block, origin_version)
        } else {
            Version::deletion(self.id, timestamp, block)
        };
        self.append(version)?;
        Ok(self.history.last().unwrap())
    }

    /// Versions eligible for a Block's timeline: everything except the
    /// IMPORTED/CLONE origin-era entries (those collapse to a single
    /// "original" anchor, computed by the caller across all claimed lines).
    pub fn timeline_versions(&self) -> impl Iterator<Item = &Version> {
        self.history.iter().filter(|v| !v.kind.is_imported_or_clone())
    }

    pub fn earliest_imported_timestamp(&self) -> Option<u64> {
        self.history
            .iter()
            .find(|v| v.kind == VersionKind::Imported)
            .map(|v| v.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderKey;

    fn new_line() -> (LineId, Line) {
        let id = LineId::new();
        (id, Line::imported(id, OrderKey::new(0), 1, "hello".into()))
    }

    #[test]
    fn head_at_before_birth_returns_earliest() {
        let (_, line) = new_line();
        assert_eq!(line.head_at(0).timestamp, 1);
    }

    #[test]
    fn head_at_after_edits_returns_latest_not_exceeding_t() {
        let (id, mut line) = new_line();
        let block = BlockId(std::sync::Arc::from("b"));
        line.update_content(block.clone(), 5, "world".into(), false).unwrap();
        line.update_content(block, 9, "world!".into(), false).unwrap();
        assert_eq!(line.head_at(1).content, "hello");
        assert_eq!(line.head_at(4).content, "hello");
        assert_eq!(line.head_at(5).content, "world");
        assert_eq!(line.head_at(8).content, "world");
        assert_eq!(line.head_at(100).content, "world!");
        let _ = id;
    }

    #[test]
    fn append_rejects_non_increasing_timestamp() {
        let (_, mut line) = new_line();
        let block = BlockId(std::sync::Arc::from("b"));
        line.update_content(block.clone(), 5, "a".into(), false).unwrap();
        let err = line.update_content(block, 5, "b".into(), false).unwrap_err();
        assert!(matches!(err, CoreError::InvariantViolation(_)));
    }

    #[test]
    fn clone_edit_is_invisible_outside_its_own_perspective() {
        let (_, mut line) = new_line();
        let clone_a = BlockId(std::sync::Arc::from("clone-a"));
        let clone_b = BlockId(std::sync::Arc::from("clone-b"));
        line.update_content(clone_a.clone(), 5, "forked".into(), true).unwrap();

        // Ordinary (non-clone) readers never see it, even once their
        // timestamp has advanced well past the edit.
        assert_eq!(line.head_at(100).content, "hello");
        // Neither does a different clone.
        assert_eq!(line.head_at_as(100, Some(&clone_b)).content, "hello");
        // Only the clone that authored it does.
        assert_eq!(line.head_at_as(100, Some(&clone_a)).content, "forked");
    }

    #[test]
    fn pre_insertion_line_is_hidden_before_birth() {
        let id = LineId::new();
        let block = BlockId(std::sync::Arc::from("b"));
        let line = Line::born(id, OrderKey::new(0), 10, 11, "new".into(), block);
        assert!(!line.head_at(10).is_active);
        assert!(line.head_at(11).is_active);
        assert_eq!(line.head_at(11).content, "new");
        assert!(!line.head_at(0).is_active);
    }
}
