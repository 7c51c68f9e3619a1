//! Per-block derivation of selectable versions, the current version, and
//! the index <-> version mapping used by `apply_index`.

use crate::error::{CoreError, CoreResult};
use crate::ids::{BlockId, LineId};
use crate::line::Line;
use crate::version::{Version, VersionKind};

/// The ordered, user-visible sequence of versions for a Block: every
/// non-IMPORTED version on a claimed line visible from `perspective` (see
/// [`Version::is_visible_to`]), plus a single "original" anchor collapsing
/// every claimed line's IMPORTED version. Versions share one global
/// timestamp order, so sorting by timestamp is enough to merge the anchor
/// in correctly (it is always the earliest).
pub fn timeline<'a>(lines: &[&'a Line], perspective: Option<&BlockId>) -> Vec<&'a Version> {
    let mut anchor: Option<&Version> = None;
    let mut rest: Vec<&Version> = Vec::new();

    for line in lines {
        for v in line.history() {
            match v.kind {
                VersionKind::Imported => {
                    if anchor.map_or(true, |a| v.timestamp > a.timestamp) {
                        anchor = Some(v);
                    }
                }
                VersionKind::Clone => {
                    if v.is_visible_to(perspective) {
                        rest.push(v);
                    }
                }
                _ => rest.push(v),
            }
        }
    }

    if let Some(a) = anchor {
        rest.push(a);
    }
    rest.sort_by_key(|v| v.timestamp);
    rest
}

/// "total_versions_on_claimed_lines - imported_line_count + (1 if any
/// imported line else 0)", counting only versions visible from `perspective`.
pub fn user_version_count(lines: &[&Line], perspective: Option<&BlockId>) -> usize {
    let mut total = 0usize;
    let mut imported_line_count = 0usize;
    for line in lines {
        total += line.history().iter().filter(|v| v.is_visible_to(perspective)).count();
        if line.history().iter().any(|v| v.kind == VersionKind::Imported) {
            imported_line_count += 1;
        }
    }
    let anchor_bonus = if imported_line_count > 0 { 1 } else { 0 };
    total - imported_line_count + anchor_bonus
}

/// Each claimed line's `head_at_as(block_timestamp, perspective)`; among
/// those, the one with the maximum timestamp that is not PRE_INSERTION —
/// unless a line is parked exactly on its own PRE_INSERTION moment (its
/// stored timestamp equals `block_timestamp`), in which case that really is
/// the most recent touch and must not be skipped in favor of something
/// older.
pub fn current_version<'a>(lines: &[&'a Line], block_timestamp: u64, perspective: Option<&BlockId>) -> Option<&'a Version> {
    lines
        .iter()
        .map(|l| l.head_at_as(block_timestamp, perspective))
        .filter(|v| v.kind != VersionKind::PreInsertion || v.timestamp == block_timestamp)
        .max_by_key(|v| v.timestamp)
}

fn line_by_id<'a>(lines: &[&'a Line], id: LineId) -> Option<&'a Line> {
    lines.iter().find(|l| l.id == id).copied()
}

/// The version immediately following `v` in its own line's history, if any.
fn next_in_line<'a>(lines: &[&'a Line], v: &Version) -> Option<&'a Version> {
    line_by_id(lines, v.line_id).and_then(|l| l.history().iter().find(|x| x.timestamp > v.timestamp))
}

fn head_timestamp(lines: &[&Line], line_id: LineId, block_timestamp: u64, perspective: Option<&BlockId>) -> Option<u64> {
    line_by_id(lines, line_id).map(|l| l.head_at_as(block_timestamp, perspective).timestamp)
}

/// Position of `current_version()` within `timeline`. If the current head
/// is the INSERTION paired with a PRE_INSERTION, the index points at the
/// PRE_INSERTION entry instead (so scrubbing one step left hides the line
/// again, which is the intuitive "undo the reveal" behavior). If the
/// current head IS that PRE_INSERTION (the block is parked exactly on the
/// hidden moment), its own position is already the right answer.
pub fn current_index(lines: &[&Line], timeline: &[&Version], block_timestamp: u64, perspective: Option<&BlockId>) -> CoreResult<usize> {
    let current = current_version(lines, block_timestamp, perspective).ok_or_else(|| {
        CoreError::InvariantViolation("block has no active current version".to_string())
    })?;

    if current.kind == VersionKind::Insertion {
        if let Some(line) = line_by_id(lines, current.line_id) {
            if let Some(prev) = line
                .history()
                .iter()
                .rev()
                .find(|v| v.timestamp < current.timestamp)
            {
                if prev.kind == VersionKind::PreInsertion && prev.timestamp + 1 == current.timestamp {
                    if let Some(idx) = timeline.iter().position(|v| v.timestamp == prev.timestamp) {
                        return Ok(idx);
                    }
                }
            }
        }
    }

    timeline
        .iter()
        .position(|v| v.timestamp == current.timestamp)
        .ok_or_else(|| CoreError::InvariantViolation("current version missing from timeline".to_string()))
}

/// Resolve `apply_index(i)`'s snap rules (see the design notes) to the
/// timestamp that should become the Block's new `timestamp`.
pub fn apply_index_target(
    lines: &[&Line],
    timeline: &[&Version],
    block_timestamp: u64,
    i: usize,
    perspective: Option<&BlockId>,
) -> CoreResult<u64> {
    if i >= timeline.len() {
        return Err(CoreError::OutOfRange {
            what: "timeline index",
            value: i as i64,
            low: 0,
            high: timeline.len() as i64 - 1,
        });
    }

    let sel = timeline[i];
    let prev = i.checked_sub(1).map(|j| timeline[j]);
    let next = timeline.get(i + 1).copied();
    let current_idx = current_index(lines, timeline, block_timestamp, perspective)?;
    let latest = timeline[current_idx];

    // Rule 1: stepping right off the current PRE_INSERTION reveals the line.
    if let Some(p) = prev {
        if p.timestamp == latest.timestamp
            && p.kind == VersionKind::PreInsertion
            && head_timestamp(lines, p.line_id, block_timestamp, perspective) == Some(p.timestamp)
        {
            let target = next_in_line(lines, p).unwrap_or(sel);
            return Ok(target.timestamp);
        }
    }

    // Rule 2: stepping left off the current (visible) line toward its
    // PRE_INSERTION hides it.
    if let Some(n) = next {
        if n.timestamp == latest.timestamp
            && n.kind == VersionKind::PreInsertion
            && head_timestamp(lines, n.line_id, block_timestamp, perspective) != Some(n.timestamp)
        {
            return Ok(n.timestamp);
        }
    }

    // Rule 3: landing directly on an invisible PRE_INSERTION step skips to
    // its paired INSERTION. This also covers re-applying the index reported
    // by `current_index` while parked exactly on a hidden PRE_INSERTION:
    // `sel` there just is `latest`.
    if sel.kind == VersionKind::PreInsertion
        && (sel.timestamp == latest.timestamp || next.map_or(false, |n| n.timestamp == latest.timestamp))
    {
        let target = next_in_line(lines, sel).unwrap_or(sel);
        return Ok(target.timestamp);
    }

    // Rule 4.
    Ok(sel.timestamp)
}
