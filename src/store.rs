//! The transactional, arena-style store backing a [`crate::session::Session`].
//!
//! Grounded on the teacher's `BlockRegistry` (`Arc<RwLock<HashMap<...>>>` +
//! `parking_lot`), collapsed to a single `RwLock<StoreInner>` guarding every
//! table together — almost every operation here touches more than one of
//! files/lines/blocks/tags within the same logical transaction, so one lock
//! gives the "single atomic batch" semantics the design notes call for
//! without inventing a lock-ordering protocol across four separate guards.

use std::collections::HashMap;

use log::debug;
use parking_lot::RwLock;

use crate::block::{Block, BlockInfo, BlockKind};
use crate::config::CoreConfig;
use crate::edit::{plan_change, MultiLineChange};
use crate::error::{CoreError, CoreResult, NotFoundKind};
use crate::file::File;
use crate::ids::{BlockId, FileId, LineId, TagId, TimestampProvider};
use crate::line::Line;
use crate::order::{self, OrderKey};
use crate::tag::Tag;
use crate::timeline;

struct StoreInner {
    files: HashMap<FileId, File>,
    lines: HashMap<LineId, Line>,
    blocks: HashMap<BlockId, Block>,
    tags: HashMap<TagId, Tag>,
}

/// Owns every File, Line, Block, and Tag for a process. The one public type
/// a host embeds alongside (or wrapped by) [`crate::session::Session`].
pub struct Store {
    config: CoreConfig,
    timestamps: TimestampProvider,
    inner: RwLock<StoreInner>,
}

impl Store {
    pub fn new(config: CoreConfig) -> Self {
        Store {
            config,
            timestamps: TimestampProvider::new(),
            inner: RwLock::new(StoreInner {
                files: HashMap::new(),
                lines: HashMap::new(),
                blocks: HashMap::new(),
                tags: HashMap::new(),
            }),
        }
    }

    fn check_invariant<T>(&self, result: CoreResult<T>) -> CoreResult<T> {
        if let Err(CoreError::InvariantViolation(ref msg)) = result {
            if self.config.invariant_violations_panic {
                panic!("invariant violation: {msg}");
            }
        }
        result
    }

    // ---------------------------------------------------------------- load

    /// Import `content` as a new file: each line becomes a Line with one
    /// IMPORTED Version at a shared timestamp, and a ROOT Block is created
    /// at that timestamp. Returns the new file's id and its ROOT block id.
    pub fn load_file(&self, path: String, eol: Option<String>, content: &str) -> CoreResult<(FileId, BlockId)> {
        let mut inner = self.inner.write();

        let file_id = FileId::new();
        let eol_str = eol.unwrap_or_else(|| self.config.default_eol.to_string());
        let mut file = File::new(file_id, path, eol_str.clone());

        let timestamp = self.timestamps.next();
        let spacing = self.config.order_spacing;
        let raw_lines: Vec<&str> = if content.is_empty() {
            vec![""]
        } else {
            content.split(eol_str.as_str()).collect()
        };

        let mut line_ids = Vec::with_capacity(raw_lines.len());
        for (i, text) in raw_lines.iter().enumerate() {
            let order = OrderKey::new(i as i64 * spacing);
            let line_id = LineId::new();
            let line = Line::imported(line_id, order, timestamp, (*text).to_string());
            inner.lines.insert(line_id, line);
            line_ids.push(line_id);
        }
        file.lines = line_ids.clone();
        inner.files.insert(file_id, file);

        let root_id = BlockId::for_root(file_id);
        let root = Block::new_root(root_id.clone(), file_id, timestamp, line_ids.clone());
        inner.blocks.insert(root_id.clone(), root);
        for line_id in &line_ids {
            inner.lines.get_mut(line_id).unwrap().member_of.insert(root_id.clone());
        }

        debug!("loaded file {file_id} ({} lines) with root block {root_id}", line_ids.len());
        Ok((file_id, root_id))
    }

    pub fn get_root_block(&self, file_id: FileId) -> CoreResult<BlockId> {
        let root_id = BlockId::for_root(file_id);
        let inner = self.inner.read();
        if inner.blocks.contains_key(&root_id) {
            Ok(root_id)
        } else {
            Err(CoreError::NotFound(NotFoundKind::File(file_id)))
        }
    }

    // ---------------------------------------------------------------- reads

    pub fn get_text(&self, block_id: &BlockId, clones_to_consider: &[BlockId]) -> CoreResult<String> {
        let inner = self.inner.read();
        let block = self.require_block(&inner, block_id)?;
        self.text_locked(&inner, block, clones_to_consider)
    }

    pub fn get_active_line_count(&self, block_id: &BlockId) -> CoreResult<usize> {
        let inner = self.inner.read();
        let block = self.require_block(&inner, block_id)?;
        Ok(active_line_ids(block, &inner.lines).len())
    }

    pub fn get_block_info(&self, block_id: &BlockId) -> CoreResult<BlockInfo> {
        let inner = self.inner.read();
        self.block_info_locked(&inner, block_id)
    }

    pub fn get_children_info(&self, block_id: &BlockId) -> CoreResult<Vec<BlockInfo>> {
        let inner = self.inner.read();
        let block = self.require_block(&inner, block_id)?;
        block
            .children
            .iter()
            .map(|child_id| self.block_info_locked(&inner, child_id))
            .collect()
    }

    fn block_info_locked(&self, inner: &StoreInner, block_id: &BlockId) -> CoreResult<BlockInfo> {
        let block = self.require_block(inner, block_id)?;
        let lines: Vec<&Line> = block.lines.iter().filter_map(|id| inner.lines.get(id)).collect();
        let perspective = own_perspective(block);
        let tl = timeline::timeline(&lines, perspective);
        let current_index = self.check_invariant(timeline::current_index(&lines, &tl, block.timestamp, perspective))?;
        let user_version_count = timeline::user_version_count(&lines, perspective);

        let range_in_parent = block
            .parent
            .as_ref()
            .and_then(|parent_id| inner.blocks.get(parent_id))
            .and_then(|parent| range_within(&parent.lines, &block.lines));

        Ok(BlockInfo {
            block_id: block_id.clone(),
            range_in_parent,
            user_version_count,
            current_version_index: current_index,
            tags: block.tags.clone(),
        })
    }

    fn text_locked(&self, inner: &StoreInner, block: &Block, clones_to_consider: &[BlockId]) -> CoreResult<String> {
        let eol = inner
            .files
            .get(&block.file_id)
            .map(|f| f.eol.clone())
            .unwrap_or_else(|| self.config.default_eol.to_string());
        let overrides = build_clone_overrides(block, clones_to_consider, &inner.blocks);
        let default_perspective = own_perspective(block);

        let mut parts = Vec::new();
        for line_id in &block.lines {
            if let Some(line) = inner.lines.get(line_id) {
                let (ts, perspective) = match overrides.get(line_id) {
                    Some((clone_id, clone_ts)) => (*clone_ts, Some(*clone_id)),
                    None => (block.timestamp, default_perspective),
                };
                let head = line.head_at_as(ts, perspective);
                if head.is_active {
                    parts.push(head.content.clone());
                }
            }
        }
        Ok(parts.join(&eol))
    }

    fn require_block<'a>(&self, inner: &'a StoreInner, block_id: &BlockId) -> CoreResult<&'a Block> {
        inner
            .blocks
            .get(block_id)
            .ok_or_else(|| CoreError::NotFound(NotFoundKind::Block(block_id.clone())))
    }

    // ------------------------------------------------------------- editing

    pub fn insert_line_at(&self, block_id: &BlockId, n: usize, content: String) -> CoreResult<LineId> {
        let mut inner = self.inner.write();
        self.insert_line_at_locked(&mut inner, block_id, n, content)
    }

    fn insert_line_at_locked(
        &self,
        inner: &mut StoreInner,
        block_id: &BlockId,
        n: usize,
        content: String,
    ) -> CoreResult<LineId> {
        let block = self.require_block(inner, block_id)?.clone();
        let perspective = own_perspective(&block);

        let active_positions: Vec<usize> = block
            .lines
            .iter()
            .enumerate()
            .filter(|(_, id)| inner.lines.get(id).map_or(false, |l| l.head_at_as(block.timestamp, perspective).is_active))
            .map(|(i, _)| i)
            .collect();
        let active_count = active_positions.len();

        if n < 1 || n > active_count + 1 {
            return Err(CoreError::OutOfRange {
                what: "insert position",
                value: n as i64,
                low: 1,
                high: (active_count + 1) as i64,
            });
        }

        let full_idx = if n <= active_count {
            active_positions[n - 1]
        } else {
            // Appending past the last active line: land right after it, not
            // necessarily at the very end of `block.lines` (trailing claimed
            // lines may already be inactive).
            active_positions.last().map(|&p| p + 1).unwrap_or(block.lines.len())
        };

        let prev_id = if full_idx > 0 { Some(block.lines[full_idx - 1]) } else { None };
        let next_id = block.lines.get(full_idx).copied();

        let prev_order = prev_id.and_then(|id| inner.lines.get(&id).map(|l| l.order));
        let next_order = next_id.and_then(|id| inner.lines.get(&id).map(|l| l.order));

        let new_order = match order::midpoint(prev_order, next_order, self.config.order_spacing) {
            Some(o) => o,
            None => {
                self.renumber_file(inner, block.file_id)?;
                let prev_order = prev_id.and_then(|id| inner.lines.get(&id).map(|l| l.order));
                let next_order = next_id.and_then(|id| inner.lines.get(&id).map(|l| l.order));
                order::midpoint(prev_order, next_order, self.config.order_spacing)
                    .ok_or_else(|| CoreError::InvariantViolation("order keys collapsed even after renumbering".into()))?
            }
        };

        let pre_ts = self.timestamps.next();
        let ins_ts = self.timestamps.next();
        let new_line_id = LineId::new();
        let new_line = Line::born(new_line_id, new_order, pre_ts, ins_ts, content, block_id.clone());
        inner.lines.insert(new_line_id, new_line);

        let mut file_pos = 0usize;
        if let Some(file) = inner.files.get(&block.file_id) {
            while file_pos < file.lines.len() && inner.lines[&file.lines[file_pos]].order < new_order {
                file_pos += 1;
            }
        }
        if let Some(file) = inner.files.get_mut(&block.file_id) {
            file.lines.insert(file_pos, new_line_id);
        }

        inner.blocks.get_mut(block_id).unwrap().lines.insert(full_idx, new_line_id);
        inner.lines.get_mut(&new_line_id).unwrap().member_of.insert(block_id.clone());

        if let Some(neighbor) = prev_id.or(next_id) {
            let claimants: Vec<BlockId> = inner
                .lines
                .get(&neighbor)
                .map(|l| l.member_of.iter().filter(|b| *b != block_id).cloned().collect())
                .unwrap_or_default();
            for claimant in claimants {
                self.claim_line(inner, &claimant, new_line_id)?;
            }
        }

        let edited_block = inner.blocks.get_mut(block_id).unwrap();
        if ins_ts > edited_block.timestamp {
            edited_block.timestamp = ins_ts;
        }

        Ok(new_line_id)
    }

    pub fn update_line(&self, block_id: &BlockId, n: usize, content: String) -> CoreResult<LineId> {
        let mut inner = self.inner.write();
        let block = self.require_block(&inner, block_id)?.clone();
        let as_clone = block.kind == BlockKind::Clone;
        let active = active_line_ids(&block, &inner.lines);
        if n < 1 || n > active.len() {
            return Err(CoreError::OutOfRange {
                what: "line number",
                value: n as i64,
                low: 1,
                high: active.len() as i64,
            });
        }
        let line_id = active[n - 1];
        let ts = self.timestamps.next();
        let result = inner
            .lines
            .get_mut(&line_id)
            .unwrap()
            .update_content(block_id.clone(), ts, content, as_clone)
            .map(|_| ());
        self.check_invariant(result)?;
        let b = inner.blocks.get_mut(block_id).unwrap();
        if ts > b.timestamp {
            b.timestamp = ts;
        }
        Ok(line_id)
    }

    /// Translate a raw multi-line text change into line-level writes.
    /// Returns the ids of every Block claiming a touched line.
    pub fn change_lines(&self, block_id: &BlockId, change: MultiLineChange) -> CoreResult<Vec<BlockId>> {
        let mut inner = self.inner.write();

        let block = self.require_block(&inner, block_id)?.clone();
        let as_clone = block.kind == BlockKind::Clone;
        let eol = inner
            .files
            .get(&block.file_id)
            .map(|f| f.eol.clone())
            .unwrap_or_else(|| self.config.default_eol.to_string());

        let active_ids = active_line_ids(&block, &inner.lines);
        let lo = change.start_line.saturating_sub(1);
        let hi = change.end_line.min(active_ids.len());
        let vcs_lines: Vec<LineId> = if lo < hi { active_ids[lo..hi].to_vec() } else { Vec::new() };

        let plan = plan_change(&change, &eol, &vcs_lines);

        let mut touched: Vec<LineId> = Vec::new();
        let mut latest_ts = block.timestamp;

        for line_id in &plan.deletions {
            let ts = self.timestamps.next();
            let result = inner
                .lines
                .get_mut(line_id)
                .ok_or_else(|| CoreError::NotFound(NotFoundKind::Line(*line_id)))?
                .delete(block_id.clone(), ts, as_clone)
                .map(|_| ());
            self.check_invariant(result)?;
            latest_ts = ts;
            touched.push(*line_id);
        }

        for (line_id, content) in &plan.changes {
            let ts = self.timestamps.next();
            let result = inner
                .lines
                .get_mut(line_id)
                .ok_or_else(|| CoreError::NotFound(NotFoundKind::Line(*line_id)))?
                .update_content(block_id.clone(), ts, content.clone(), as_clone)
                .map(|_| ());
            self.check_invariant(result)?;
            latest_ts = ts;
            touched.push(*line_id);
        }

        if let Some(b) = inner.blocks.get_mut(block_id) {
            if latest_ts > b.timestamp {
                b.timestamp = latest_ts;
            }
        }

        let mut position = plan.insert_at_position;
        for content in &plan.insertions {
            let line_id = self.insert_line_at_locked(&mut inner, block_id, position, content.clone())?;
            touched.push(line_id);
            position += 1;
        }

        let mut affected: Vec<BlockId> = Vec::new();
        for line_id in &touched {
            if let Some(line) = inner.lines.get(line_id) {
                for b in &line.member_of {
                    if !affected.contains(b) {
                        affected.push(b.clone());
                    }
                }
            }
        }
        if affected.is_empty() {
            affected.push(block_id.clone());
        }

        debug!(
            "change_lines on {block_id}: {} deletions, {} changes, {} insertions",
            plan.deletions.len(),
            plan.changes.len(),
            plan.insertions.len()
        );

        Ok(affected)
    }

    fn renumber_file(&self, inner: &mut StoreInner, file_id: FileId) -> CoreResult<()> {
        let ids: Vec<LineId> = inner
            .files
            .get(&file_id)
            .ok_or_else(|| CoreError::NotFound(NotFoundKind::File(file_id)))?
            .lines
            .clone();
        let new_orders = order::renumber(ids.len(), self.config.order_spacing);
        for (id, new_order) in ids.iter().zip(new_orders) {
            if let Some(line) = inner.lines.get_mut(id) {
                line.order = new_order;
            }
        }
        Ok(())
    }

    fn claim_line(&self, inner: &mut StoreInner, block_id: &BlockId, line_id: LineId) -> CoreResult<()> {
        let order = inner
            .lines
            .get(&line_id)
            .ok_or_else(|| CoreError::NotFound(NotFoundKind::Line(line_id)))?
            .order;

        let mut pos = 0usize;
        let mut already_claimed = false;
        if let Some(block) = inner.blocks.get(block_id) {
            while pos < block.lines.len() && inner.lines[&block.lines[pos]].order < order {
                pos += 1;
            }
            already_claimed = pos < block.lines.len() && block.lines[pos] == line_id;
        } else {
            return Err(CoreError::NotFound(NotFoundKind::Block(block_id.clone())));
        }
        if already_claimed {
            return Ok(());
        }

        inner.blocks.get_mut(block_id).unwrap().lines.insert(pos, line_id);
        inner.lines.get_mut(&line_id).unwrap().member_of.insert(block_id.clone());
        Ok(())
    }

    // ------------------------------------------------------------- blocks

    pub fn create_child(&self, block_id: &BlockId, start_line: usize, end_line: usize) -> CoreResult<Option<BlockId>> {
        let mut inner = self.inner.write();
        let parent = self.require_block(&inner, block_id)?.clone();
        let active = active_line_ids(&parent, &inner.lines);

        if start_line < 1 || end_line < start_line || end_line > active.len() {
            return Err(CoreError::OutOfRange {
                what: "child range",
                value: end_line as i64,
                low: start_line as i64,
                high: active.len() as i64,
            });
        }

        let claimed: Vec<LineId> = active[start_line - 1..end_line].to_vec();

        for child_id in &parent.children {
            if let Some(child) = inner.blocks.get(child_id) {
                if child.kind == BlockKind::Inline && child.lines.iter().any(|l| claimed.contains(l)) {
                    return Ok(None);
                }
            }
        }

        let child_id = BlockId::child_of(block_id);
        let child = Block::new_inline(child_id.clone(), parent.file_id, block_id.clone(), parent.timestamp, claimed.clone());
        inner.blocks.insert(child_id.clone(), child);

        for line_id in &claimed {
            if let Some(line) = inner.lines.get_mut(line_id) {
                line.member_of.insert(child_id.clone());
            }
        }
        if let Some(p) = inner.blocks.get_mut(block_id) {
            p.children.push(child_id.clone());
        }

        Ok(Some(child_id))
    }

    pub fn copy(&self, block_id: &BlockId) -> CoreResult<BlockId> {
        let mut inner = self.inner.write();
        let origin = self.require_block(&inner, block_id)?.clone();
        let origin_perspective = own_perspective(&origin);

        let max_ts = origin
            .lines
            .iter()
            .filter_map(|id| inner.lines.get(id))
            .map(|l| l.head_at_as(origin.timestamp, origin_perspective).timestamp)
            .max()
            .unwrap_or(origin.timestamp);

        let clone_id = BlockId::child_of(block_id);
        let clone_block = Block::new_clone(clone_id.clone(), origin.file_id, block_id.clone(), max_ts, origin.lines.clone());
        inner.blocks.insert(clone_id.clone(), clone_block);

        for line_id in &origin.lines {
            if let Some(line) = inner.lines.get_mut(line_id) {
                line.member_of.insert(clone_id.clone());
            }
        }
        Ok(clone_id)
    }

    pub fn delete_block(&self, block_id: &BlockId) -> CoreResult<()> {
        let mut inner = self.inner.write();
        self.delete_block_locked(&mut inner, block_id)
    }

    fn delete_block_locked(&self, inner: &mut StoreInner, block_id: &BlockId) -> CoreResult<()> {
        let block = self.require_block(inner, block_id)?.clone();

        for child in block.children.clone() {
            self.delete_block_locked(inner, &child)?;
        }

        if let Some(parent_id) = &block.parent {
            if let Some(parent) = inner.blocks.get_mut(parent_id) {
                parent.children.retain(|c| c != block_id);
            }
        }

        for line_id in &block.lines {
            if let Some(line) = inner.lines.get_mut(line_id) {
                line.member_of.remove(block_id);
            }
        }

        inner.blocks.remove(block_id);
        Ok(())
    }

    // ------------------------------------------------------------ timeline

    pub fn apply_index(&self, block_id: &BlockId, i: usize) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let target = {
            let block = self.require_block(&inner, block_id)?;
            let lines: Vec<&Line> = block.lines.iter().filter_map(|id| inner.lines.get(id)).collect();
            let perspective = own_perspective(block);
            let tl = timeline::timeline(&lines, perspective);
            self.check_invariant(timeline::apply_index_target(&lines, &tl, block.timestamp, i, perspective))?
        };
        inner.blocks.get_mut(block_id).unwrap().timestamp = target;
        Ok(())
    }

    pub fn apply_timestamp(&self, block_id: &BlockId, t: u64) -> CoreResult<()> {
        let mut inner = self.inner.write();
        let block = inner
            .blocks
            .get_mut(block_id)
            .ok_or_else(|| CoreError::NotFound(NotFoundKind::Block(block_id.clone())))?;
        block.timestamp = t;
        Ok(())
    }

    // ----------------------------------------------------------------- tags

    pub fn create_tag(&self, block_id: &BlockId, name: String) -> CoreResult<TagId> {
        let mut inner = self.inner.write();
        let (timestamp, text) = {
            let block = self.require_block(&inner, block_id)?;
            let timestamp = block.timestamp;
            let text = self.text_locked(&inner, block, &[])?;
            (timestamp, text)
        };
        let id = TagId::new();
        let tag = Tag {
            id,
            block_id: block_id.clone(),
            timestamp,
            name,
            cached_text: text,
        };
        inner.tags.insert(id, tag);
        inner.blocks.get_mut(block_id).unwrap().tags.push(id);
        Ok(id)
    }

    pub fn load_tag(&self, tag_id: &TagId) -> CoreResult<String> {
        let mut inner = self.inner.write();
        let tag = inner
            .tags
            .get(tag_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(NotFoundKind::Tag(*tag_id)))?;
        inner
            .blocks
            .get_mut(&tag.block_id)
            .ok_or_else(|| CoreError::NotFound(NotFoundKind::Block(tag.block_id.clone())))?
            .timestamp = tag.timestamp;
        Ok(tag.cached_text)
    }

    /// Capture current state, load the tag, read its text, restore the
    /// previous state. Idempotent: never observable from the outside.
    pub fn get_text_for_version(&self, tag_id: &TagId) -> CoreResult<String> {
        let mut inner = self.inner.write();
        let tag = inner
            .tags
            .get(tag_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(NotFoundKind::Tag(*tag_id)))?;

        let previous_timestamp = self.require_block(&inner, &tag.block_id)?.timestamp;
        inner.blocks.get_mut(&tag.block_id).unwrap().timestamp = tag.timestamp;
        let text = {
            let block = self.require_block(&inner, &tag.block_id)?;
            self.text_locked(&inner, block, &[])?
        };
        inner.blocks.get_mut(&tag.block_id).unwrap().timestamp = previous_timestamp;
        Ok(text)
    }
}

/// The clone-authorship lens a Block uses to read its own claimed lines:
/// `Some(&block.id)` if this Block is itself a CLONE (so its own forked
/// edits are visible to it), `None` for ROOT/INLINE (they never see any
/// CLONE's forked edits on their own, only through `clones_to_consider`).
fn own_perspective(block: &Block) -> Option<&BlockId> {
    if block.kind == BlockKind::Clone {
        Some(&block.id)
    } else {
        None
    }
}

fn active_line_ids(block: &Block, lines: &HashMap<LineId, Line>) -> Vec<LineId> {
    let perspective = own_perspective(block);
    block
        .lines
        .iter()
        .filter(|id| lines.get(id).map_or(false, |l| l.head_at_as(block.timestamp, perspective).is_active))
        .cloned()
        .collect()
}

/// For each line overridden by a considered CLONE: which clone authored the
/// override and the timestamp its own cursor should be read at.
fn build_clone_overrides<'a>(
    block: &Block,
    clones_to_consider: &[BlockId],
    blocks: &'a HashMap<BlockId, Block>,
) -> HashMap<LineId, (&'a BlockId, u64)> {
    let mut overrides = HashMap::new();
    for clone_id in clones_to_consider {
        if let Some(clone) = blocks.get(clone_id) {
            if clone.origin.as_ref() == Some(&block.id) {
                for line_id in &clone.lines {
                    overrides.insert(*line_id, (&clone.id, clone.timestamp));
                }
            }
        }
    }
    overrides
}

/// 1-based inclusive range `child_lines` occupies within `parent_lines`,
/// assuming `child_lines` is a contiguous subsequence of it.
fn range_within(parent_lines: &[LineId], child_lines: &[LineId]) -> Option<(usize, usize)> {
    let first = *child_lines.first()?;
    let last = *child_lines.last()?;
    let start = parent_lines.iter().position(|id| *id == first)?;
    let end = parent_lines.iter().position(|id| *id == last)?;
    Some((start + 1, end + 1))
}
