//! The embeddable facade: the one public type a host constructs and calls.
//!
//! Grounded on the teacher's `BlockRuntime`/`ExecutionEngine` split — a
//! thin, stateless-except-for-the-store wrapper translating host-facing
//! operations onto [`Store`] transactions. Every method here matches the
//! operation list an editor surface needs, one-to-one.

use crate::block::BlockInfo;
use crate::config::CoreConfig;
use crate::edit::MultiLineChange;
use crate::error::CoreResult;
use crate::ids::{BlockId, FileId, TagId};
use crate::store::Store;

pub struct Session {
    store: Store,
}

impl Session {
    pub fn new(config: CoreConfig) -> Self {
        Session { store: Store::new(config) }
    }

    pub fn load_file(&self, path: impl Into<String>, eol: Option<String>, content: &str) -> CoreResult<(FileId, BlockId)> {
        self.store.load_file(path.into(), eol, content)
    }

    pub fn get_root_block(&self, file_id: FileId) -> CoreResult<BlockId> {
        self.store.get_root_block(file_id)
    }

    pub fn get_block_info(&self, block_id: &BlockId) -> CoreResult<BlockInfo> {
        self.store.get_block_info(block_id)
    }

    pub fn get_children_info(&self, block_id: &BlockId) -> CoreResult<Vec<BlockInfo>> {
        self.store.get_children_info(block_id)
    }

    /// Direct child ids of a block, without the rest of `BlockInfo`. The
    /// traversal every "affected blocks" consumer ends up needing by hand;
    /// promoted here since it's core, not a collaborator's job.
    pub fn children_of(&self, block_id: &BlockId) -> CoreResult<Vec<BlockId>> {
        Ok(self.store.get_children_info(block_id)?.into_iter().map(|info| info.block_id).collect())
    }

    pub fn get_text(&self, block_id: &BlockId, clones_to_consider: &[BlockId]) -> CoreResult<String> {
        self.store.get_text(block_id, clones_to_consider)
    }

    pub fn get_active_line_count(&self, block_id: &BlockId) -> CoreResult<usize> {
        self.store.get_active_line_count(block_id)
    }

    pub fn insert_line_at(&self, block_id: &BlockId, n: usize, content: String) -> CoreResult<()> {
        self.store.insert_line_at(block_id, n, content).map(|_| ())
    }

    pub fn update_line(&self, block_id: &BlockId, n: usize, content: String) -> CoreResult<()> {
        self.store.update_line(block_id, n, content).map(|_| ())
    }

    pub fn change_lines(&self, block_id: &BlockId, change: MultiLineChange) -> CoreResult<Vec<BlockId>> {
        self.store.change_lines(block_id, change)
    }

    pub fn create_child(&self, block_id: &BlockId, start_line: usize, end_line: usize) -> CoreResult<Option<BlockId>> {
        self.store.create_child(block_id, start_line, end_line)
    }

    pub fn delete_block(&self, block_id: &BlockId) -> CoreResult<()> {
        self.store.delete_block(block_id)
    }

    pub fn copy(&self, block_id: &BlockId) -> CoreResult<BlockId> {
        self.store.copy(block_id)
    }

    pub fn apply_index(&self, block_id: &BlockId, i: usize) -> CoreResult<()> {
        self.store.apply_index(block_id, i)
    }

    pub fn apply_timestamp(&self, block_id: &BlockId, t: u64) -> CoreResult<()> {
        self.store.apply_timestamp(block_id, t)
    }

    pub fn create_tag(&self, block_id: &BlockId, name: impl Into<String>) -> CoreResult<TagId> {
        self.store.create_tag(block_id, name.into())
    }

    pub fn load_tag(&self, tag_id: &TagId) -> CoreResult<String> {
        self.store.load_tag(tag_id)
    }

    pub fn get_text_for_version(&self, tag_id: &TagId) -> CoreResult<String> {
        self.store.get_text_for_version(tag_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[test]
    fn import_then_read_round_trips() {
        let session = Session::new(test_config());
        let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();
        assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");
        assert_eq!(session.get_active_line_count(&root).unwrap(), 3);
    }
}
