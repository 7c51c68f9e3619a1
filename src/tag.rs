//! Named bookmarks: a Block plus a timestamp, recoverable by name.

use crate::ids::{BlockId, TagId};

/// A saved point in a Block's timeline.
#[derive(Debug, Clone)]
pub struct Tag {
    pub id: TagId,
    pub block_id: BlockId,
    pub timestamp: u64,
    pub name: String,
    /// Text at capture time, cached so `load_tag` doesn't need to
    /// recompute it if the caller only wants the cached view.
    pub cached_text: String,
}
