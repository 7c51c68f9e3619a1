//! A file: an end-of-line convention plus its lines' stable order.

use crate::ids::{FileId, LineId};

/// An editor-visible file. Holds every line it has ever owned, in
/// ascending order key; lines are never removed from this list even once
/// their head version is inactive ("deleted").
#[derive(Debug, Clone)]
pub struct File {
    pub id: FileId,
    /// Host-supplied path, opaque to this core; used only for diagnostics.
    pub path: String,
    /// `"\n"` or `"\r\n"`.
    pub eol: String,
    /// Every line, ordered by its `OrderKey` ascending. Maintained by
    /// [`crate::store::Store`], which is the only place line insertion and
    /// renumbering happen (they need simultaneous access to every line's
    /// order key).
    pub(crate) lines: Vec<LineId>,
}

impl File {
    pub fn new(id: FileId, path: String, eol: String) -> Self {
        File {
            id,
            path,
            eol,
            lines: Vec::new(),
        }
    }

    /// All lines ever owned by this file, in order. Includes lines whose
    /// current head is inactive.
    pub fn all_lines(&self) -> &[LineId] {
        &self.lines
    }
}
