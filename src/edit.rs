//! Classifies a raw multi-line text edit into a line-level diff plan:
//! which existing lines change, which are deleted, and which new content
//! needs brand-new lines.

use crate::ids::LineId;

/// A text-editor change: a 1-based, inclusive-exclusive range plus the
/// text that replaced it. `line_text` is the pre-edit combined content of
/// `start_line..=end_line`, eol-joined — kept alongside `inserted_text` so
/// the classification below can compare the insertion point against the
/// original line boundaries (leading whitespace, trimmed end) without the
/// caller having to precompute that itself.
#[derive(Debug, Clone)]
pub struct MultiLineChange {
    pub start_line: usize,
    pub start_col: usize,
    pub end_line: usize,
    pub end_col: usize,
    pub inserted_text: String,
    pub line_text: String,
}

/// Per-edit classification flags, computed once and consulted by the diff
/// planner below.
#[derive(Debug, Clone, Copy, Default)]
struct Classification {
    starts_with_eol: bool,
    ends_with_eol: bool,
    inserted_at_start_of_start_line: bool,
    inserted_at_end_of_start_line: bool,
    one_line_insert_only: bool,
    push_start_line_down: bool,
    push_start_line_up: bool,
}

fn classify(change: &MultiLineChange, eol: &str, original_first: &str) -> Classification {
    let starts_with_eol = change.inserted_text.starts_with(eol);
    // Stricter variant: the literal eol marker must terminate the inserted
    // text. No trailing-whitespace tolerance (resolved open question).
    let ends_with_eol = change.inserted_text.ends_with(eol);

    let leading_ws = original_first.len() - original_first.trim_start().len();
    let trimmed_end = original_first.trim_end().len();

    let inserted_at_start_of_start_line = change.start_col <= leading_ws;
    let inserted_at_end_of_start_line = change.start_col >= trimmed_end;
    let one_line_insert_only = change.start_line == change.end_line && change.start_col == change.end_col;

    Classification {
        starts_with_eol,
        ends_with_eol,
        inserted_at_start_of_start_line,
        inserted_at_end_of_start_line,
        one_line_insert_only,
        push_start_line_down: one_line_insert_only && inserted_at_start_of_start_line && ends_with_eol,
        push_start_line_up: one_line_insert_only && inserted_at_end_of_start_line && starts_with_eol,
    }
}

/// The line-level operations needed to reconcile the VCS line list with a
/// raw text edit.
#[derive(Debug, Clone, Default)]
pub struct EditPlan {
    /// Existing lines beyond the new content's length: appended a
    /// DELETION version.
    pub deletions: Vec<LineId>,
    /// Existing lines matched 1:1 with new content: appended a CHANGE
    /// version.
    pub changes: Vec<(LineId, String)>,
    /// New content with no existing line to match: create via
    /// `insert_line_at`, in order, all at `insert_at_position`.
    pub insertions: Vec<String>,
    /// 1-based position for the first (and, after each insert shifts the
    /// list, every subsequent) new line.
    pub insert_at_position: usize,
}

/// Build the [`EditPlan`] for `change`, given the Lines currently occupying
/// its (pre-edit) affected range, in order.
///
/// `vcs_lines` must be the active lines within `[change.start_line,
/// change.end_line]` (1-based, inclusive) at the moment of the edit — empty
/// for a pure push-insert, since those never touch an existing line.
pub fn plan_change(change: &MultiLineChange, eol: &str, vcs_lines: &[LineId]) -> EditPlan {
    let original_lines: Vec<&str> = change.line_text.split(eol).collect();
    let original_first = original_lines.first().copied().unwrap_or("");
    let original_last = original_lines.last().copied().unwrap_or("");

    let classification = classify(change, eol, original_first);

    let prefix_end = change.start_col.min(original_first.len());
    let suffix_start = change.end_col.min(original_last.len());
    let new_range_text = format!(
        "{}{}{}",
        &original_first[..prefix_end],
        change.inserted_text,
        &original_last[suffix_start..]
    );
    let mut modified_lines: Vec<String> = new_range_text.split(eol).map(str::to_string).collect();

    let mut start_line = change.start_line;
    let is_push = classification.push_start_line_up || classification.push_start_line_down;
    if classification.push_start_line_up {
        if !modified_lines.is_empty() {
            modified_lines.remove(0);
        }
        start_line += 1;
    } else if classification.push_start_line_down {
        modified_lines.pop();
        // The adjusted range [start_line, start_line - 1] is empty: the
        // pushed-down/up original line is untouched, never part of the diff.
    }

    // A pure push never touches an existing line: the adjusted range is
    // always empty, regardless of what the caller passed for the
    // (pre-adjustment) range.
    let effective_vcs: &[LineId] = if is_push { &[] } else { vcs_lines };

    let common = effective_vcs.len().min(modified_lines.len());
    let deletions = effective_vcs[common..].to_vec();
    let changes = effective_vcs[..common]
        .iter()
        .cloned()
        .zip(modified_lines[..common].iter().cloned())
        .collect();
    let insertions = modified_lines[common..].to_vec();

    EditPlan {
        deletions,
        changes,
        insertions,
        insert_at_position: start_line + common,
    }
}
