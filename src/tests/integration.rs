//! End-to-end scenarios run through a full [`Session`], mirroring the six
//! numbered walkthroughs in the design notes.

use crate::config::test_config;
use crate::edit::MultiLineChange;
use crate::error::CoreError;
use crate::session::Session;

use super::init_test_logging;

fn fresh_session() -> Session {
    init_test_logging();
    Session::new(test_config())
}

fn change(start_line: usize, start_col: usize, end_line: usize, end_col: usize, inserted: &str, line_text: &str) -> MultiLineChange {
    MultiLineChange {
        start_line,
        start_col,
        end_line,
        end_col,
        inserted_text: inserted.to_string(),
        line_text: line_text.to_string(),
    }
}

#[test]
fn scenario_1_import_and_read() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");
    assert_eq!(session.get_active_line_count(&root).unwrap(), 3);
    let info = session.get_block_info(&root).unwrap();
    assert_eq!(info.user_version_count, 1);
}

#[test]
fn scenario_2_single_line_edit_and_scrub() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    session.update_line(&root, 2, "Y".into()).unwrap();
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\nY\nz");

    let info = session.get_block_info(&root).unwrap();
    assert_eq!(info.user_version_count, 2);

    session.apply_index(&root, 0).unwrap();
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");

    session.apply_index(&root, 1).unwrap();
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\nY\nz");
}

#[test]
fn scenario_3_insert_mid_file_hides_before_birth() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    session.insert_line_at(&root, 2, "new".into()).unwrap();
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\nnew\ny\nz");

    session.apply_index(&root, 0).unwrap();
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");

    let info = session.get_block_info(&root).unwrap();
    session.apply_index(&root, info.current_version_index).unwrap();
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\nnew\ny\nz");
}

#[test]
fn scenario_4_child_snapshot_isolates_scrubbing() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    let child = session.create_child(&root, 1, 1).unwrap().unwrap();
    session.update_line(&child, 1, "a".into()).unwrap();
    session.update_line(&child, 1, "b".into()).unwrap();
    session.update_line(&child, 1, "c".into()).unwrap();

    assert_eq!(session.get_text(&child, &[]).unwrap(), "c");
    // The root block's own timestamp cursor never advanced (nothing was
    // edited through root), so it still reads line 1's pre-child content.
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");

    session.apply_index(&child, 0).unwrap();
    assert_eq!(session.get_text(&child, &[]).unwrap(), "x");
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");
}

#[test]
fn scenario_5_overlap_rejected() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    let _child = session.create_child(&root, 2, 3).unwrap().unwrap();
    let overlapping = session.create_child(&root, 1, 2).unwrap();
    assert!(overlapping.is_none());

    assert_eq!(session.get_children_info(&root).unwrap().len(), 1);
}

#[test]
fn scenario_6_tag_round_trip() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    session.update_line(&root, 1, "X".into()).unwrap();
    let tag = session.create_tag(&root, "checkpoint").unwrap();

    session.update_line(&root, 2, "Y".into()).unwrap();
    session.update_line(&root, 3, "Z".into()).unwrap();

    let captured = session.get_text_for_version(&tag).unwrap();
    assert_eq!(captured, "X\ny\nz");
    // Idempotent: current state is untouched by the peek.
    assert_eq!(session.get_text(&root, &[]).unwrap(), "X\nY\nZ");

    session.load_tag(&tag).unwrap();
    assert_eq!(session.get_text(&root, &[]).unwrap(), "X\ny\nz");
}

#[test]
fn change_lines_reports_affected_blocks() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();
    let child = session.create_child(&root, 2, 2).unwrap().unwrap();

    let affected = session.change_lines(&root, change(2, 0, 2, 1, "Y", "y")).unwrap();

    assert!(affected.contains(&root));
    assert!(affected.contains(&child));
    assert_eq!(session.get_active_line_count(&root).unwrap(), 3);
}

#[test]
fn clone_overrides_text_for_clones_to_consider() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny").unwrap();

    let clone = session.copy(&root).unwrap();
    session.update_line(&clone, 1, "cloned".into()).unwrap();

    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny");
    assert_eq!(session.get_text(&root, std::slice::from_ref(&clone)).unwrap(), "cloned\ny");
    assert_eq!(session.get_text(&clone, &[]).unwrap(), "cloned\ny");
}

#[test]
fn clone_edit_never_leaks_into_origin_once_origin_timestamp_passes_it() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny").unwrap();

    let clone = session.copy(&root).unwrap();
    session.update_line(&clone, 1, "cloned".into()).unwrap();

    // Root's own timestamp now advances past the clone's edit timestamp.
    session.update_line(&root, 2, "Y".into()).unwrap();

    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\nY");
    assert_eq!(session.get_text(&clone, &[]).unwrap(), "cloned\ny");
}

#[test]
fn update_line_out_of_range_leaves_state_unchanged() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    let err = session.update_line(&root, 0, "nope".into()).unwrap_err();
    assert!(matches!(err, CoreError::OutOfRange { .. }));
    let err = session.update_line(&root, 4, "nope".into()).unwrap_err();
    assert!(matches!(err, CoreError::OutOfRange { .. }));

    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");
}

#[test]
fn insert_line_at_out_of_range_leaves_state_unchanged() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    let err = session.insert_line_at(&root, 0, "nope".into()).unwrap_err();
    assert!(matches!(err, CoreError::OutOfRange { .. }));
    let err = session.insert_line_at(&root, 5, "nope".into()).unwrap_err();
    assert!(matches!(err, CoreError::OutOfRange { .. }));

    assert_eq!(session.get_active_line_count(&root).unwrap(), 3);
}

#[test]
fn create_child_out_of_range_leaves_state_unchanged() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    let err = session.create_child(&root, 2, 5).unwrap_err();
    assert!(matches!(err, CoreError::OutOfRange { .. }));
    assert!(session.get_children_info(&root).unwrap().is_empty());
}

#[test]
fn unknown_block_id_is_not_found() {
    let session = fresh_session();
    let (file_id, _) = session.load_file("/a", Some("\n".into()), "x").unwrap();
    let bogus = crate::ids::BlockId::child_of(&session.get_root_block(file_id).unwrap());

    let err = session.get_text(&bogus, &[]).unwrap_err();
    assert!(matches!(err, CoreError::NotFound(_)));
}

#[test]
fn delete_block_removes_children_recursively_and_untouches_lines() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "x\ny\nz").unwrap();

    let child = session.create_child(&root, 1, 2).unwrap().unwrap();
    let grandchild = session.create_child(&child, 1, 1).unwrap().unwrap();

    session.delete_block(&child).unwrap();

    assert!(session.get_children_info(&root).unwrap().is_empty());
    assert!(session.get_text(&grandchild, &[]).is_err());
    // Lines claimed by the deleted subtree are untouched on the file itself.
    assert_eq!(session.get_text(&root, &[]).unwrap(), "x\ny\nz");
}

#[test]
fn block_info_reports_range_in_parent_and_tags() {
    let session = fresh_session();
    let (_, root) = session.load_file("/a", Some("\n".into()), "w\nx\ny\nz").unwrap();

    let child = session.create_child(&root, 2, 3).unwrap().unwrap();
    let tag = session.create_tag(&child, "mark").unwrap();

    let info = session.get_block_info(&child).unwrap();
    assert_eq!(info.range_in_parent, Some((2, 3)));
    assert_eq!(info.tags, vec![tag]);

    let root_info = session.get_block_info(&root).unwrap();
    assert_eq!(root_info.range_in_parent, None);
}
