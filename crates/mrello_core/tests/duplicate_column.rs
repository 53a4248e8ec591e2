mod common;

use common::*;
use mrello_core::{ServiceError, TaskDraft, TaskStatus};
use uuid::Uuid;

#[test]
fn duplicate_inserts_copy_after_source_and_shifts_later_columns() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B", "C"]);

    let copy = columns(&conn)
        .duplicate_column(seed.owner, created[1].id)
        .unwrap();

    assert_eq!(copy.title, "B (Copy)");
    assert_eq!(copy.position, 2);
    assert_eq!(copy.board_id, seed.board);
    assert_eq!(column_titles(&conn, seed.board), ["A", "B", "B (Copy)", "C"]);
    assert_eq!(column_positions(&conn, seed.board), dense(4));

    let c = columns(&conn).get_column(created[2].id).unwrap().unwrap();
    assert_eq!(c.position, 3);
}

#[test]
fn duplicate_last_column_appends() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B"]);

    let copy = columns(&conn)
        .duplicate_column(seed.owner, created[1].id)
        .unwrap();

    assert_eq!(copy.position, 2);
    assert_eq!(column_titles(&conn, seed.board), ["A", "B", "B (Copy)"]);
}

#[test]
fn duplicate_clones_tasks_with_positions_and_fields() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B"]);
    let task_service = tasks(&conn);
    let source_tasks: Vec<_> = ["first", "second", "third"]
        .iter()
        .map(|title| {
            let draft = TaskDraft {
                description: format!("about {title}"),
                status: TaskStatus::Done,
                due_at: Some(42),
                assignee_id: Some(seed.owner.user_id),
                ..TaskDraft::titled(*title)
            };
            task_service
                .create_task(seed.owner, created[0].id, &draft)
                .unwrap()
        })
        .collect();

    let copy = columns(&conn)
        .duplicate_column(seed.owner, created[0].id)
        .unwrap();

    let copied = task_service.list_tasks(copy.id).unwrap();
    assert_eq!(copied.len(), source_tasks.len());
    for (source, clone) in source_tasks.iter().zip(&copied) {
        assert_ne!(source.id, clone.id);
        assert_eq!(clone.column_id, copy.id);
        assert_eq!(clone.title, source.title);
        assert_eq!(clone.description, source.description);
        assert_eq!(clone.status, TaskStatus::Done);
        assert_eq!(clone.due_at, Some(42));
        assert_eq!(clone.assignee_id, Some(seed.owner.user_id));
        assert_eq!(clone.position, source.position);
    }
    assert_eq!(task_positions(&conn, copy.id), dense(3));

    assert_eq!(
        task_titles(&conn, created[0].id),
        ["first", "second", "third"]
    );
    assert_eq!(column_titles(&conn, seed.board), ["A", "A (Copy)", "B"]);
}

#[test]
fn duplicate_empty_column_has_no_tasks() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["Empty"]);

    let copy = columns(&conn)
        .duplicate_column(seed.owner, created[0].id)
        .unwrap();

    assert_eq!(tasks(&conn).count_tasks(copy.id).unwrap(), 0);
}

#[test]
fn duplicate_missing_column_reports_member_not_found() {
    let conn = setup();
    let seed = seed_board(&conn);
    let missing = Uuid::new_v4();

    let err = columns(&conn)
        .duplicate_column(seed.owner, missing)
        .unwrap_err();
    assert!(matches!(err, ServiceError::MemberNotFound(id) if id == missing));
}

#[test]
fn outsider_cannot_duplicate() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B"]);
    let stranger = outsider(&conn, "stranger");

    let err = columns(&conn)
        .duplicate_column(stranger, created[0].id)
        .unwrap_err();

    assert!(matches!(err, ServiceError::AccessDenied { .. }));
    assert_eq!(column_titles(&conn, seed.board), ["A", "B"]);
}
