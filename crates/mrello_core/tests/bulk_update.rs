mod common;

use common::*;
use mrello_core::{ColumnBulkUpdate, ServiceError, TaskBulkUpdate, TaskStatus};
use serde_json::json;
use uuid::Uuid;

#[test]
fn column_batch_applies_in_input_order() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B", "C"]);

    let updates = vec![
        ColumnBulkUpdate {
            id: created[2].id,
            title: None,
            position: Some(0),
        },
        ColumnBulkUpdate {
            id: created[0].id,
            title: Some(" Alpha ".to_string()),
            position: Some(2),
        },
    ];
    let applied = columns(&conn)
        .bulk_update_columns(seed.owner, &updates)
        .unwrap();

    assert_eq!(applied.len(), 2);
    assert_eq!(applied[1].title, "Alpha");
    assert_eq!(applied[1].position, 2);
    assert_eq!(column_titles(&conn, seed.board), ["C", "B", "Alpha"]);
    assert_eq!(column_positions(&conn, seed.board), dense(3));
}

#[test]
fn later_item_targeting_same_slot_wins() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B", "C"]);

    let updates = vec![
        ColumnBulkUpdate {
            id: created[1].id,
            title: None,
            position: Some(0),
        },
        ColumnBulkUpdate {
            id: created[2].id,
            title: None,
            position: Some(0),
        },
    ];
    columns(&conn)
        .bulk_update_columns(seed.owner, &updates)
        .unwrap();

    assert_eq!(column_titles(&conn, seed.board), ["C", "B", "A"]);
}

#[test]
fn column_batch_stops_at_first_failure_and_keeps_earlier_items() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B", "C"]);

    let updates = vec![
        ColumnBulkUpdate {
            id: created[2].id,
            title: None,
            position: Some(0),
        },
        ColumnBulkUpdate {
            id: created[0].id,
            title: Some("Renamed".to_string()),
            position: Some(7),
        },
        ColumnBulkUpdate {
            id: created[1].id,
            title: None,
            position: Some(0),
        },
    ];
    let err = columns(&conn)
        .bulk_update_columns(seed.owner, &updates)
        .unwrap_err();

    assert_eq!(err.index, 1);
    assert_eq!(err.committed, 1);
    assert!(matches!(
        err.source,
        ServiceError::InvalidPosition {
            position: 7,
            max: 2
        }
    ));
    // The failing item's rename rolled back with its reorder.
    assert_eq!(column_titles(&conn, seed.board), ["C", "A", "B"]);
    assert_eq!(column_positions(&conn, seed.board), dense(3));
}

#[test]
fn task_batch_decoded_from_json_moves_reorders_and_patches() {
    let conn = setup();
    let seed = seed_board(&conn);
    let cols = seed_columns(&conn, &seed, &["Todo", "Done"]);
    let todo = seed_tasks(&conn, &seed, cols[0].id, &["a", "b", "c"]);
    seed_tasks(&conn, &seed, cols[1].id, &["x"]);

    let batch = json!([
        {
            "id": todo[0].id,
            "column_id": cols[1].id,
            "position": 0,
            "status": "done"
        },
        {
            "id": todo[2].id,
            "position": 0,
            "title": "  c   first "
        },
        {
            "id": todo[1].id,
            "column_id": cols[0].id,
            "description": "same column, no position"
        }
    ]);
    let updates: Vec<TaskBulkUpdate> = serde_json::from_value(batch).unwrap();
    assert_eq!(updates[0].fields.status, Some(TaskStatus::Done));
    assert_eq!(updates[2].position, None);

    let applied = tasks(&conn)
        .bulk_update_tasks(seed.owner, &updates)
        .unwrap();

    assert_eq!(applied[0].column_id, cols[1].id);
    assert_eq!(applied[0].status, TaskStatus::Done);
    assert_eq!(applied[1].title, "c first");
    assert_eq!(applied[2].description, "same column, no position");
    assert_eq!(applied[2].position, 1);

    assert_eq!(task_titles(&conn, cols[0].id), ["c first", "b"]);
    assert_eq!(task_positions(&conn, cols[0].id), dense(2));
    assert_eq!(task_titles(&conn, cols[1].id), ["a", "x"]);
    assert_eq!(task_positions(&conn, cols[1].id), dense(2));
}

#[test]
fn task_batch_reports_index_of_invalid_title() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["Todo"]).remove(0);
    let created = seed_tasks(&conn, &seed, column.id, &["a", "b"]);

    let updates: Vec<TaskBulkUpdate> = serde_json::from_value(json!([
        { "id": created[1].id, "position": 0 },
        { "id": created[0].id, "title": "   " },
    ]))
    .unwrap();
    let err = tasks(&conn)
        .bulk_update_tasks(seed.owner, &updates)
        .unwrap_err();

    assert_eq!(err.index, 1);
    assert!(matches!(err.source, ServiceError::InvalidTitle));
    assert_eq!(task_titles(&conn, column.id), ["b", "a"]);
}

#[test]
fn task_batch_with_unknown_task_reports_member_not_found() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["Todo"]).remove(0);
    seed_tasks(&conn, &seed, column.id, &["a"]);
    let missing = Uuid::new_v4();

    let updates = vec![TaskBulkUpdate {
        id: missing,
        column_id: None,
        position: Some(0),
        fields: Default::default(),
    }];
    let err = tasks(&conn)
        .bulk_update_tasks(seed.owner, &updates)
        .unwrap_err();

    assert_eq!(err.index, 0);
    assert_eq!(err.committed, 0);
    assert!(matches!(err.source, ServiceError::MemberNotFound(id) if id == missing));
}
