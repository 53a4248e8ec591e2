mod common;

use common::*;
use mrello_core::{
    Actor, ColumnId, ServiceError, Task, TaskBulkUpdate, TaskDraft, TaskPatch, WorkspaceId,
};
use rusqlite::Connection;

#[test]
fn outsider_cannot_reorder_and_positions_stay_put() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B", "C"]);
    let stranger = outsider(&conn, "stranger");

    let err = columns(&conn)
        .reorder_column(stranger, created[2].id, 0)
        .unwrap_err();

    match err {
        ServiceError::AccessDenied { actor, entity, id } => {
            assert_eq!(actor, stranger.user_id);
            assert_eq!(entity, "column");
            assert_eq!(id, created[2].id);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(column_titles(&conn, seed.board), ["A", "B", "C"]);
}

#[test]
fn outsider_cannot_create_columns_or_tasks() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["A"]).remove(0);
    let stranger = outsider(&conn, "stranger");

    let err = columns(&conn)
        .create_column(stranger, seed.board, "Sneaky")
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccessDenied { .. }));

    let err = tasks(&conn)
        .create_task(stranger, column.id, &TaskDraft::titled("Sneaky"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccessDenied { .. }));

    assert_eq!(columns(&conn).count_columns(seed.board).unwrap(), 1);
    assert_eq!(tasks(&conn).count_tasks(column.id).unwrap(), 0);
}

#[test]
fn member_may_mutate_but_only_owner_deletes_columns() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B"]);
    let member = add_member(&conn, &seed, "member");
    let service = columns(&conn);

    service.reorder_column(member, created[1].id, 0).unwrap();
    service
        .create_column(member, seed.board, "From member")
        .unwrap();
    assert_eq!(column_titles(&conn, seed.board), ["B", "A", "From member"]);

    let err = service.delete_column(member, created[0].id).unwrap_err();
    assert!(matches!(err, ServiceError::AccessDenied { .. }));
    assert_eq!(service.count_columns(seed.board).unwrap(), 3);

    service.delete_column(seed.owner, created[0].id).unwrap();
    assert_eq!(column_titles(&conn, seed.board), ["B", "From member"]);
}

#[test]
fn assignee_may_delete_own_task_but_other_members_may_not() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["A"]).remove(0);
    let assignee = add_member(&conn, &seed, "assignee");
    let bystander = add_member(&conn, &seed, "bystander");
    let service = tasks(&conn);

    let draft = TaskDraft {
        assignee_id: Some(assignee.user_id),
        ..TaskDraft::titled("Mine")
    };
    let mine = service.create_task(bystander, column.id, &draft).unwrap();
    let other = service
        .create_task(seed.owner, column.id, &TaskDraft::titled("Other"))
        .unwrap();

    let err = service.delete_task(bystander, mine.id).unwrap_err();
    assert!(matches!(err, ServiceError::AccessDenied { .. }));
    let err = service.delete_task(assignee, other.id).unwrap_err();
    assert!(matches!(err, ServiceError::AccessDenied { .. }));

    service.delete_task(assignee, mine.id).unwrap();
    assert_eq!(task_titles(&conn, column.id), ["Other"]);
    assert_eq!(task_positions(&conn, column.id), dense(1));
}

#[test]
fn removed_member_loses_access() {
    let conn = setup();
    let seed = seed_board(&conn);
    let created = seed_columns(&conn, &seed, &["A", "B"]);
    let member = add_member(&conn, &seed, "member");

    workspaces(&conn)
        .remove_member(seed.owner, seed.workspace, member.user_id)
        .unwrap();

    let err = columns(&conn)
        .reorder_column(member, created[1].id, 0)
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccessDenied { .. }));
}

#[test]
fn membership_changes_are_owner_only_and_owner_stays() {
    let conn = setup();
    let seed = seed_board(&conn);
    let member = add_member(&conn, &seed, "member");
    let newcomer = outsider(&conn, "newcomer");
    let service = workspaces(&conn);

    let err = service
        .add_member(member, seed.workspace, newcomer.user_id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::AccessDenied { .. }));

    let err = service
        .remove_member(seed.owner, seed.workspace, seed.owner.user_id)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    service
        .add_member(seed.owner, seed.workspace, newcomer.user_id)
        .unwrap();
    let visible = service.list_workspaces_for(newcomer).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, seed.workspace);
    assert_eq!(visible[0].owner_id, seed.owner.user_id);
}

#[test]
fn member_cannot_assign_outsider_via_update() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["A"]).remove(0);
    let created = seed_tasks(&conn, &seed, column.id, &["t"]);
    let stranger = outsider(&conn, "stranger");

    let patch = TaskPatch {
        assignee_id: Some(stranger.user_id),
        ..TaskPatch::default()
    };
    let err = tasks(&conn)
        .update_task(seed.owner, created[0].id, &patch)
        .unwrap_err();

    assert!(matches!(err, ServiceError::AssigneeNotMember(_)));
    let task = tasks(&conn).get_task(created[0].id).unwrap().unwrap();
    assert_eq!(task.assignee_id, None);
}

#[test]
fn usernames_are_unique_and_validated() {
    let conn = setup();
    let service = workspaces(&conn);

    let alice = service.create_user(" alice ").unwrap();
    assert_eq!(alice.username, "alice");
    assert_eq!(service.get_user(alice.id).unwrap().as_ref(), Some(&alice));
    assert_eq!(
        service.find_user_by_username("alice").unwrap(),
        Some(alice)
    );

    assert!(matches!(
        service.create_user("alice"),
        Err(ServiceError::Conflict(_))
    ));
    assert!(matches!(
        service.create_user("two words"),
        Err(ServiceError::InvalidUsername(_))
    ));
    assert!(matches!(
        service.create_user("  "),
        Err(ServiceError::InvalidUsername(_))
    ));
}

/// Second workspace owned by the seed owner, with one board and one column.
fn foreign_column(conn: &Connection, seed: &Seed) -> (WorkspaceId, ColumnId) {
    let workspace = workspaces(conn)
        .create_workspace(seed.owner, "Elsewhere", "")
        .unwrap();
    let board = workspaces(conn)
        .create_board(seed.owner, workspace.id, "Other", "")
        .unwrap();
    let column = columns(conn)
        .create_column(seed.owner, board.id, "Inbox")
        .unwrap();
    (workspace.id, column.id)
}

fn assigned_task(conn: &Connection, seed: &Seed, column: ColumnId, assignee: Actor) -> Task {
    let draft = TaskDraft {
        assignee_id: Some(assignee.user_id),
        ..TaskDraft::titled("Assigned")
    };
    tasks(conn).create_task(seed.owner, column, &draft).unwrap()
}

#[test]
fn move_into_workspace_without_the_assignee_is_rejected() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["A"]).remove(0);
    let member = add_member(&conn, &seed, "member");
    let task = assigned_task(&conn, &seed, column.id, member);
    let (elsewhere, target) = foreign_column(&conn, &seed);

    let err = tasks(&conn)
        .move_task(seed.owner, task.id, target, None)
        .unwrap_err();

    assert!(matches!(err, ServiceError::AssigneeNotMember(id) if id == member.user_id));
    let stored = tasks(&conn).get_task(task.id).unwrap().unwrap();
    assert_eq!(stored.column_id, column.id);
    assert_eq!(stored.assignee_id, Some(member.user_id));
    assert_eq!(tasks(&conn).count_tasks(target).unwrap(), 0);

    workspaces(&conn)
        .add_member(seed.owner, elsewhere, member.user_id)
        .unwrap();
    tasks(&conn)
        .move_task(seed.owner, task.id, target, None)
        .unwrap();
    assert_eq!(task_titles(&conn, target), ["Assigned"]);
    assert_eq!(task_positions(&conn, column.id), dense(0));
}

#[test]
fn bulk_move_checks_current_assignee_against_target_workspace() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["A"]).remove(0);
    let member = add_member(&conn, &seed, "member");
    let task = assigned_task(&conn, &seed, column.id, member);
    let (_, target) = foreign_column(&conn, &seed);

    let updates = vec![TaskBulkUpdate {
        id: task.id,
        column_id: Some(target),
        position: None,
        fields: TaskPatch::default(),
    }];
    let err = tasks(&conn)
        .bulk_update_tasks(seed.owner, &updates)
        .unwrap_err();

    assert_eq!(err.index, 0);
    assert_eq!(err.committed, 0);
    assert!(matches!(err.source, ServiceError::AssigneeNotMember(_)));
    assert_eq!(task_titles(&conn, column.id), ["Assigned"]);

    let reassigned = vec![TaskBulkUpdate {
        id: task.id,
        column_id: Some(target),
        position: None,
        fields: TaskPatch {
            assignee_id: Some(seed.owner.user_id),
            ..TaskPatch::default()
        },
    }];
    let applied = tasks(&conn)
        .bulk_update_tasks(seed.owner, &reassigned)
        .unwrap();
    assert_eq!(applied[0].column_id, target);
    assert_eq!(applied[0].assignee_id, Some(seed.owner.user_id));
}

#[test]
fn removing_member_clears_their_assignments_in_that_workspace() {
    let conn = setup();
    let seed = seed_board(&conn);
    let column = seed_columns(&conn, &seed, &["A"]).remove(0);
    let member = add_member(&conn, &seed, "member");
    let here = assigned_task(&conn, &seed, column.id, member);
    let (elsewhere, other_column) = foreign_column(&conn, &seed);
    workspaces(&conn)
        .add_member(seed.owner, elsewhere, member.user_id)
        .unwrap();
    let there = assigned_task(&conn, &seed, other_column, member);

    workspaces(&conn)
        .remove_member(seed.owner, seed.workspace, member.user_id)
        .unwrap();

    let service = tasks(&conn);
    assert_eq!(service.get_task(here.id).unwrap().unwrap().assignee_id, None);
    assert_eq!(
        service.get_task(there.id).unwrap().unwrap().assignee_id,
        Some(member.user_id)
    );
}
