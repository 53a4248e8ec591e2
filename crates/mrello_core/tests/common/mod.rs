#![allow(dead_code)]

use mrello_core::db::open_db_in_memory;
use mrello_core::{
    Actor, BoardColumn, BoardId, ColumnId, ColumnService, Position, SqliteColumnRepository,
    SqliteHierarchyRepository, SqliteTaskRepository, Task, TaskDraft, TaskService,
    WorkspaceAccess, WorkspaceId, WorkspaceService,
};
use rusqlite::Connection;
use uuid::Uuid;

pub type Access<'c> = WorkspaceAccess<SqliteHierarchyRepository<'c>>;
pub type Workspaces<'c> = WorkspaceService<SqliteHierarchyRepository<'c>, Access<'c>>;
pub type Columns<'c> = ColumnService<SqliteColumnRepository<'c>, Access<'c>>;
pub type Tasks<'c> = TaskService<SqliteTaskRepository<'c>, Access<'c>>;

pub fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn access(conn: &Connection) -> Access<'_> {
    WorkspaceAccess::new(SqliteHierarchyRepository::try_new(conn).unwrap())
}

pub fn workspaces(conn: &Connection) -> Workspaces<'_> {
    WorkspaceService::new(SqliteHierarchyRepository::try_new(conn).unwrap(), access(conn))
}

pub fn columns(conn: &Connection) -> Columns<'_> {
    ColumnService::new(SqliteColumnRepository::try_new(conn).unwrap(), access(conn))
}

pub fn tasks(conn: &Connection) -> Tasks<'_> {
    TaskService::new(SqliteTaskRepository::try_new(conn).unwrap(), access(conn))
}

/// One owner, one workspace, one empty board.
pub struct Seed {
    pub owner: Actor,
    pub workspace: WorkspaceId,
    pub board: BoardId,
}

pub fn seed_board(conn: &Connection) -> Seed {
    let service = workspaces(conn);
    let owner = service.create_user("owner").unwrap();
    let owner = Actor::new(owner.id);
    let workspace = service.create_workspace(owner, "Team", "").unwrap();
    let board = service
        .create_board(owner, workspace.id, "Sprint", "")
        .unwrap();
    Seed {
        owner,
        workspace: workspace.id,
        board: board.id,
    }
}

/// Registers `username` and enrolls them in the seeded workspace.
pub fn add_member(conn: &Connection, seed: &Seed, username: &str) -> Actor {
    let service = workspaces(conn);
    let user = service.create_user(username).unwrap();
    service
        .add_member(seed.owner, seed.workspace, user.id)
        .unwrap();
    Actor::new(user.id)
}

/// Registers `username` without any membership.
pub fn outsider(conn: &Connection, username: &str) -> Actor {
    Actor::new(workspaces(conn).create_user(username).unwrap().id)
}

pub fn seed_columns(conn: &Connection, seed: &Seed, titles: &[&str]) -> Vec<BoardColumn> {
    let service = columns(conn);
    titles
        .iter()
        .map(|title| service.create_column(seed.owner, seed.board, title).unwrap())
        .collect()
}

pub fn seed_tasks(conn: &Connection, seed: &Seed, column: ColumnId, titles: &[&str]) -> Vec<Task> {
    let service = tasks(conn);
    titles
        .iter()
        .map(|title| {
            service
                .create_task(seed.owner, column, &TaskDraft::titled(*title))
                .unwrap()
        })
        .collect()
}

pub fn column_titles(conn: &Connection, board: BoardId) -> Vec<String> {
    columns(conn)
        .list_columns(board)
        .unwrap()
        .into_iter()
        .map(|column| column.title)
        .collect()
}

pub fn task_titles(conn: &Connection, column: ColumnId) -> Vec<String> {
    tasks(conn)
        .list_tasks(column)
        .unwrap()
        .into_iter()
        .map(|task| task.title)
        .collect()
}

/// Raw stored positions under a parent, ascending.
pub fn stored_positions(conn: &Connection, table: &str, parent_column: &str, parent: Uuid) -> Vec<Position> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT position FROM {table} WHERE {parent_column} = ?1 ORDER BY position ASC;"
        ))
        .unwrap();
    let mut rows = stmt.query([parent.to_string()]).unwrap();
    let mut positions = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        positions.push(row.get(0).unwrap());
    }
    positions
}

pub fn column_positions(conn: &Connection, board: BoardId) -> Vec<Position> {
    stored_positions(conn, "board_columns", "board_uuid", board)
}

pub fn task_positions(conn: &Connection, column: ColumnId) -> Vec<Position> {
    stored_positions(conn, "tasks", "column_uuid", column)
}

pub fn dense(len: usize) -> Vec<Position> {
    (0..len as Position).collect()
}
