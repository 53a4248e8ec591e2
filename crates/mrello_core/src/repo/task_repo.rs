//! Task repository: tasks ordered within a column.
//!
//! # Responsibility
//! - Persist tasks and their non-positional fields.
//! - Run in-column reorders and cross-column moves through the engine.
//!
//! # Invariants
//! - Every mutating call is one `IMMEDIATE` transaction.
//! - A bulk instruction's move and field patch commit or roll back together.

use super::sibling_repo::{SiblingScope, SqliteSiblingStore};
use super::{ensure_connection_ready, parse_optional_uuid, parse_uuid, RepoError, RepoResult};
use crate::model::board::{
    ColumnId, Task, TaskBulkUpdate, TaskDraft, TaskId, TaskPatch, TaskStatus, UserId,
};
use crate::position::{self, Placement, Position, PositionError, Relocation, SiblingStore};
use rusqlite::{params, Connection, Row, Rows, Transaction, TransactionBehavior};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    uuid,
    column_uuid,
    title,
    description,
    status,
    due_at,
    assignee_uuid,
    position
FROM tasks";

/// Repository interface for tasks.
pub trait TaskRepository {
    /// Appends a task at the tail of `column`.
    fn create_task(&self, column: ColumnId, draft: &TaskDraft) -> RepoResult<Task>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Tasks of `column` in position order.
    fn list_tasks(&self, column: ColumnId) -> RepoResult<Vec<Task>>;
    fn count_tasks(&self, column: ColumnId) -> RepoResult<Position>;
    /// Tasks assigned to `assignee` inside workspaces `viewer` belongs to,
    /// earliest due date first and undated tasks last.
    fn list_assigned_tasks(&self, assignee: UserId, viewer: UserId) -> RepoResult<Vec<Task>>;
    /// Tasks assigned to `assignee` with `from <= due_at <= until`, earliest first.
    fn list_tasks_due_between(
        &self,
        assignee: UserId,
        from: i64,
        until: i64,
    ) -> RepoResult<Vec<Task>>;
    /// Applies a field patch; never touches position.
    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task>;
    fn reorder_task(&self, id: TaskId, new_position: Position) -> RepoResult<Relocation>;
    /// Moves a task to `new_column`, at `new_position` or the tail.
    fn move_task(
        &self,
        id: TaskId,
        new_column: ColumnId,
        new_position: Option<Position>,
    ) -> RepoResult<Relocation>;
    fn delete_task(&self, id: TaskId) -> RepoResult<Placement>;
    /// Applies one bulk instruction (move or reorder, then patch) atomically.
    fn apply_bulk_update(&self, update: &TaskBulkUpdate) -> RepoResult<Task>;
}

/// SQLite-backed task repository.
#[derive(Clone, Copy)]
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn begin(&self) -> RepoResult<Transaction<'conn>> {
        Ok(Transaction::new_unchecked(
            self.conn,
            TransactionBehavior::Immediate,
        )?)
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, column: ColumnId, draft: &TaskDraft) -> RepoResult<Task> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Tasks);
        let position = position::insert_at_tail(&store, column)?;

        let id = Uuid::new_v4();
        tx.execute(
            "INSERT INTO tasks (
                uuid, column_uuid, title, description, status, due_at, assignee_uuid, position
             )
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                id.to_string(),
                column.to_string(),
                draft.title.as_str(),
                draft.description.as_str(),
                draft.status.as_str(),
                draft.due_at,
                draft.assignee_id.map(|value| value.to_string()),
                position,
            ],
        )?;
        let task = load_required_task(&tx, id)?;
        tx.commit()?;
        Ok(task)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        load_task(self.conn, id)
    }

    fn list_tasks(&self, column: ColumnId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE column_uuid = ?1
             ORDER BY position ASC, uuid ASC;"
        ))?;
        let rows = stmt.query([column.to_string()])?;
        collect_tasks(rows)
    }

    fn count_tasks(&self, column: ColumnId) -> RepoResult<Position> {
        let store = SqliteSiblingStore::new(self.conn, SiblingScope::Tasks);
        if !store.parent_exists(column)? {
            return Err(PositionError::ParentNotFound(column).into());
        }
        store.count(column)
    }

    fn list_assigned_tasks(&self, assignee: UserId, viewer: UserId) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE assignee_uuid = ?1
               AND column_uuid IN (
                   SELECT c.uuid
                   FROM board_columns c
                   INNER JOIN boards b ON b.uuid = c.board_uuid
                   INNER JOIN workspace_members m ON m.workspace_uuid = b.workspace_uuid
                   WHERE m.user_uuid = ?2
               )
             ORDER BY due_at IS NULL ASC, due_at ASC, created_at ASC, uuid ASC;"
        ))?;
        let rows = stmt.query(params![assignee.to_string(), viewer.to_string()])?;
        collect_tasks(rows)
    }

    fn list_tasks_due_between(
        &self,
        assignee: UserId,
        from: i64,
        until: i64,
    ) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE assignee_uuid = ?1
               AND due_at BETWEEN ?2 AND ?3
             ORDER BY due_at ASC, created_at ASC, uuid ASC;"
        ))?;
        let rows = stmt.query(params![assignee.to_string(), from, until])?;
        collect_tasks(rows)
    }

    fn update_task(&self, id: TaskId, patch: &TaskPatch) -> RepoResult<Task> {
        let tx = self.begin()?;
        write_patch(&tx, id, patch)?;
        let task = load_required_task(&tx, id)?;
        tx.commit()?;
        Ok(task)
    }

    fn reorder_task(&self, id: TaskId, new_position: Position) -> RepoResult<Relocation> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Tasks);
        let relocation = position::reorder(&store, id, new_position)?;
        tx.commit()?;
        Ok(relocation)
    }

    fn move_task(
        &self,
        id: TaskId,
        new_column: ColumnId,
        new_position: Option<Position>,
    ) -> RepoResult<Relocation> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Tasks);
        let relocation = position::move_to_parent(&store, id, new_column, new_position)?;
        tx.commit()?;
        Ok(relocation)
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<Placement> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Tasks);
        let removed = position::remove(&store, id)?;
        tx.commit()?;
        Ok(removed)
    }

    fn apply_bulk_update(&self, update: &TaskBulkUpdate) -> RepoResult<Task> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Tasks);
        let current = store
            .locate(update.id)?
            .ok_or(PositionError::MemberNotFound(update.id))?;

        match (update.column_id, update.position) {
            (Some(column), target) if column != current.parent => {
                position::move_to_parent(&store, update.id, column, target)?;
            }
            (_, Some(target)) => {
                position::reorder(&store, update.id, target)?;
            }
            _ => {}
        }

        if !update.fields.is_empty() {
            write_patch(&tx, update.id, &update.fields)?;
        }
        let task = load_required_task(&tx, update.id)?;
        tx.commit()?;
        Ok(task)
    }
}

fn write_patch(conn: &Connection, id: TaskId, patch: &TaskPatch) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE tasks
         SET title = COALESCE(?2, title),
             description = COALESCE(?3, description),
             status = COALESCE(?4, status),
             due_at = COALESCE(?5, due_at),
             assignee_uuid = COALESCE(?6, assignee_uuid),
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        params![
            id.to_string(),
            patch.title.as_deref(),
            patch.description.as_deref(),
            patch.status.map(TaskStatus::as_str),
            patch.due_at,
            patch.assignee_id.map(|value| value.to_string()),
        ],
    )?;
    if changed == 0 {
        return Err(PositionError::MemberNotFound(id).into());
    }
    Ok(())
}

fn load_task(conn: &Connection, id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn load_required_task(conn: &Connection, id: TaskId) -> RepoResult<Task> {
    load_task(conn, id)?.ok_or_else(|| PositionError::MemberNotFound(id).into())
}

fn collect_tasks(mut rows: Rows<'_>) -> RepoResult<Vec<Task>> {
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse_task_row(row)?);
    }
    Ok(items)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let uuid: String = row.get("uuid")?;
    let column: String = row.get("column_uuid")?;
    let status: String = row.get("status")?;
    let assignee: Option<String> = row.get("assignee_uuid")?;

    let status = TaskStatus::parse(&status)
        .ok_or_else(|| RepoError::InvalidData(format!("invalid task status `{status}`")))?;

    Ok(Task {
        id: parse_uuid(&uuid, "tasks.uuid")?,
        column_id: parse_uuid(&column, "tasks.column_uuid")?,
        title: row.get("title")?,
        description: row.get("description")?,
        status,
        due_at: row.get("due_at")?,
        assignee_id: parse_optional_uuid(assignee, "tasks.assignee_uuid")?,
        position: row.get("position")?,
    })
}
