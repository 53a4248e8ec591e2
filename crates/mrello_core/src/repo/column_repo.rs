//! Column repository: columns ordered within a board.
//!
//! # Responsibility
//! - Persist columns and run their position changes through the engine.
//! - Duplicate a column together with its tasks.
//!
//! # Invariants
//! - Every position-mutating call is one `IMMEDIATE` transaction.
//! - Listing is deterministic: `position ASC, uuid ASC`.
//! - Deleting a column cascades to its tasks and closes the board gap.

use super::sibling_repo::{SiblingScope, SqliteSiblingStore};
use super::{ensure_connection_ready, parse_uuid, RepoResult};
use crate::model::board::{BoardColumn, BoardId, ColumnBulkUpdate, ColumnId};
use crate::position::{
    self, Placement, Position, PositionError, Relocation, SiblingStore,
};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const COLUMN_SELECT_SQL: &str = "SELECT uuid, board_uuid, title, position FROM board_columns";

/// Repository interface for board columns.
pub trait ColumnRepository {
    /// Appends a column at the tail of `board`.
    fn create_column(&self, board: BoardId, title: &str) -> RepoResult<BoardColumn>;
    fn get_column(&self, id: ColumnId) -> RepoResult<Option<BoardColumn>>;
    /// Columns of `board` in position order.
    fn list_columns(&self, board: BoardId) -> RepoResult<Vec<BoardColumn>>;
    fn count_columns(&self, board: BoardId) -> RepoResult<Position>;
    fn rename_column(&self, id: ColumnId, title: &str) -> RepoResult<BoardColumn>;
    fn reorder_column(&self, id: ColumnId, new_position: Position) -> RepoResult<Relocation>;
    /// Deletes the column and its tasks. Returns where the column was.
    fn delete_column(&self, id: ColumnId) -> RepoResult<Placement>;
    /// Inserts a copy titled `title` right after `id` and clones its tasks.
    fn duplicate_column(&self, id: ColumnId, title: &str) -> RepoResult<BoardColumn>;
    /// Applies one bulk instruction (rename, then reorder) atomically.
    fn apply_bulk_update(&self, update: &ColumnBulkUpdate) -> RepoResult<BoardColumn>;
}

/// SQLite-backed column repository.
#[derive(Clone, Copy)]
pub struct SqliteColumnRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteColumnRepository<'conn> {
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

impl ColumnRepository for SqliteColumnRepository<'_> {
    fn create_column(&self, board: BoardId, title: &str) -> RepoResult<BoardColumn> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Columns);
        let position = position::insert_at_tail(&store, board)?;

        let id = Uuid::new_v4();
        insert_column_row(&tx, id, board, title, position)?;
        let column = load_required_column(&tx, id)?;
        tx.commit()?;
        Ok(column)
    }

    fn get_column(&self, id: ColumnId) -> RepoResult<Option<BoardColumn>> {
        load_column(self.conn, id)
    }

    fn list_columns(&self, board: BoardId) -> RepoResult<Vec<BoardColumn>> {
        let mut stmt = self.conn.prepare(&format!(
            "{COLUMN_SELECT_SQL}
             WHERE board_uuid = ?1
             ORDER BY position ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([board.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_column_row(row)?);
        }
        Ok(items)
    }

    fn count_columns(&self, board: BoardId) -> RepoResult<Position> {
        let store = SqliteSiblingStore::new(self.conn, SiblingScope::Columns);
        if !store.parent_exists(board)? {
            return Err(PositionError::ParentNotFound(board).into());
        }
        store.count(board)
    }

    fn rename_column(&self, id: ColumnId, title: &str) -> RepoResult<BoardColumn> {
        let tx = self.begin()?;
        write_title(&tx, id, title)?;
        let column = load_required_column(&tx, id)?;
        tx.commit()?;
        Ok(column)
    }

    fn reorder_column(&self, id: ColumnId, new_position: Position) -> RepoResult<Relocation> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Columns);
        let relocation = position::reorder(&store, id, new_position)?;
        tx.commit()?;
        Ok(relocation)
    }

    fn delete_column(&self, id: ColumnId) -> RepoResult<Placement> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Columns);
        let removed = position::remove(&store, id)?;
        tx.commit()?;
        Ok(removed)
    }

    fn duplicate_column(&self, id: ColumnId, title: &str) -> RepoResult<BoardColumn> {
        let tx = self.begin()?;
        let store = SqliteSiblingStore::new(&tx, SiblingScope::Columns);
        let slot = position::open_slot_after(&store, id)?;

        let copy_id = Uuid::new_v4();
        insert_column_row(&tx, copy_id, slot.parent, title, slot.position)?;
        clone_tasks(&tx, id, copy_id)?;

        let copy = load_required_column(&tx, copy_id)?;
        tx.commit()?;
        Ok(copy)
    }

    fn apply_bulk_update(&self, update: &ColumnBulkUpdate) -> RepoResult<BoardColumn> {
        let tx = self.begin()?;
        if let Some(title) = update.title.as_deref() {
            write_title(&tx, update.id, title)?;
        }
        if let Some(new_position) = update.position {
            let store = SqliteSiblingStore::new(&tx, SiblingScope::Columns);
            position::reorder(&store, update.id, new_position)?;
        }
        let column = load_required_column(&tx, update.id)?;
        tx.commit()?;
        Ok(column)
    }
}

fn insert_column_row(
    conn: &Connection,
    id: ColumnId,
    board: BoardId,
    title: &str,
    position: Position,
) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO board_columns (uuid, board_uuid, title, position)
         VALUES (?1, ?2, ?3, ?4);",
        params![id.to_string(), board.to_string(), title, position],
    )?;
    Ok(())
}

fn write_title(conn: &Connection, id: ColumnId, title: &str) -> RepoResult<()> {
    let changed = conn.execute(
        "UPDATE board_columns
         SET title = ?2,
             updated_at = (strftime('%s', 'now') * 1000)
         WHERE uuid = ?1;",
        params![id.to_string(), title],
    )?;
    if changed == 0 {
        return Err(PositionError::MemberNotFound(id).into());
    }
    Ok(())
}

/// Copies every task of `source` into `target`, keeping positions verbatim.
///
/// `target` must be empty; the source set is dense, so the copy is too.
fn clone_tasks(conn: &Connection, source: ColumnId, target: ColumnId) -> RepoResult<usize> {
    let mut stmt = conn.prepare(
        "SELECT uuid
         FROM tasks
         WHERE column_uuid = ?1
         ORDER BY position ASC, uuid ASC;",
    )?;
    let mut rows = stmt.query([source.to_string()])?;
    let mut source_ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        source_ids.push(value);
    }

    for source_id in &source_ids {
        conn.execute(
            "INSERT INTO tasks (
                uuid, column_uuid, title, description, status, due_at, assignee_uuid, position
             )
             SELECT ?1, ?2, title, description, status, due_at, assignee_uuid, position
             FROM tasks
             WHERE uuid = ?3;",
            params![Uuid::new_v4().to_string(), target.to_string(), source_id],
        )?;
    }
    Ok(source_ids.len())
}

fn load_column(conn: &Connection, id: ColumnId) -> RepoResult<Option<BoardColumn>> {
    let mut stmt = conn.prepare(&format!("{COLUMN_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_column_row(row)?));
    }
    Ok(None)
}

fn load_required_column(conn: &Connection, id: ColumnId) -> RepoResult<BoardColumn> {
    load_column(conn, id)?.ok_or_else(|| PositionError::MemberNotFound(id).into())
}

fn parse_column_row(row: &Row<'_>) -> RepoResult<BoardColumn> {
    let uuid: String = row.get("uuid")?;
    let board: String = row.get("board_uuid")?;
    Ok(BoardColumn {
        id: parse_uuid(&uuid, "board_columns.uuid")?,
        board_id: parse_uuid(&board, "board_columns.board_uuid")?,
        title: row.get("title")?,
        position: row.get("position")?,
    })
}
