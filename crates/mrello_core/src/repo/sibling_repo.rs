//! SQLite implementation of the sibling store.
//!
//! # Responsibility
//! - Map the two ordered tables (`board_columns` under `boards`, `tasks`
//!   under `board_columns`) onto one [`SiblingStore`] implementation.
//! - Express every shift as one range `UPDATE`.
//!
//! # Invariants
//! - The store borrows a connection that is already inside the caller's
//!   transaction; it never begins or commits on its own.

use super::{parse_uuid, RepoError, RepoResult};
use crate::position::{
    MemberId, ParentId, Placement, Position, PositionError, ShiftRange, SiblingStore,
};
use rusqlite::{params, Connection, OptionalExtension};

/// Which ordered table a store instance works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingScope {
    /// Columns ordered within a board.
    Columns,
    /// Tasks ordered within a column.
    Tasks,
}

impl SiblingScope {
    pub fn member_table(self) -> &'static str {
        match self {
            Self::Columns => "board_columns",
            Self::Tasks => "tasks",
        }
    }

    pub fn parent_column(self) -> &'static str {
        match self {
            Self::Columns => "board_uuid",
            Self::Tasks => "column_uuid",
        }
    }

    pub fn parent_table(self) -> &'static str {
        match self {
            Self::Columns => "boards",
            Self::Tasks => "board_columns",
        }
    }
}

/// Sibling store over one ordered table.
pub struct SqliteSiblingStore<'conn> {
    conn: &'conn Connection,
    scope: SiblingScope,
}

impl<'conn> SqliteSiblingStore<'conn> {
    pub fn new(conn: &'conn Connection, scope: SiblingScope) -> Self {
        Self { conn, scope }
    }
}

impl SiblingStore for SqliteSiblingStore<'_> {
    type Error = RepoError;

    fn parent_exists(&self, parent: ParentId) -> RepoResult<bool> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {parent_table} WHERE uuid = ?1);",
            parent_table = self.scope.parent_table(),
        );
        let exists: i64 = self
            .conn
            .query_row(&sql, [parent.to_string()], |row| row.get(0))?;
        Ok(exists == 1)
    }

    fn count(&self, parent: ParentId) -> RepoResult<Position> {
        let sql = format!(
            "SELECT COUNT(*) FROM {table} WHERE {parent_column} = ?1;",
            table = self.scope.member_table(),
            parent_column = self.scope.parent_column(),
        );
        let count: i64 = self
            .conn
            .query_row(&sql, [parent.to_string()], |row| row.get(0))?;
        Position::try_from(count).map_err(|_| {
            RepoError::InvalidData(format!(
                "{} sibling count {count} exceeds position range",
                self.scope.member_table()
            ))
        })
    }

    fn locate(&self, member: MemberId) -> RepoResult<Option<Placement>> {
        let sql = format!(
            "SELECT {parent_column}, position FROM {table} WHERE uuid = ?1;",
            table = self.scope.member_table(),
            parent_column = self.scope.parent_column(),
        );
        let row: Option<(String, Position)> = self
            .conn
            .query_row(&sql, [member.to_string()], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        row.map(|(parent, position)| {
            Ok(Placement {
                member,
                parent: parse_uuid(&parent, self.scope.parent_column())?,
                position,
            })
        })
        .transpose()
    }

    fn shift_range(
        &self,
        parent: ParentId,
        range: ShiftRange,
        exclude: Option<MemberId>,
    ) -> RepoResult<usize> {
        let sql = format!(
            "UPDATE {table}
             SET position = position + ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE {parent_column} = ?1
               AND position >= ?3
               AND (?4 IS NULL OR position <= ?4)
               AND (?5 IS NULL OR uuid <> ?5);",
            table = self.scope.member_table(),
            parent_column = self.scope.parent_column(),
        );
        let moved = self.conn.execute(
            &sql,
            params![
                parent.to_string(),
                range.delta,
                range.lo,
                range.hi,
                exclude.map(|id| id.to_string()),
            ],
        )?;
        Ok(moved)
    }

    fn set_position(
        &self,
        member: MemberId,
        parent: ParentId,
        position: Position,
    ) -> RepoResult<()> {
        let sql = format!(
            "UPDATE {table}
             SET {parent_column} = ?2,
                 position = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            table = self.scope.member_table(),
            parent_column = self.scope.parent_column(),
        );
        let changed = self.conn.execute(
            &sql,
            params![member.to_string(), parent.to_string(), position],
        )?;
        if changed == 0 {
            return Err(PositionError::MemberNotFound(member).into());
        }
        Ok(())
    }

    fn delete(&self, member: MemberId) -> RepoResult<()> {
        let sql = format!(
            "DELETE FROM {table} WHERE uuid = ?1;",
            table = self.scope.member_table(),
        );
        let changed = self.conn.execute(&sql, [member.to_string()])?;
        if changed == 0 {
            return Err(PositionError::MemberNotFound(member).into());
        }
        Ok(())
    }
}
