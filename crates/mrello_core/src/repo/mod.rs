//! Repository layer over the SQLite board store.
//!
//! # Responsibility
//! - Keep every SQL statement behind repository traits.
//! - Run each position-mutating call as one `IMMEDIATE` transaction that
//!   drives the position engine through [`sibling_repo::SqliteSiblingStore`].
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - SQLite busy/locked failures surface as
//!   [`RepoError::ConcurrentModification`], never as partial writes.

pub mod column_repo;
pub mod hierarchy_repo;
pub mod sibling_repo;
pub mod task_repo;

use crate::db::migrations::{latest_version, schema_version};
use crate::db::{is_busy_error, DbError};
use crate::position::PositionError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors shared by all board-store repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Ordering rule rejected the operation before any write.
    Position(PositionError),
    /// Another writer held the database lock past the busy timeout.
    ConcurrentModification,
    /// Referenced non-ordered record does not exist.
    NotFound { entity: &'static str, id: Uuid },
    /// Unique constraint hit on user-visible data (e.g. username).
    Conflict(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Persisted row cannot be converted into a read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Position(err) => write!(f, "{err}"),
            Self::ConcurrentModification => {
                write!(f, "concurrent modification; retry the operation")
            }
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "board repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "board repository requires table `{table}`")
            }
            Self::InvalidData(message) => write!(f, "invalid board data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Position(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if value.is_busy() {
            return Self::ConcurrentModification;
        }
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_busy_error(&value) {
            return Self::ConcurrentModification;
        }
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<PositionError> for RepoError {
    fn from(value: PositionError) -> Self {
        Self::Position(value)
    }
}

const REQUIRED_TABLES: &[&str] = &[
    "users",
    "workspaces",
    "workspace_members",
    "boards",
    "board_columns",
    "tasks",
];

pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = schema_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for &table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::MissingRequiredTable(table));
        }
    }
    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn parse_optional_uuid(
    value: Option<String>,
    column: &'static str,
) -> RepoResult<Option<Uuid>> {
    value.map(|value| parse_uuid(&value, column)).transpose()
}
