//! Core of the Mrello board store.
//!
//! Workspaces hold boards, boards hold ordered columns, columns hold ordered
//! tasks. This crate owns the ordering invariants and every write path.

pub mod db;
pub mod logging;
pub mod model;
pub mod position;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult, BUSY_TIMEOUT};
pub use logging::{default_log_level, init_logging, logging_status, LogSettings, LoggingError};
pub use model::actor::{AccessTarget, Actor, MemberRole};
pub use model::board::{
    Board, BoardColumn, BoardId, ColumnBulkUpdate, ColumnId, Task, TaskBulkUpdate, TaskDraft,
    TaskId, TaskPatch, TaskStatus, User, UserId, Workspace, WorkspaceId,
};
pub use position::{
    MemberId, ParentId, Placement, Position, PositionError, PositionResult, Relocation,
    SiblingStore, Slot,
};
pub use repo::column_repo::{ColumnRepository, SqliteColumnRepository};
pub use repo::hierarchy_repo::{HierarchyRepository, SqliteHierarchyRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use repo::{RepoError, RepoResult};
pub use service::access::{AccessControl, WorkspaceAccess};
pub use service::bulk::BulkError;
pub use service::column_service::{ColumnService, DUPLICATE_TITLE_SUFFIX};
pub use service::task_service::{TaskService, DUE_SOON_WINDOW_MS};
pub use service::workspace_service::WorkspaceService;
pub use service::{normalize_title, ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
