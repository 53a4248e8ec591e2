//! Board hierarchy records and mutation requests.
//!
//! # Invariants
//! - `BoardColumn::position` is dense within `board_id`.
//! - `Task::position` is dense within `column_id`.
//! - Timestamps are epoch milliseconds.

use crate::position::Position;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;
pub type WorkspaceId = Uuid;
pub type BoardId = Uuid;
pub type ColumnId = Uuid;
pub type TaskId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// Top-level container. Unordered; members may mutate its boards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: WorkspaceId,
    pub title: String,
    pub description: String,
    pub owner_id: UserId,
}

/// Parent of an ordered column set. Boards themselves are unordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: BoardId,
    pub workspace_id: WorkspaceId,
    pub title: String,
    pub description: String,
    pub created_at: i64,
}

/// Ordered member of a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: ColumnId,
    pub board_id: BoardId,
    pub title: String,
    pub position: Position,
}

/// Task workflow state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }

    /// Parses the storage form, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "todo" => Some(Self::Todo),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            _ => None,
        }
    }
}

/// Ordered member of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub column_id: ColumnId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_at: Option<i64>,
    pub assignee_id: Option<UserId>,
    pub position: Position,
}

/// Input for creating a task. Position is always assigned at the tail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub due_at: Option<i64>,
    pub assignee_id: Option<UserId>,
}

impl TaskDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update of a task's non-positional fields. `None` keeps the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub due_at: Option<i64>,
    pub assignee_id: Option<UserId>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.due_at.is_none()
            && self.assignee_id.is_none()
    }
}

/// One instruction of a column bulk batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBulkUpdate {
    pub id: ColumnId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<Position>,
}

/// One instruction of a task bulk batch.
///
/// `column_id` different from the task's current column makes this a
/// cross-column move; `position` alone is a reorder inside the column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskBulkUpdate {
    pub id: TaskId,
    #[serde(default)]
    pub column_id: Option<ColumnId>,
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(flatten)]
    pub fields: TaskPatch,
}
