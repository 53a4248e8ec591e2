//! Caller identity and access vocabulary.

use crate::model::board::{BoardId, ColumnId, TaskId, UserId, WorkspaceId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity on whose behalf a mutation runs.
///
/// Always passed explicitly; nothing in core reads an ambient "current user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
}

impl Actor {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Record an access decision is made about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessTarget {
    Workspace(WorkspaceId),
    Board(BoardId),
    Column(ColumnId),
    Task(TaskId),
}

impl AccessTarget {
    pub fn entity(self) -> &'static str {
        match self {
            Self::Workspace(_) => "workspace",
            Self::Board(_) => "board",
            Self::Column(_) => "column",
            Self::Task(_) => "task",
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Workspace(id) | Self::Board(id) | Self::Column(id) | Self::Task(id) => id,
        }
    }
}

/// An actor's standing inside one workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Member,
}
