//! Users, workspaces, membership and boards.
//!
//! # Invariants
//! - Membership changes are owner-only; the owner can never be removed.
//! - Removing a member clears their task assignments in that workspace.
//! - Any member may create or edit boards; only the owner edits or deletes
//!   the workspace and deletes boards.

use super::access::AccessControl;
use super::{authorize, normalize_title, Gate, ServiceError, ServiceResult};
use crate::model::actor::{AccessTarget, Actor};
use crate::model::board::{Board, BoardId, User, UserId, Workspace, WorkspaceId};
use crate::repo::hierarchy_repo::HierarchyRepository;
use log::info;

/// Workspace and board use-case service.
pub struct WorkspaceService<H: HierarchyRepository, A: AccessControl> {
    repo: H,
    access: A,
}

impl<H: HierarchyRepository, A: AccessControl> WorkspaceService<H, A> {
    pub fn new(repo: H, access: A) -> Self {
        Self { repo, access }
    }

    /// Registers a user. Usernames are trimmed and must not contain spaces.
    pub fn create_user(&self, username: &str) -> ServiceResult<User> {
        let username = username.trim();
        if username.is_empty() || username.chars().any(char::is_whitespace) {
            return Err(ServiceError::InvalidUsername(username.to_string()));
        }
        let user = self.repo.create_user(username)?;
        info!(
            "event=user_create module=service status=ok user={}",
            user.id
        );
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<Option<User>> {
        Ok(self.repo.get_user(id)?)
    }

    pub fn find_user_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        Ok(self.repo.find_user_by_username(username.trim())?)
    }

    /// Creates a workspace owned by `actor`.
    pub fn create_workspace(
        &self,
        actor: Actor,
        title: &str,
        description: &str,
    ) -> ServiceResult<Workspace> {
        let title = normalize_title(title)?;
        let workspace = self
            .repo
            .create_workspace(actor.user_id, title.as_str(), description.trim())?;
        info!(
            "event=workspace_create module=service status=ok workspace={} owner={}",
            workspace.id, actor.user_id
        );
        Ok(workspace)
    }

    pub fn get_workspace(&self, id: WorkspaceId) -> ServiceResult<Option<Workspace>> {
        Ok(self.repo.get_workspace(id)?)
    }

    pub fn list_workspaces_for(&self, actor: Actor) -> ServiceResult<Vec<Workspace>> {
        Ok(self.repo.list_workspaces_for(actor.user_id)?)
    }

    /// Renames a workspace and replaces its description. Owner only.
    pub fn update_workspace(
        &self,
        actor: Actor,
        workspace: WorkspaceId,
        title: &str,
        description: &str,
    ) -> ServiceResult<Workspace> {
        let title = normalize_title(title)?;
        self.require_owner(actor, workspace)?;
        let updated = self
            .repo
            .update_workspace(workspace, title.as_str(), description.trim())?;
        info!("event=workspace_update module=service status=ok workspace={workspace}");
        Ok(updated)
    }

    /// Deletes a workspace with everything under it. Owner only.
    pub fn delete_workspace(&self, actor: Actor, workspace: WorkspaceId) -> ServiceResult<()> {
        self.require_owner(actor, workspace)?;
        self.repo.delete_workspace(workspace)?;
        info!("event=workspace_delete module=service status=ok workspace={workspace}");
        Ok(())
    }

    pub fn add_member(
        &self,
        actor: Actor,
        workspace: WorkspaceId,
        user: UserId,
    ) -> ServiceResult<()> {
        self.require_owner(actor, workspace)?;
        self.repo.add_member(workspace, user)?;
        info!(
            "event=member_add module=service status=ok workspace={workspace} user={user}"
        );
        Ok(())
    }

    pub fn remove_member(
        &self,
        actor: Actor,
        workspace: WorkspaceId,
        user: UserId,
    ) -> ServiceResult<()> {
        self.require_owner(actor, workspace)?;
        let record = self
            .repo
            .get_workspace(workspace)?
            .ok_or(ServiceError::NotFound {
                entity: "workspace",
                id: workspace,
            })?;
        if record.owner_id == user {
            return Err(ServiceError::Conflict(
                "workspace owner cannot be removed".to_string(),
            ));
        }
        self.repo.remove_member(workspace, user)?;
        info!(
            "event=member_remove module=service status=ok workspace={workspace} user={user}"
        );
        Ok(())
    }

    pub fn create_board(
        &self,
        actor: Actor,
        workspace: WorkspaceId,
        title: &str,
        description: &str,
    ) -> ServiceResult<Board> {
        let title = normalize_title(title)?;
        authorize(
            &self.access,
            actor,
            AccessTarget::Workspace(workspace),
            Gate::Mutate,
            workspace_missing,
        )?;
        let board = self
            .repo
            .create_board(workspace, title.as_str(), description.trim())?;
        info!(
            "event=board_create module=service status=ok workspace={workspace} board={}",
            board.id
        );
        Ok(board)
    }

    pub fn get_board(&self, id: BoardId) -> ServiceResult<Option<Board>> {
        Ok(self.repo.get_board(id)?)
    }

    pub fn list_boards(&self, workspace: WorkspaceId) -> ServiceResult<Vec<Board>> {
        Ok(self.repo.list_boards(workspace)?)
    }

    /// Boards across every workspace `actor` belongs to.
    pub fn list_boards_for(&self, actor: Actor) -> ServiceResult<Vec<Board>> {
        Ok(self.repo.list_boards_for(actor.user_id)?)
    }

    pub fn update_board(
        &self,
        actor: Actor,
        board: BoardId,
        title: &str,
        description: &str,
    ) -> ServiceResult<Board> {
        let title = normalize_title(title)?;
        authorize(
            &self.access,
            actor,
            AccessTarget::Board(board),
            Gate::Mutate,
            board_missing,
        )?;
        let updated = self
            .repo
            .update_board(board, title.as_str(), description.trim())?;
        info!("event=board_update module=service status=ok board={board}");
        Ok(updated)
    }

    /// Deletes a board with its columns and tasks. Owner only.
    pub fn delete_board(&self, actor: Actor, board: BoardId) -> ServiceResult<()> {
        authorize(
            &self.access,
            actor,
            AccessTarget::Board(board),
            Gate::Delete,
            board_missing,
        )?;
        self.repo.delete_board(board)?;
        info!("event=board_delete module=service status=ok board={board}");
        Ok(())
    }

    fn require_owner(&self, actor: Actor, workspace: WorkspaceId) -> ServiceResult<()> {
        authorize(
            &self.access,
            actor,
            AccessTarget::Workspace(workspace),
            Gate::Delete,
            workspace_missing,
        )
    }
}

fn workspace_missing(id: WorkspaceId) -> ServiceError {
    ServiceError::NotFound {
        entity: "workspace",
        id,
    }
}

fn board_missing(id: BoardId) -> ServiceError {
    ServiceError::NotFound { entity: "board", id }
}
