//! Workspace-membership access control.
//!
//! Rules:
//! - any workspace member (owner included) may mutate everything inside it;
//! - deletes need the workspace owner, or for tasks the task's assignee;
//! - assignees must be members of the task's workspace;
//! - a user's assignments are visible to anyone sharing a workspace with them.

use crate::model::actor::{AccessTarget, Actor, MemberRole};
use crate::model::board::UserId;
use crate::repo::hierarchy_repo::HierarchyRepository;
use crate::repo::{RepoError, RepoResult};

/// Access decisions consumed by services. Never consulted by the engine.
pub trait AccessControl {
    fn can_mutate(&self, actor: Actor, target: AccessTarget) -> RepoResult<bool>;
    fn can_delete(&self, actor: Actor, target: AccessTarget) -> RepoResult<bool>;
    /// Whether `user` may be assigned work placed under `target`.
    fn can_be_assigned(&self, user: UserId, target: AccessTarget) -> RepoResult<bool>;
    /// Whether `actor` may list the tasks assigned to `user`.
    fn can_view_assignments(&self, actor: Actor, user: UserId) -> RepoResult<bool>;
}

/// [`AccessControl`] backed by workspace membership rows.
#[derive(Clone, Copy)]
pub struct WorkspaceAccess<H: HierarchyRepository> {
    repo: H,
}

impl<H: HierarchyRepository> WorkspaceAccess<H> {
    pub fn new(repo: H) -> Self {
        Self { repo }
    }

    fn role(&self, user: UserId, target: AccessTarget) -> RepoResult<Option<MemberRole>> {
        let workspace = self
            .repo
            .resolve_workspace(target)?
            .ok_or(RepoError::NotFound {
                entity: target.entity(),
                id: target.id(),
            })?;
        self.repo.member_role(workspace, user)
    }
}

impl<H: HierarchyRepository> AccessControl for WorkspaceAccess<H> {
    fn can_mutate(&self, actor: Actor, target: AccessTarget) -> RepoResult<bool> {
        Ok(self.role(actor.user_id, target)?.is_some())
    }

    fn can_delete(&self, actor: Actor, target: AccessTarget) -> RepoResult<bool> {
        match self.role(actor.user_id, target)? {
            Some(MemberRole::Owner) => Ok(true),
            Some(MemberRole::Member) => match target {
                AccessTarget::Task(task) => {
                    Ok(self.repo.task_assignee(task)? == Some(actor.user_id))
                }
                _ => Ok(false),
            },
            None => Ok(false),
        }
    }

    fn can_be_assigned(&self, user: UserId, target: AccessTarget) -> RepoResult<bool> {
        self.can_mutate(Actor::new(user), target)
    }

    fn can_view_assignments(&self, actor: Actor, user: UserId) -> RepoResult<bool> {
        if actor.user_id == user {
            return Ok(true);
        }
        self.repo.shares_workspace(actor.user_id, user)
    }
}
