//! Task use-case service.
//!
//! # Responsibility
//! - Gate task mutations on workspace membership.
//! - Validate titles and assignees before any write.
//! - Route position changes to reorder or cross-column move.
//!
//! # Invariants
//! - New tasks are appended at the tail of their column.
//! - A move needs mutate rights on both the task and the target column.
//! - A task never ends up assigned to someone outside its workspace: moves
//!   that would strand the assignee are rejected.
//! - Deleting needs the workspace owner or the task's assignee.

use super::access::AccessControl;
use super::bulk::{reconcile, BulkError};
use super::{authorize, normalize_title, Gate, ServiceError, ServiceResult};
use crate::model::actor::{AccessTarget, Actor};
use crate::model::board::{
    ColumnId, Task, TaskBulkUpdate, TaskDraft, TaskId, TaskPatch, UserId,
};
use crate::position::{Placement, Position, Relocation};
use crate::repo::task_repo::TaskRepository;
use log::{info, warn};

/// How far ahead [`TaskService::due_soon_tasks`] looks, in milliseconds.
pub const DUE_SOON_WINDOW_MS: i64 = 3 * 24 * 60 * 60 * 1000;

/// Task use-case service.
pub struct TaskService<T: TaskRepository, A: AccessControl> {
    repo: T,
    access: A,
}

impl<T: TaskRepository, A: AccessControl> TaskService<T, A> {
    pub fn new(repo: T, access: A) -> Self {
        Self { repo, access }
    }

    /// Appends a task to `column`.
    pub fn create_task(
        &self,
        actor: Actor,
        column: ColumnId,
        draft: &TaskDraft,
    ) -> ServiceResult<Task> {
        let title = normalize_title(&draft.title)?;
        let target = AccessTarget::Column(column);
        authorize(
            &self.access,
            actor,
            target,
            Gate::Mutate,
            ServiceError::ParentNotFound,
        )?;
        if let Some(assignee) = draft.assignee_id {
            self.ensure_assignable(assignee, target)?;
        }

        let draft = TaskDraft {
            title,
            description: draft.description.trim().to_string(),
            ..draft.clone()
        };
        let task = self.repo.create_task(column, &draft)?;
        info!(
            "event=task_create module=service status=ok column={column} task={} position={}",
            task.id, task.position
        );
        Ok(task)
    }

    pub fn get_task(&self, id: TaskId) -> ServiceResult<Option<Task>> {
        Ok(self.repo.get_task(id)?)
    }

    pub fn list_tasks(&self, column: ColumnId) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks(column)?)
    }

    pub fn count_tasks(&self, column: ColumnId) -> ServiceResult<Position> {
        Ok(self.repo.count_tasks(column)?)
    }

    /// Tasks assigned to `assignee` that `actor` can see, earliest due first.
    ///
    /// Fails with `AccessDenied` unless both users share a workspace.
    pub fn tasks_assigned_to(&self, actor: Actor, assignee: UserId) -> ServiceResult<Vec<Task>> {
        if !self.access.can_view_assignments(actor, assignee)? {
            warn!(
                "event=access_denied module=service status=error actor={} entity=user id={assignee} gate=view",
                actor.user_id
            );
            return Err(ServiceError::AccessDenied {
                actor: actor.user_id,
                entity: "user",
                id: assignee,
            });
        }
        Ok(self.repo.list_assigned_tasks(assignee, actor.user_id)?)
    }

    /// Tasks assigned to `actor` due between `now` and `now + DUE_SOON_WINDOW_MS`.
    pub fn due_soon_tasks(&self, actor: Actor, now: i64) -> ServiceResult<Vec<Task>> {
        Ok(self.repo.list_tasks_due_between(
            actor.user_id,
            now,
            now.saturating_add(DUE_SOON_WINDOW_MS),
        )?)
    }

    /// Patches non-positional fields.
    pub fn update_task(&self, actor: Actor, id: TaskId, patch: &TaskPatch) -> ServiceResult<Task> {
        let patch = self.normalize_patch(patch)?;
        self.authorize_task(actor, id, Gate::Mutate)?;
        if let Some(assignee) = patch.assignee_id {
            self.ensure_assignable(assignee, AccessTarget::Task(id))?;
        }
        Ok(self.repo.update_task(id, &patch)?)
    }

    /// Moves a task to `new_position` within its column.
    pub fn reorder_task(
        &self,
        actor: Actor,
        id: TaskId,
        new_position: Position,
    ) -> ServiceResult<Relocation> {
        self.authorize_task(actor, id, Gate::Mutate)?;
        let relocation = self.repo.reorder_task(id, new_position)?;
        info!(
            "event=task_reorder module=service status=ok column={} task={id} from={} to={}",
            relocation.to.parent, relocation.from.position, relocation.to.position
        );
        Ok(relocation)
    }

    /// Moves a task into `new_column`, at `new_position` or its tail.
    pub fn move_task(
        &self,
        actor: Actor,
        id: TaskId,
        new_column: ColumnId,
        new_position: Option<Position>,
    ) -> ServiceResult<Relocation> {
        self.authorize_task(actor, id, Gate::Mutate)?;
        authorize(
            &self.access,
            actor,
            AccessTarget::Column(new_column),
            Gate::Mutate,
            ServiceError::ParentNotFound,
        )?;
        self.ensure_assignee_follows(id, new_column)?;
        let relocation = self.repo.move_task(id, new_column, new_position)?;
        log_move(&relocation);
        Ok(relocation)
    }

    /// Deletes a task and closes the gap in its column.
    pub fn delete_task(&self, actor: Actor, id: TaskId) -> ServiceResult<Placement> {
        self.authorize_task(actor, id, Gate::Delete)?;
        let removed = self.repo.delete_task(id)?;
        info!(
            "event=task_delete module=service status=ok column={} task={id} position={}",
            removed.parent, removed.position
        );
        Ok(removed)
    }

    /// Applies task instructions in order, one transaction each.
    pub fn bulk_update_tasks(
        &self,
        actor: Actor,
        updates: &[TaskBulkUpdate],
    ) -> Result<Vec<Task>, BulkError> {
        reconcile("tasks", updates, |update| {
            let fields = self.normalize_patch(&update.fields)?;
            self.authorize_task(actor, update.id, Gate::Mutate)?;
            if let Some(column) = update.column_id {
                authorize(
                    &self.access,
                    actor,
                    AccessTarget::Column(column),
                    Gate::Mutate,
                    ServiceError::ParentNotFound,
                )?;
            }
            match (fields.assignee_id, update.column_id) {
                (Some(assignee), Some(column)) => {
                    self.ensure_assignable(assignee, AccessTarget::Column(column))?;
                }
                (Some(assignee), None) => {
                    self.ensure_assignable(assignee, AccessTarget::Task(update.id))?;
                }
                (None, Some(column)) => self.ensure_assignee_follows(update.id, column)?,
                (None, None) => {}
            }

            let normalized = TaskBulkUpdate {
                id: update.id,
                column_id: update.column_id,
                position: update.position,
                fields,
            };
            Ok(self.repo.apply_bulk_update(&normalized)?)
        })
    }

    fn normalize_patch(&self, patch: &TaskPatch) -> ServiceResult<TaskPatch> {
        Ok(TaskPatch {
            title: patch.title.as_deref().map(normalize_title).transpose()?,
            description: patch
                .description
                .as_deref()
                .map(|value| value.trim().to_string()),
            ..patch.clone()
        })
    }

    fn authorize_task(&self, actor: Actor, id: TaskId, gate: Gate) -> ServiceResult<()> {
        authorize(
            &self.access,
            actor,
            AccessTarget::Task(id),
            gate,
            ServiceError::MemberNotFound,
        )
    }

    /// Fails when the task's current assignee could not be assigned in `column`.
    fn ensure_assignee_follows(&self, id: TaskId, column: ColumnId) -> ServiceResult<()> {
        let task = self
            .repo
            .get_task(id)?
            .ok_or(ServiceError::MemberNotFound(id))?;
        match task.assignee_id {
            Some(assignee) => self.ensure_assignable(assignee, AccessTarget::Column(column)),
            None => Ok(()),
        }
    }

    fn ensure_assignable(&self, user: UserId, target: AccessTarget) -> ServiceResult<()> {
        if !self.access.can_be_assigned(user, target)? {
            return Err(ServiceError::AssigneeNotMember(user));
        }
        Ok(())
    }
}

fn log_move(relocation: &Relocation) {
    info!(
        "event=task_move module=service status=ok task={} from_column={} from={} to_column={} to={}",
        relocation.to.member,
        relocation.from.parent,
        relocation.from.position,
        relocation.to.parent,
        relocation.to.position
    );
}
