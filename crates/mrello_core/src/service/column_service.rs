//! Column use-case service.
//!
//! # Responsibility
//! - Gate column mutations on workspace membership.
//! - Provide create/rename/reorder/delete, duplication and bulk updates.
//!
//! # Invariants
//! - New columns are appended at the tail of their board.
//! - Duplicates land directly after their source.
//! - Deleting needs delete rights on the column's workspace.

use super::access::AccessControl;
use super::bulk::{reconcile, BulkError};
use super::{authorize, normalize_title, Gate, ServiceError, ServiceResult};
use crate::model::actor::{AccessTarget, Actor};
use crate::model::board::{BoardColumn, BoardId, ColumnBulkUpdate, ColumnId};
use crate::position::{Placement, Position, Relocation};
use crate::repo::column_repo::ColumnRepository;
use log::info;

/// Suffix appended to the title of a duplicated column.
pub const DUPLICATE_TITLE_SUFFIX: &str = " (Copy)";

/// Column use-case service.
pub struct ColumnService<C: ColumnRepository, A: AccessControl> {
    repo: C,
    access: A,
}

impl<C: ColumnRepository, A: AccessControl> ColumnService<C, A> {
    pub fn new(repo: C, access: A) -> Self {
        Self { repo, access }
    }

    /// Appends a new column to `board`.
    pub fn create_column(
        &self,
        actor: Actor,
        board: BoardId,
        title: &str,
    ) -> ServiceResult<BoardColumn> {
        let title = normalize_title(title)?;
        authorize(
            &self.access,
            actor,
            AccessTarget::Board(board),
            Gate::Mutate,
            ServiceError::ParentNotFound,
        )?;
        let column = self.repo.create_column(board, title.as_str())?;
        info!(
            "event=column_create module=service status=ok board={board} column={} position={}",
            column.id, column.position
        );
        Ok(column)
    }

    pub fn get_column(&self, id: ColumnId) -> ServiceResult<Option<BoardColumn>> {
        Ok(self.repo.get_column(id)?)
    }

    pub fn list_columns(&self, board: BoardId) -> ServiceResult<Vec<BoardColumn>> {
        Ok(self.repo.list_columns(board)?)
    }

    pub fn count_columns(&self, board: BoardId) -> ServiceResult<Position> {
        Ok(self.repo.count_columns(board)?)
    }

    pub fn rename_column(
        &self,
        actor: Actor,
        id: ColumnId,
        title: &str,
    ) -> ServiceResult<BoardColumn> {
        let title = normalize_title(title)?;
        self.authorize_column(actor, id, Gate::Mutate)?;
        Ok(self.repo.rename_column(id, title.as_str())?)
    }

    /// Moves a column to `new_position` within its board.
    pub fn reorder_column(
        &self,
        actor: Actor,
        id: ColumnId,
        new_position: Position,
    ) -> ServiceResult<Relocation> {
        self.authorize_column(actor, id, Gate::Mutate)?;
        let relocation = self.repo.reorder_column(id, new_position)?;
        info!(
            "event=column_reorder module=service status=ok board={} column={id} from={} to={}",
            relocation.to.parent, relocation.from.position, relocation.to.position
        );
        Ok(relocation)
    }

    /// Deletes a column with its tasks and closes the gap in the board.
    pub fn delete_column(&self, actor: Actor, id: ColumnId) -> ServiceResult<Placement> {
        self.authorize_column(actor, id, Gate::Delete)?;
        let removed = self.repo.delete_column(id)?;
        info!(
            "event=column_delete module=service status=ok board={} column={id} position={}",
            removed.parent, removed.position
        );
        Ok(removed)
    }

    /// Copies a column and its tasks into the slot right after it.
    pub fn duplicate_column(&self, actor: Actor, id: ColumnId) -> ServiceResult<BoardColumn> {
        let source = self
            .repo
            .get_column(id)?
            .ok_or(ServiceError::MemberNotFound(id))?;
        self.authorize_column(actor, id, Gate::Mutate)?;

        let title = format!("{}{DUPLICATE_TITLE_SUFFIX}", source.title);
        let copy = self.repo.duplicate_column(id, title.as_str())?;
        info!(
            "event=column_duplicate module=service status=ok board={} source={id} column={} position={}",
            copy.board_id, copy.id, copy.position
        );
        Ok(copy)
    }

    /// Applies column instructions in order, one transaction each.
    pub fn bulk_update_columns(
        &self,
        actor: Actor,
        updates: &[ColumnBulkUpdate],
    ) -> Result<Vec<BoardColumn>, BulkError> {
        reconcile("columns", updates, |update| {
            let title = update.title.as_deref().map(normalize_title).transpose()?;
            self.authorize_column(actor, update.id, Gate::Mutate)?;
            let normalized = ColumnBulkUpdate {
                id: update.id,
                title,
                position: update.position,
            };
            Ok(self.repo.apply_bulk_update(&normalized)?)
        })
    }

    fn authorize_column(&self, actor: Actor, id: ColumnId, gate: Gate) -> ServiceResult<()> {
        authorize(
            &self.access,
            actor,
            AccessTarget::Column(id),
            gate,
            ServiceError::MemberNotFound,
        )
    }
}
