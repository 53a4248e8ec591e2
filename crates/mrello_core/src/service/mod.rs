//! Board use-case services.
//!
//! # Responsibility
//! - Gate every mutating call on an explicit [`Actor`] through
//!   [`access::AccessControl`].
//! - Normalize user-visible input before it reaches repositories.
//! - Fold repository errors into one caller-facing [`ServiceError`].
//!
//! # Invariants
//! - A denied or invalid request never reaches a repository write.
//! - Services hold no state besides their repositories.
//! - Access checks read committed state before the repository opens its
//!   write transaction; a membership revoked in between is honored from the
//!   next call on.

pub mod access;
pub mod bulk;
pub mod column_service;
pub mod task_service;
pub mod workspace_service;

use crate::model::actor::{AccessTarget, Actor};
use crate::model::board::UserId;
use crate::position::{Position, PositionError};
use crate::repo::RepoError;
use access::AccessControl;
use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors returned by board services.
#[derive(Debug)]
pub enum ServiceError {
    /// Title is blank after normalization.
    InvalidTitle,
    /// Username is blank or contains whitespace.
    InvalidUsername(String),
    /// Actor is not allowed to perform the operation on the target.
    AccessDenied {
        actor: UserId,
        entity: &'static str,
        id: Uuid,
    },
    /// Target position outside `[0, max]`.
    InvalidPosition { position: Position, max: Position },
    /// Ordered record (column or task) does not exist.
    MemberNotFound(Uuid),
    /// Parent of an ordered set (board or column) does not exist.
    ParentNotFound(Uuid),
    /// Unordered record (user, workspace) does not exist.
    NotFound { entity: &'static str, id: Uuid },
    /// Assignee is not a member of the task's workspace.
    AssigneeNotMember(UserId),
    /// Another writer held the lock; the call may be retried.
    ConcurrentModification,
    /// Unique constraint conflict.
    Conflict(String),
    /// Storage failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::InvalidUsername(value) => write!(f, "invalid username: `{value}`"),
            Self::AccessDenied { actor, entity, id } => {
                write!(f, "user {actor} may not modify {entity} {id}")
            }
            Self::InvalidPosition { position, max } => {
                write!(f, "invalid position {position}; expected 0..={max}")
            }
            Self::MemberNotFound(id) => write!(f, "member not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent not found: {id}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::AssigneeNotMember(id) => {
                write!(f, "assignee {id} is not a member of the workspace")
            }
            Self::ConcurrentModification => {
                write!(f, "concurrent modification; retry the operation")
            }
            Self::Conflict(message) => write!(f, "conflict: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PositionError> for ServiceError {
    fn from(value: PositionError) -> Self {
        match value {
            PositionError::InvalidPosition { position, max } => {
                Self::InvalidPosition { position, max }
            }
            PositionError::MemberNotFound(id) => Self::MemberNotFound(id),
            PositionError::ParentNotFound(id) => Self::ParentNotFound(id),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Position(err) => err.into(),
            RepoError::ConcurrentModification => Self::ConcurrentModification,
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Conflict(message) => Self::Conflict(message),
            other => Self::Repo(other),
        }
    }
}

impl ServiceError {
    /// `true` for failures caused by the request rather than storage.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::ConcurrentModification | Self::Repo(_))
    }
}

/// Trims and collapses internal whitespace runs to one space.
pub fn normalize_title(value: &str) -> ServiceResult<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        return Err(ServiceError::InvalidTitle);
    }
    Ok(collapsed.into_owned())
}

/// Which access question a call asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    Mutate,
    Delete,
}

/// Fails unless `actor` passes `gate` on `target`.
///
/// A target that does not resolve is reported through `missing`, so callers
/// choose between member-not-found and parent-not-found.
pub(crate) fn authorize<A: AccessControl>(
    access: &A,
    actor: Actor,
    target: AccessTarget,
    gate: Gate,
    missing: fn(Uuid) -> ServiceError,
) -> ServiceResult<()> {
    let decision = match gate {
        Gate::Mutate => access.can_mutate(actor, target),
        Gate::Delete => access.can_delete(actor, target),
    };
    let allowed = match decision {
        Ok(allowed) => allowed,
        Err(RepoError::NotFound { id, .. }) if id == target.id() => return Err(missing(id)),
        Err(err) => return Err(err.into()),
    };
    if !allowed {
        warn!(
            "event=access_denied module=service status=error actor={} entity={} id={} gate={:?}",
            actor.user_id,
            target.entity(),
            target.id(),
            gate
        );
        return Err(ServiceError::AccessDenied {
            actor: actor.user_id,
            entity: target.entity(),
            id: target.id(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_title_collapses_whitespace() {
        assert_eq!(
            normalize_title("  Sprint \t backlog\n  items ").unwrap(),
            "Sprint backlog items"
        );
    }

    #[test]
    fn normalize_title_rejects_blank() {
        assert!(matches!(
            normalize_title(" \n\t "),
            Err(ServiceError::InvalidTitle)
        ));
    }

    #[test]
    fn position_errors_keep_their_kind() {
        let id = Uuid::new_v4();
        let mapped: ServiceError = RepoError::Position(PositionError::ParentNotFound(id)).into();
        assert!(matches!(mapped, ServiceError::ParentNotFound(found) if found == id));

        let mapped: ServiceError = RepoError::ConcurrentModification.into();
        assert!(matches!(mapped, ServiceError::ConcurrentModification));
        assert!(!mapped.is_client_error());
    }
}
