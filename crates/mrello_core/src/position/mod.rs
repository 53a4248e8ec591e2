//! Dense sibling ordering for columns within boards and tasks within columns.
//!
//! # Responsibility
//! - Decide which siblings shift, and by how much, for every insert, remove,
//!   reorder and cross-parent move.
//! - Validate target positions before anything is written.
//!
//! # Invariants
//! - After every operation each touched parent holds positions `0..count`
//!   exactly once (dense, zero-based, gap-free, duplicate-free).
//! - The member being moved is never part of its own shift range.
//! - Operations never retry; callers own transactions and retry policy.
//!
//! The math lives in [`plan`] and is storage-free. [`engine`] drives it
//! against any [`SiblingStore`].

pub mod engine;
pub mod memory;
pub mod plan;
pub mod store;

use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub use engine::{
    insert_at, insert_at_tail, move_to_parent, open_slot_after, remove, reorder, Relocation, Slot,
};
pub use memory::MemorySiblingStore;
pub use plan::{ShiftRange, SlotBound};
pub use store::SiblingStore;

/// Zero-based index of a member inside its parent's sibling set.
pub type Position = i32;
/// Id of an ordered member (column or task).
pub type MemberId = Uuid;
/// Id of the parent scoping a sibling set (board or column).
pub type ParentId = Uuid;

pub type PositionResult<T> = Result<T, PositionError>;

/// Where one member currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub member: MemberId,
    pub parent: ParentId,
    pub position: Position,
}

/// Ordering failures. All of them are raised before any sibling moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionError {
    /// Target lies outside `[0, max]` for the requested operation.
    InvalidPosition { position: Position, max: Position },
    MemberNotFound(MemberId),
    ParentNotFound(ParentId),
}

impl Display for PositionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPosition { position, max } if *max < 0 => {
                write!(f, "position {position} is invalid: sibling set is empty")
            }
            Self::InvalidPosition { position, max } => {
                write!(f, "position {position} is outside valid range 0..={max}")
            }
            Self::MemberNotFound(id) => write!(f, "ordered member not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent not found: {id}"),
        }
    }
}

impl Error for PositionError {}
