//! Sibling store contract consumed by the position engine.

use super::{MemberId, ParentId, Placement, Position, PositionError, ShiftRange};

/// Durable ordered members keyed by parent id.
///
/// # Contract
/// - Every call made during one engine operation runs inside the caller's
///   unit of work (one database transaction for SQLite); a failure anywhere
///   discards all of it.
/// - `shift_range` is a single range update, never a per-row
///   read-modify-write loop.
/// - `count` and `locate` read current state; nothing is cached across calls.
pub trait SiblingStore {
    /// Store failure type; engine validation errors convert into it.
    type Error: From<PositionError>;

    fn parent_exists(&self, parent: ParentId) -> Result<bool, Self::Error>;

    /// Number of members currently under `parent`.
    fn count(&self, parent: ParentId) -> Result<Position, Self::Error>;

    fn locate(&self, member: MemberId) -> Result<Option<Placement>, Self::Error>;

    /// Moves every sibling under `parent` whose position is in `range` by
    /// `range.delta`, skipping `exclude`. Returns the number of rows moved.
    fn shift_range(
        &self,
        parent: ParentId,
        range: ShiftRange,
        exclude: Option<MemberId>,
    ) -> Result<usize, Self::Error>;

    /// Writes `member`'s parent and position.
    fn set_position(
        &self,
        member: MemberId,
        parent: ParentId,
        position: Position,
    ) -> Result<(), Self::Error>;

    fn delete(&self, member: MemberId) -> Result<(), Self::Error>;
}
