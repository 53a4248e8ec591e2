//! Storage-free position arithmetic.
//!
//! Every function here is total over valid input and touches no store. A
//! [`ShiftRange`] describes one atomic range update: "every sibling whose
//! position is in `[lo, hi]` moves by `delta`".

use super::{Position, PositionError, PositionResult};

/// Inclusive range of sibling positions plus the amount they move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftRange {
    pub lo: Position,
    /// Inclusive upper bound; `None` runs to the tail.
    pub hi: Option<Position>,
    pub delta: i32,
}

impl ShiftRange {
    pub fn contains(&self, position: Position) -> bool {
        position >= self.lo && self.hi.map_or(true, |hi| position <= hi)
    }

    /// Position after this shift is applied to a sibling at `position`.
    pub fn apply(&self, position: Position) -> Position {
        if self.contains(position) {
            position + self.delta
        } else {
            position
        }
    }
}

/// Which upper bound a target position is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotBound {
    /// New member entering the set: `[0, count]`.
    Insert,
    /// Member already in the set: `[0, count - 1]`.
    Existing,
}

/// Rejects `position` unless it is a legal target for a set of `count` siblings.
pub fn check_position(position: Position, count: Position, bound: SlotBound) -> PositionResult<()> {
    let max = match bound {
        SlotBound::Insert => count,
        SlotBound::Existing => count - 1,
    };
    if position < 0 || position > max {
        return Err(PositionError::InvalidPosition { position, max });
    }
    Ok(())
}

/// Shift for moving one member from `old` to `new` inside the same parent.
///
/// Moving earlier pushes `[new, old)` down by one; moving later pulls
/// `(old, new]` up by one. `None` when the member stays put.
pub fn reorder_shift(old: Position, new: Position) -> Option<ShiftRange> {
    if new < old {
        Some(ShiftRange {
            lo: new,
            hi: Some(old - 1),
            delta: 1,
        })
    } else if new > old {
        Some(ShiftRange {
            lo: old + 1,
            hi: Some(new),
            delta: -1,
        })
    } else {
        None
    }
}

/// Shift that closes the gap left by a member removed at `removed`.
pub fn removal_shift(removed: Position) -> ShiftRange {
    ShiftRange {
        lo: removed + 1,
        hi: None,
        delta: -1,
    }
}

/// Shift that opens slot `at` for an incoming member.
pub fn insertion_shift(at: Position) -> ShiftRange {
    ShiftRange {
        lo: at,
        hi: None,
        delta: 1,
    }
}

/// The two shifts of a cross-parent move, applied in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossParentPlan {
    /// Applied to the old parent.
    pub close_gap: ShiftRange,
    /// Applied to the new parent.
    pub open_slot: ShiftRange,
    pub position: Position,
}

pub fn cross_parent_plan(old: Position, new: Position) -> CrossParentPlan {
    CrossParentPlan {
        close_gap: removal_shift(old),
        open_slot: insertion_shift(new),
        position: new,
    }
}
