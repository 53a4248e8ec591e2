//! Position engine operations driven against a [`SiblingStore`].
//!
//! Each function validates first and only then issues shifts, so a rejected
//! call leaves the store untouched even without a transaction. Shifts always
//! run before the moved member's own row is written.

use super::plan::{
    check_position, cross_parent_plan, insertion_shift, removal_shift, reorder_shift, SlotBound,
};
use super::store::SiblingStore;
use super::{MemberId, ParentId, Placement, Position, PositionError};

/// A free slot opened inside a parent, ready for a new member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub parent: ParentId,
    pub position: Position,
}

/// Before/after placement of a moved member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub from: Placement,
    pub to: Placement,
}

impl Relocation {
    pub fn is_noop(&self) -> bool {
        self.from == self.to
    }

    pub fn changed_parent(&self) -> bool {
        self.from.parent != self.to.parent
    }
}

/// Position for a new member appended to `parent`: the current count.
pub fn insert_at_tail<S: SiblingStore>(store: &S, parent: ParentId) -> Result<Position, S::Error> {
    require_parent(store, parent)?;
    store.count(parent)
}

/// Opens slot `position` in `parent` by shifting `[position, ..]` down one.
///
/// The caller writes the new member at the returned slot in the same unit of
/// work.
pub fn insert_at<S: SiblingStore>(
    store: &S,
    parent: ParentId,
    position: Position,
) -> Result<Slot, S::Error> {
    require_parent(store, parent)?;
    let count = store.count(parent)?;
    check_position(position, count, SlotBound::Insert)?;
    if position < count {
        store.shift_range(parent, insertion_shift(position), None)?;
    }
    Ok(Slot { parent, position })
}

/// Opens the slot directly after `source` in its parent.
pub fn open_slot_after<S: SiblingStore>(store: &S, source: MemberId) -> Result<Slot, S::Error> {
    let source = require_member(store, source)?;
    insert_at(store, source.parent, source.position + 1)
}

/// Moves `member` to `new_position` within its current parent.
pub fn reorder<S: SiblingStore>(
    store: &S,
    member: MemberId,
    new_position: Position,
) -> Result<Relocation, S::Error> {
    let from = require_member(store, member)?;
    let count = store.count(from.parent)?;
    check_position(new_position, count, SlotBound::Existing)?;

    if let Some(range) = reorder_shift(from.position, new_position) {
        store.shift_range(from.parent, range, Some(member))?;
        store.set_position(member, from.parent, new_position)?;
    }

    Ok(Relocation {
        from,
        to: Placement {
            position: new_position,
            ..from
        },
    })
}

/// Deletes `member` and closes the gap it leaves. Returns where it was.
pub fn remove<S: SiblingStore>(store: &S, member: MemberId) -> Result<Placement, S::Error> {
    let removed = require_member(store, member)?;
    store.delete(member)?;
    store.shift_range(removed.parent, removal_shift(removed.position), None)?;
    Ok(removed)
}

/// Moves `member` into `new_parent` at `new_position` (tail when `None`).
///
/// Moving into the member's own parent is a plain [`reorder`]; there the tail
/// default is the last existing slot.
pub fn move_to_parent<S: SiblingStore>(
    store: &S,
    member: MemberId,
    new_parent: ParentId,
    new_position: Option<Position>,
) -> Result<Relocation, S::Error> {
    let from = require_member(store, member)?;
    if from.parent == new_parent {
        let last = store.count(new_parent)? - 1;
        return reorder(store, member, new_position.unwrap_or(last));
    }

    require_parent(store, new_parent)?;
    let count = store.count(new_parent)?;
    let target = new_position.unwrap_or(count);
    check_position(target, count, SlotBound::Insert)?;

    let plan = cross_parent_plan(from.position, target);
    store.shift_range(from.parent, plan.close_gap, Some(member))?;
    store.shift_range(new_parent, plan.open_slot, Some(member))?;
    store.set_position(member, new_parent, plan.position)?;

    Ok(Relocation {
        from,
        to: Placement {
            member,
            parent: new_parent,
            position: plan.position,
        },
    })
}

fn require_member<S: SiblingStore>(store: &S, member: MemberId) -> Result<Placement, S::Error> {
    store
        .locate(member)?
        .ok_or_else(|| PositionError::MemberNotFound(member).into())
}

fn require_parent<S: SiblingStore>(store: &S, parent: ParentId) -> Result<(), S::Error> {
    if !store.parent_exists(parent)? {
        return Err(PositionError::ParentNotFound(parent).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::MemorySiblingStore;

    fn parent_with(store: &MemorySiblingStore, count: usize) -> (ParentId, Vec<MemberId>) {
        let parent = store.add_parent();
        let members = (0..count).map(|_| store.append(parent).unwrap()).collect();
        (parent, members)
    }

    #[test]
    fn reorder_to_front_shifts_earlier_siblings_back() {
        let store = MemorySiblingStore::new();
        let (parent, m) = parent_with(&store, 3);

        reorder(&store, m[2], 0).unwrap();

        assert_eq!(store.members_in_order(parent), vec![m[2], m[0], m[1]]);
        assert_eq!(store.positions(parent), vec![0, 1, 2]);
    }

    #[test]
    fn reorder_rejects_tail_slot_of_existing_set() {
        let store = MemorySiblingStore::new();
        let (parent, m) = parent_with(&store, 3);

        let err = reorder(&store, m[0], 3).unwrap_err();

        assert_eq!(
            err,
            PositionError::InvalidPosition {
                position: 3,
                max: 2
            }
        );
        assert_eq!(store.members_in_order(parent), m);
    }

    #[test]
    fn open_slot_after_shifts_later_siblings() {
        let store = MemorySiblingStore::new();
        let (parent, m) = parent_with(&store, 3);

        let slot = open_slot_after(&store, m[0]).unwrap();

        assert_eq!(slot, Slot { parent, position: 1 });
        assert_eq!(store.locate(m[1]).unwrap().unwrap().position, 2);
        assert_eq!(store.locate(m[2]).unwrap().unwrap().position, 3);
    }

    #[test]
    fn remove_closes_gap() {
        let store = MemorySiblingStore::new();
        let (parent, m) = parent_with(&store, 3);

        let removed = remove(&store, m[1]).unwrap();

        assert_eq!(removed.position, 1);
        assert_eq!(store.members_in_order(parent), vec![m[0], m[2]]);
        assert_eq!(store.positions(parent), vec![0, 1]);
    }

    #[test]
    fn move_to_other_parent_opens_slot_and_closes_gap() {
        let store = MemorySiblingStore::new();
        let (a, am) = parent_with(&store, 3);
        let (b, bm) = parent_with(&store, 2);

        let relocation = move_to_parent(&store, am[1], b, Some(0)).unwrap();

        assert!(relocation.changed_parent());
        assert_eq!(store.members_in_order(a), vec![am[0], am[2]]);
        assert_eq!(store.members_in_order(b), vec![am[1], bm[0], bm[1]]);
        assert_eq!(store.positions(b), vec![0, 1, 2]);
    }

    #[test]
    fn move_to_missing_parent_changes_nothing() {
        let store = MemorySiblingStore::new();
        let (a, am) = parent_with(&store, 2);
        let missing = uuid::Uuid::new_v4();

        let err = move_to_parent(&store, am[0], missing, None).unwrap_err();

        assert_eq!(err, PositionError::ParentNotFound(missing));
        assert_eq!(store.members_in_order(a), am);
    }
}
