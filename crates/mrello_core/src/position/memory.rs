//! In-process sibling store.
//!
//! Holds placements in ordinary collections behind `RefCell`. Nothing is
//! transactional: engine operations validate before they shift, so a failed
//! call still leaves it unchanged.

use super::engine::insert_at_tail;
use super::store::SiblingStore;
use super::{MemberId, ParentId, Placement, Position, PositionError, ShiftRange};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemorySiblingStore {
    parents: RefCell<BTreeSet<ParentId>>,
    members: RefCell<BTreeMap<MemberId, Placement>>,
}

impl MemorySiblingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh empty parent and returns its id.
    pub fn add_parent(&self) -> ParentId {
        let parent = Uuid::new_v4();
        self.parents.borrow_mut().insert(parent);
        parent
    }

    /// Appends a fresh member at the tail of `parent`.
    pub fn append(&self, parent: ParentId) -> Result<MemberId, PositionError> {
        let position = insert_at_tail(self, parent)?;
        let member = Uuid::new_v4();
        self.set_position(member, parent, position)?;
        Ok(member)
    }

    /// Members of `parent` ordered by position.
    pub fn members_in_order(&self, parent: ParentId) -> Vec<MemberId> {
        let mut placements: Vec<Placement> = self
            .members
            .borrow()
            .values()
            .filter(|placement| placement.parent == parent)
            .copied()
            .collect();
        placements.sort_by_key(|placement| (placement.position, placement.member));
        placements.into_iter().map(|placement| placement.member).collect()
    }

    /// Sorted positions under `parent`, duplicates kept.
    pub fn positions(&self, parent: ParentId) -> Vec<Position> {
        let mut positions: Vec<Position> = self
            .members
            .borrow()
            .values()
            .filter(|placement| placement.parent == parent)
            .map(|placement| placement.position)
            .collect();
        positions.sort_unstable();
        positions
    }
}

impl SiblingStore for MemorySiblingStore {
    type Error = PositionError;

    fn parent_exists(&self, parent: ParentId) -> Result<bool, Self::Error> {
        Ok(self.parents.borrow().contains(&parent))
    }

    fn count(&self, parent: ParentId) -> Result<Position, Self::Error> {
        let count = self
            .members
            .borrow()
            .values()
            .filter(|placement| placement.parent == parent)
            .count();
        Ok(count as Position)
    }

    fn locate(&self, member: MemberId) -> Result<Option<Placement>, Self::Error> {
        Ok(self.members.borrow().get(&member).copied())
    }

    fn shift_range(
        &self,
        parent: ParentId,
        range: ShiftRange,
        exclude: Option<MemberId>,
    ) -> Result<usize, Self::Error> {
        let mut moved = 0;
        for placement in self.members.borrow_mut().values_mut() {
            if placement.parent != parent
                || Some(placement.member) == exclude
                || !range.contains(placement.position)
            {
                continue;
            }
            placement.position += range.delta;
            moved += 1;
        }
        Ok(moved)
    }

    fn set_position(
        &self,
        member: MemberId,
        parent: ParentId,
        position: Position,
    ) -> Result<(), Self::Error> {
        self.members.borrow_mut().insert(
            member,
            Placement {
                member,
                parent,
                position,
            },
        );
        Ok(())
    }

    fn delete(&self, member: MemberId) -> Result<(), Self::Error> {
        self.members
            .borrow_mut()
            .remove(&member)
            .map(|_| ())
            .ok_or(PositionError::MemberNotFound(member))
    }
}
