//! Domain records for the workspace → board → column → task hierarchy.
//!
//! # Responsibility
//! - Define the read models returned by repositories and services.
//! - Define the caller identity passed into every mutating call.
//!
//! # Invariants
//! - Children reference their parent by id; parents hold no child lists.
//! - `position` is only meaningful inside the owning parent's sibling set.

pub mod actor;
pub mod board;
