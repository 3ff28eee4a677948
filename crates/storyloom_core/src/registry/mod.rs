//! In-memory registries owning the project state.
//!
//! # Responsibility
//! - Provide the only mutation paths for timeslots, objects, placements and
//!   milestones.
//! - Expose read-only views and revision counters for dirty checking.
//!
//! # Invariants
//! - Registries never cascade deletes into one another. Dangling references
//!   are tolerated and surface as "not on the timeline".

pub mod milestone_registry;
pub mod object_registry;
pub mod placement_log;
pub mod timeslot_registry;
