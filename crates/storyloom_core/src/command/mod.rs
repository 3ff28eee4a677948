//! Reversible edit commands over the project aggregate.
//!
//! # Responsibility
//! - Express every undoable edit as a `Command<Project>`.
//! - Capture exactly what `undo` needs during `execute`.
//!
//! # Invariants
//! - Commands call only primitive registry methods; they never reach the
//!   history, the navigator or other commands.
//! - Ids are fixed when a command is built, so redo recreates the same
//!   identities and sequence numbers.
//! - A failing `execute` leaves the project unchanged.

pub mod milestone_commands;
pub mod object_commands;
pub mod placement_commands;
pub mod thread_commands;
pub mod timeslot_commands;

use crate::history::{Batch, BoxedCommand, HistoryManager};
use crate::model::object::ObjectId;
use crate::model::placement::PlacementId;
use crate::project::Project;
use crate::registry::milestone_registry::MilestoneError;
use crate::registry::object_registry::ObjectError;
use crate::registry::placement_log::PlacementError;
use crate::registry::timeslot_registry::TimeslotError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by edit commands.
pub type EditResult<T> = Result<T, EditError>;

/// Boxed edit command stored in project history.
pub type ProjectCommand = BoxedCommand<Project, EditError>;

/// Batch of edit commands recorded as one history entry.
pub type ProjectBatch = Batch<Project, EditError>;

/// History over project edits.
pub type ProjectHistory = HistoryManager<Project, EditError>;

/// Errors from edit commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    Timeslot(TimeslotError),
    Object(ObjectError),
    Placement(PlacementError),
    Milestone(MilestoneError),
    /// The object has no card on the timeline.
    NotPlaced(ObjectId),
    /// The placement exists but is not a card.
    NotACard(PlacementId),
    /// Cards go through `PlaceObject`; this path only logs changes.
    NotAMutation(PlacementId),
    /// Subthread targeting needs the card promoted into these threads first.
    NeedsPromotion {
        card_id: PlacementId,
        thread_ids: Vec<ObjectId>,
    },
    /// The card is not reached by the thread through an attached placement.
    PromotionNotNeeded {
        card_id: PlacementId,
        thread_id: ObjectId,
    },
    /// `undo` called on a command that never executed.
    NotExecuted(&'static str),
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeslot(err) => write!(f, "{err}"),
            Self::Object(err) => write!(f, "{err}"),
            Self::Placement(err) => write!(f, "{err}"),
            Self::Milestone(err) => write!(f, "{err}"),
            Self::NotPlaced(id) => write!(f, "object has no card on the timeline: {id}"),
            Self::NotACard(id) => write!(f, "placement is not a card: {id}"),
            Self::NotAMutation(id) => write!(f, "placement is not a change: {id}"),
            Self::NeedsPromotion {
                card_id,
                thread_ids,
            } => write!(
                f,
                "card {card_id} must be promoted into {} thread(s) first",
                thread_ids.len()
            ),
            Self::PromotionNotNeeded { card_id, thread_id } => write!(
                f,
                "card {card_id} does not need promotion into thread {thread_id}"
            ),
            Self::NotExecuted(command) => write!(f, "cannot undo `{command}` before execute"),
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Timeslot(err) => Some(err),
            Self::Object(err) => Some(err),
            Self::Placement(err) => Some(err),
            Self::Milestone(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TimeslotError> for EditError {
    fn from(value: TimeslotError) -> Self {
        Self::Timeslot(value)
    }
}

impl From<ObjectError> for EditError {
    fn from(value: ObjectError) -> Self {
        Self::Object(value)
    }
}

impl From<PlacementError> for EditError {
    fn from(value: PlacementError) -> Self {
        Self::Placement(value)
    }
}

impl From<MilestoneError> for EditError {
    fn from(value: MilestoneError) -> Self {
        Self::Milestone(value)
    }
}
