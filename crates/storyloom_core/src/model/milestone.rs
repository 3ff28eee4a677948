//! Milestone domain model.

use crate::model::timeslot::TimeslotId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one milestone.
pub type MilestoneId = Uuid;

/// Named structural marker ("Part II", "Chapter 7").
///
/// A milestone sits *before* its timeslot. `timeslot_id = None` places it
/// before the first timeslot. Rank is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: MilestoneId,
    pub name: String,
    #[serde(default)]
    pub timeslot_id: Option<TimeslotId>,
    #[serde(default)]
    pub color: Option<String>,
    /// Export label hint ("part", "chapter"). Opaque to the core.
    #[serde(default)]
    pub export_as: Option<String>,
}

impl Milestone {
    pub fn new(name: impl Into<String>, timeslot_id: Option<TimeslotId>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timeslot_id,
            color: None,
            export_as: None,
        }
    }
}
