//! Timeslot domain model.

use crate::model::now_epoch_ms;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of one narrative moment.
pub type TimeslotId = Uuid;

/// An atomic narrative moment.
///
/// Carries identity only; its rank lives in the timeslot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeslot {
    pub id: TimeslotId,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl Timeslot {
    /// Creates a timeslot with a generated id.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates a timeslot with a caller-provided id.
    pub fn with_id(id: TimeslotId) -> Self {
        Self {
            id,
            created_at: now_epoch_ms(),
        }
    }
}

impl Default for Timeslot {
    fn default() -> Self {
        Self::new()
    }
}
