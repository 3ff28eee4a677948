//! Placement log: the append/remove record of cards and mutations.
//!
//! # Responsibility
//! - Store Creation and Mutation placements in log order.
//! - Enforce payload rules and the one-card-per-object rule on write.
//! - Assign sequence numbers used as the same-timeslot tie-break.
//!
//! # Invariants
//! - At most one Creation placement per object.
//! - Placement ids are unique.
//! - `seq` values are unique and strictly increasing in assignment order.
//! - Deltas are trusted: `from` is never checked against replayed state.

use crate::model::now_epoch_ms;
use crate::model::object::{ObjectId, SectionId};
use crate::model::placement::{
    MutationPayload, Placement, PlacementId, PlacementKind, PlacementValidationError,
};
use crate::model::timeslot::TimeslotId;
use crate::registry::timeslot_registry::TimeslotReferences;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by placement log operations.
pub type PlacementResult<T> = Result<T, PlacementError>;

/// Errors from placement log operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    Validation(PlacementValidationError),
    NotFound(PlacementId),
    DuplicateId(PlacementId),
    /// The object already has a card.
    DuplicateCreation {
        object_id: ObjectId,
        existing: PlacementId,
    },
}

impl Display for PlacementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "placement not found: {id}"),
            Self::DuplicateId(id) => write!(f, "placement already exists: {id}"),
            Self::DuplicateCreation {
                object_id,
                existing,
            } => write!(
                f,
                "object {object_id} already has creation placement {existing}"
            ),
        }
    }
}

impl Error for PlacementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PlacementValidationError> for PlacementError {
    fn from(value: PlacementValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Shallow-merge patch for [`PlacementLog::update`].
///
/// `None` leaves a field untouched. Kind and object are immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementPatch {
    pub timeslot_id: Option<TimeslotId>,
    pub attached_to_card_id: Option<Option<PlacementId>>,
    pub thread_ids: Option<Vec<ObjectId>>,
    pub subthread_ids: Option<Vec<SectionId>>,
    pub mutation: Option<MutationPayload>,
}

/// In-memory placement log.
#[derive(Debug, Clone)]
pub struct PlacementLog {
    entries: Vec<Placement>,
    next_seq: u64,
    revision: u64,
}

impl Default for PlacementLog {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 1,
            revision: 0,
        }
    }

    /// Builds a log from persisted placements, keeping their order.
    ///
    /// Placements persisted without a sequence number get one in log order,
    /// after every persisted number.
    pub fn from_placements(placements: Vec<Placement>) -> PlacementResult<Self> {
        let max_seq = placements.iter().map(|p| p.seq).max().unwrap_or(0);
        let mut log = Self {
            entries: Vec::with_capacity(placements.len()),
            next_seq: max_seq + 1,
            revision: 0,
        };
        for placement in placements {
            log.check_insertable(&placement)?;
            let placement = log.with_seq(placement);
            log.entries.push(placement);
        }
        Ok(log)
    }

    /// Appends one placement.
    ///
    /// # Errors
    /// - `Validation` when the payload does not match the kind.
    /// - `DuplicateId` when the id is already logged.
    /// - `DuplicateCreation` when the object already has a card.
    pub fn add(&mut self, placement: Placement) -> PlacementResult<Placement> {
        self.check_insertable(&placement)?;
        let placement = self.with_seq(placement);
        debug!(
            "event=placement_add module=placements status=ok id={} kind={:?} seq={}",
            placement.id, placement.kind, placement.seq
        );
        self.entries.push(placement.clone());
        self.bump();
        Ok(placement)
    }

    /// Re-inserts a removed placement at its former log position.
    pub fn restore_at(&mut self, index: usize, placement: Placement) -> PlacementResult<()> {
        self.check_insertable(&placement)?;
        let placement = self.with_seq(placement);
        let index = index.min(self.entries.len());
        self.entries.insert(index, placement);
        self.bump();
        Ok(())
    }

    /// Shallow-merges `patch` into one placement and bumps `updated_at`.
    ///
    /// Returns the previous value so callers can restore it.
    pub fn update(&mut self, id: PlacementId, patch: PlacementPatch) -> PlacementResult<Placement> {
        let position = self.position(id).ok_or(PlacementError::NotFound(id))?;
        let previous = self.entries[position].clone();

        let mut next = previous.clone();
        if let Some(timeslot_id) = patch.timeslot_id {
            next.timeslot_id = timeslot_id;
        }
        if let Some(attached) = patch.attached_to_card_id {
            next.attached_to_card_id = attached;
        }
        if let Some(thread_ids) = patch.thread_ids {
            next.thread_ids = thread_ids;
        }
        if let Some(subthread_ids) = patch.subthread_ids {
            next.subthread_ids = subthread_ids;
        }
        if let Some(mutation) = patch.mutation {
            next.mutation = Some(mutation);
        }
        next.validate()?;
        next.updated_at = now_epoch_ms().max(previous.updated_at);

        self.entries[position] = next;
        self.bump();
        Ok(previous)
    }

    /// Overwrites one placement with an exact earlier value.
    pub fn replace(&mut self, placement: Placement) -> PlacementResult<Placement> {
        placement.validate()?;
        let position = self
            .position(placement.id)
            .ok_or(PlacementError::NotFound(placement.id))?;
        let previous = std::mem::replace(&mut self.entries[position], placement);
        self.bump();
        Ok(previous)
    }

    /// Removes one placement. Returns its log position and value.
    pub fn remove(&mut self, id: PlacementId) -> Option<(usize, Placement)> {
        let position = self.position(id)?;
        let removed = self.entries.remove(position);
        debug!(
            "event=placement_remove module=placements status=ok id={} position={}",
            id, position
        );
        self.bump();
        Some((position, removed))
    }

    pub fn get(&self, id: PlacementId) -> Option<&Placement> {
        self.entries.iter().find(|placement| placement.id == id)
    }

    /// All placements of one object in log order.
    pub fn get_for_object(&self, object_id: ObjectId) -> Vec<&Placement> {
        self.entries
            .iter()
            .filter(|placement| placement.object_id == object_id)
            .collect()
    }

    /// Card placement of one object.
    pub fn creation_for(&self, object_id: ObjectId) -> Option<&Placement> {
        self.entries
            .iter()
            .find(|placement| placement.object_id == object_id && placement.is_creation())
    }

    /// Mutation placements of one object in log order.
    pub fn mutations_for(&self, object_id: ObjectId) -> Vec<&Placement> {
        self.entries
            .iter()
            .filter(|placement| placement.object_id == object_id && placement.is_mutation())
            .collect()
    }

    /// Placements attached below one card.
    pub fn attached_to(&self, card_id: PlacementId) -> Vec<&Placement> {
        self.entries
            .iter()
            .filter(|placement| placement.attached_to_card_id == Some(card_id))
            .collect()
    }

    /// Placements bound to one timeslot in log order.
    pub fn at_timeslot(&self, timeslot_id: TimeslotId) -> Vec<&Placement> {
        self.entries
            .iter()
            .filter(|placement| placement.timeslot_id == timeslot_id)
            .collect()
    }

    pub fn references_object(&self, object_id: ObjectId) -> bool {
        self.entries
            .iter()
            .any(|placement| placement.object_id == object_id || placement.has_thread(object_id))
    }

    /// All placements in log order.
    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Monotonic change counter for dirty checking.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, id: PlacementId) -> Option<usize> {
        self.entries.iter().position(|placement| placement.id == id)
    }

    fn check_insertable(&self, placement: &Placement) -> PlacementResult<()> {
        placement.validate()?;
        if self.position(placement.id).is_some() {
            return Err(PlacementError::DuplicateId(placement.id));
        }
        if placement.kind == PlacementKind::Creation {
            if let Some(existing) = self.creation_for(placement.object_id) {
                return Err(PlacementError::DuplicateCreation {
                    object_id: placement.object_id,
                    existing: existing.id,
                });
            }
        }
        Ok(())
    }

    fn with_seq(&mut self, mut placement: Placement) -> Placement {
        if placement.seq == 0 {
            placement.seq = self.next_seq;
        }
        self.next_seq = self.next_seq.max(placement.seq + 1);
        placement
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

impl TimeslotReferences for PlacementLog {
    fn references_timeslot(&self, timeslot_id: TimeslotId) -> bool {
        self.entries
            .iter()
            .any(|placement| placement.timeslot_id == timeslot_id)
    }
}
