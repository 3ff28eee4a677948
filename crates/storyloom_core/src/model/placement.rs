//! Placement domain model.
//!
//! # Responsibility
//! - Bind objects to timeslots as Creation (card) or Mutation (delta) records.
//! - Carry attribute, content and section deltas for mutations.
//!
//! # Invariants
//! - Creation placements carry no mutation payload.
//! - Mutation placements always carry a payload.
//! - `seq` orders placements sharing one timeslot; it is persisted so the
//!   tie-break survives a save/load round trip.

use crate::model::now_epoch_ms;
use crate::model::object::{ObjectId, SectionId};
use crate::model::timeslot::TimeslotId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one placement.
pub type PlacementId = Uuid;

/// Placement role on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementKind {
    /// The object's card: where it first appears.
    Creation,
    /// A change of attributes/content at a timeslot.
    Mutation,
}

/// One `from -> to` delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChange<T> {
    pub from: T,
    pub to: T,
}

impl<T> ValueChange<T> {
    pub fn new(from: T, to: T) -> Self {
        Self { from, to }
    }
}

/// Delta payload carried by mutation placements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MutationPayload {
    /// Short author-facing label ("Joins the guild").
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub changes: BTreeMap<String, ValueChange<serde_json::Value>>,
    /// Whole-body replacement.
    #[serde(default)]
    pub content_change: Option<ValueChange<String>>,
    /// Per-section whole-body replacements.
    #[serde(default)]
    pub section_changes: BTreeMap<SectionId, ValueChange<String>>,
}

impl MutationPayload {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Adds one attribute delta, builder style.
    pub fn with_change(
        mut self,
        key: impl Into<String>,
        from: impl Into<serde_json::Value>,
        to: impl Into<serde_json::Value>,
    ) -> Self {
        self.changes
            .insert(key.into(), ValueChange::new(from.into(), to.into()));
        self
    }

    /// Sets the whole-body content delta, builder style.
    pub fn with_content(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.content_change = Some(ValueChange::new(from.into(), to.into()));
        self
    }

    /// Adds one section delta, builder style.
    pub fn with_section(
        mut self,
        section_id: SectionId,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.section_changes
            .insert(section_id, ValueChange::new(from.into(), to.into()));
        self
    }
}

/// Record binding an object to a timeslot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: PlacementId,
    pub object_id: ObjectId,
    #[serde(rename = "type")]
    pub kind: PlacementKind,
    pub timeslot_id: TimeslotId,
    /// Presentational grouping under another card. Never affects replay.
    #[serde(default)]
    pub attached_to_card_id: Option<PlacementId>,
    #[serde(default)]
    pub thread_ids: Vec<ObjectId>,
    /// Section ids this placement counts for. Empty means "whole thread".
    #[serde(default)]
    pub subthread_ids: Vec<SectionId>,
    #[serde(default)]
    pub mutation: Option<MutationPayload>,
    /// Log sequence number. `0` means "not assigned yet".
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: i64,
}

impl Placement {
    /// Creates a card placement for one object.
    pub fn creation(object_id: ObjectId, timeslot_id: TimeslotId) -> Self {
        Self::build(object_id, PlacementKind::Creation, timeslot_id, None)
    }

    /// Creates a mutation placement for one object.
    pub fn mutation(
        object_id: ObjectId,
        timeslot_id: TimeslotId,
        payload: MutationPayload,
    ) -> Self {
        Self::build(
            object_id,
            PlacementKind::Mutation,
            timeslot_id,
            Some(payload),
        )
    }

    fn build(
        object_id: ObjectId,
        kind: PlacementKind,
        timeslot_id: TimeslotId,
        mutation: Option<MutationPayload>,
    ) -> Self {
        let now = now_epoch_ms();
        Self {
            id: Uuid::new_v4(),
            object_id,
            kind,
            timeslot_id,
            attached_to_card_id: None,
            thread_ids: Vec::new(),
            subthread_ids: Vec::new(),
            mutation,
            seq: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches this placement below a card, builder style.
    pub fn attached_to(mut self, card_id: PlacementId) -> Self {
        self.attached_to_card_id = Some(card_id);
        self
    }

    pub fn is_creation(&self) -> bool {
        self.kind == PlacementKind::Creation
    }

    pub fn is_mutation(&self) -> bool {
        self.kind == PlacementKind::Mutation
    }

    pub fn has_thread(&self, thread_id: ObjectId) -> bool {
        self.thread_ids.contains(&thread_id)
    }

    /// Validates payload rules for the placement kind.
    pub fn validate(&self) -> Result<(), PlacementValidationError> {
        if self.id.is_nil() {
            return Err(PlacementValidationError::NilId);
        }
        match (self.kind, self.mutation.is_some()) {
            (PlacementKind::Creation, true) => {
                Err(PlacementValidationError::CreationWithPayload(self.id))
            }
            (PlacementKind::Mutation, false) => {
                Err(PlacementValidationError::MutationWithoutPayload(self.id))
            }
            _ => Ok(()),
        }
    }
}

/// Placement-local validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementValidationError {
    NilId,
    CreationWithPayload(PlacementId),
    MutationWithoutPayload(PlacementId),
}

impl Display for PlacementValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "placement id must not be nil"),
            Self::CreationWithPayload(id) => {
                write!(f, "creation placement must not carry a mutation: {id}")
            }
            Self::MutationWithoutPayload(id) => {
                write!(f, "mutation placement must carry a payload: {id}")
            }
        }
    }
}

impl Error for PlacementValidationError {}

#[cfg(test)]
mod tests {
    use super::{MutationPayload, Placement, PlacementKind, PlacementValidationError};
    use uuid::Uuid;

    #[test]
    fn constructors_satisfy_payload_rules() {
        let object = Uuid::new_v4();
        let slot = Uuid::new_v4();
        Placement::creation(object, slot).validate().unwrap();
        Placement::mutation(object, slot, MutationPayload::new("x"))
            .validate()
            .unwrap();
    }

    #[test]
    fn validate_rejects_mismatched_payloads() {
        let mut creation = Placement::creation(Uuid::new_v4(), Uuid::new_v4());
        creation.mutation = Some(MutationPayload::default());
        assert_eq!(
            creation.validate().unwrap_err(),
            PlacementValidationError::CreationWithPayload(creation.id)
        );

        let mut mutation =
            Placement::mutation(Uuid::new_v4(), Uuid::new_v4(), MutationPayload::default());
        mutation.mutation = None;
        assert_eq!(
            mutation.validate().unwrap_err(),
            PlacementValidationError::MutationWithoutPayload(mutation.id)
        );
    }

    #[test]
    fn serializes_kind_as_type_field() {
        let placement = Placement::mutation(
            Uuid::new_v4(),
            Uuid::new_v4(),
            MutationPayload::new("dawn").with_change("status", "grey", "white"),
        );
        let json = serde_json::to_value(&placement).unwrap();
        assert_eq!(json["type"], "mutation");
        assert_eq!(json["mutation"]["changes"]["status"]["to"], "white");

        let decoded: Placement = serde_json::from_value(json).unwrap();
        assert_eq!(decoded.kind, PlacementKind::Mutation);
        assert_eq!(decoded, placement);
    }
}
