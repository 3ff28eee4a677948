//! Temporal query engine: object state at a point of the timeline.
//!
//! # Responsibility
//! - Replay mutation placements in timeline order to reconstruct attribute,
//!   content and section state at any timeslot index.
//! - Answer navigation helpers (next/previous change, visibility).
//!
//! # Invariants
//! - Results are a pure function of (placement log, timeslot order, index).
//! - Mutations apply in timeslot rank order; placements sharing a timeslot
//!   apply in `seq` order, so the last write per key wins.
//! - Attribute replay starts from an empty map; content and sections start
//!   from the object's base values and are replaced wholesale.
//! - Placements on timeslots missing from the order are never replayed.

use crate::model::object::{AttributeMap, ObjectId, Section, StoryObject};
use crate::model::placement::{Placement, PlacementId};
use crate::model::timeslot::TimeslotId;
use crate::registry::object_registry::ObjectRegistry;
use crate::registry::placement_log::PlacementLog;
use crate::registry::timeslot_registry::TimeslotRegistry;
use serde::Serialize;
use std::collections::HashMap;

/// Reconstructed state of one object at one timeslot index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectState {
    pub object_id: ObjectId,
    pub attributes: AttributeMap,
    pub content: String,
    pub sections: Vec<Section>,
    /// Mutations replayed to produce this state, in application order.
    pub applied_mutations: Vec<PlacementId>,
}

impl ObjectState {
    fn base(object_id: ObjectId, object: Option<&StoryObject>) -> Self {
        Self {
            object_id,
            attributes: AttributeMap::new(),
            content: object.map(|o| o.content.clone()).unwrap_or_default(),
            sections: object.map(|o| o.sections.clone()).unwrap_or_default(),
            applied_mutations: Vec::new(),
        }
    }

    fn apply(&mut self, placement: &Placement) {
        let Some(payload) = placement.mutation.as_ref() else {
            return;
        };
        for (key, change) in &payload.changes {
            self.attributes.insert(key.clone(), change.to.clone());
        }
        if let Some(content) = payload.content_change.as_ref() {
            self.content = content.to.clone();
        }
        for (section_id, change) in &payload.section_changes {
            if let Some(section) = self
                .sections
                .iter_mut()
                .find(|section| section.id == *section_id)
            {
                section.content = change.to.clone();
            }
        }
        self.applied_mutations.push(placement.id);
    }

    /// Value of one attribute, if any mutation set it.
    pub fn attribute(&self, key: &str) -> Option<&serde_json::Value> {
        self.attributes.get(key)
    }
}

/// One step in an attribute's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeStep {
    pub index: usize,
    pub placement_id: PlacementId,
    pub value: serde_json::Value,
}

/// Read-only query view over a project's registries.
#[derive(Clone, Copy)]
pub struct TemporalQuery<'a> {
    timeslots: &'a TimeslotRegistry,
    placements: &'a PlacementLog,
    objects: &'a ObjectRegistry,
}

impl<'a> TemporalQuery<'a> {
    pub fn new(
        timeslots: &'a TimeslotRegistry,
        placements: &'a PlacementLog,
        objects: &'a ObjectRegistry,
    ) -> Self {
        Self {
            timeslots,
            placements,
            objects,
        }
    }

    /// Mutations of one object at or before `index`, in application order.
    ///
    /// Indexes past the end clamp to the last timeslot.
    pub fn relevant_mutations(&self, object_id: ObjectId, index: usize) -> Vec<&'a Placement> {
        self.ranked_mutations(object_id)
            .into_iter()
            .filter(|(rank, _)| *rank <= index)
            .map(|(_, placement)| placement)
            .collect()
    }

    /// Mutations of one object strictly after `index`, in application order.
    pub fn future_mutations(&self, object_id: ObjectId, index: usize) -> Vec<&'a Placement> {
        self.ranked_mutations(object_id)
            .into_iter()
            .filter(|(rank, _)| *rank > index)
            .map(|(_, placement)| placement)
            .collect()
    }

    /// Net state of one object at timeslot `index`.
    ///
    /// Unknown objects and objects with no mutations yield their base state
    /// (empty attributes), never an error.
    pub fn state_at(&self, object_id: ObjectId, index: usize) -> ObjectState {
        let mut state = ObjectState::base(object_id, self.objects.get(object_id));
        for placement in self.relevant_mutations(object_id, index) {
            state.apply(placement);
        }
        state
    }

    /// Net state at a timeslot id. `None` when the timeslot is not ordered.
    pub fn state_at_timeslot(
        &self,
        object_id: ObjectId,
        timeslot_id: TimeslotId,
    ) -> Option<ObjectState> {
        let index = self.timeslots.index_of(timeslot_id)?;
        Some(self.state_at(object_id, index))
    }

    /// States of every object visible at `index`, in object listing order.
    pub fn states_at(&self, index: usize) -> Vec<ObjectState> {
        self.objects_visible_at(index)
            .into_iter()
            .map(|object_id| self.state_at(object_id, index))
            .collect()
    }

    /// Every value one attribute takes along the timeline.
    pub fn attribute_history(&self, object_id: ObjectId, key: &str) -> Vec<AttributeStep> {
        self.ranked_mutations(object_id)
            .into_iter()
            .filter_map(|(index, placement)| {
                let change = placement.mutation.as_ref()?.changes.get(key)?;
                Some(AttributeStep {
                    index,
                    placement_id: placement.id,
                    value: change.to.clone(),
                })
            })
            .collect()
    }

    /// First rank after `index` where the object mutates.
    pub fn next_change_index(&self, object_id: ObjectId, index: usize) -> Option<usize> {
        self.ranked_mutations(object_id)
            .into_iter()
            .map(|(rank, _)| rank)
            .find(|rank| *rank > index)
    }

    /// Last rank before `index` where the object mutates.
    pub fn previous_change_index(&self, object_id: ObjectId, index: usize) -> Option<usize> {
        self.ranked_mutations(object_id)
            .into_iter()
            .map(|(rank, _)| rank)
            .filter(|rank| *rank < index)
            .last()
    }

    /// Rank of the object's card, if it has one on the timeline.
    pub fn creation_index(&self, object_id: ObjectId) -> Option<usize> {
        let creation = self.placements.creation_for(object_id)?;
        self.timeslots.index_of(creation.timeslot_id)
    }

    /// Whether the object's card sits at or before `index`.
    pub fn is_visible_at(&self, object_id: ObjectId, index: usize) -> bool {
        self.creation_index(object_id)
            .is_some_and(|rank| rank <= index)
    }

    /// Objects whose card sits at or before `index`, in listing order.
    pub fn objects_visible_at(&self, index: usize) -> Vec<ObjectId> {
        self.objects
            .list()
            .iter()
            .map(|object| object.id)
            .filter(|object_id| self.is_visible_at(*object_id, index))
            .collect()
    }

    /// Mutations with a live rank, sorted by (rank, seq).
    fn ranked_mutations(&self, object_id: ObjectId) -> Vec<(usize, &'a Placement)> {
        if self.timeslots.is_empty() {
            return Vec::new();
        }
        let ranks: HashMap<TimeslotId, usize> = self.timeslots.rank_table();
        let mut ranked: Vec<(usize, &'a Placement)> = self
            .placements
            .mutations_for(object_id)
            .into_iter()
            .filter_map(|placement| {
                ranks
                    .get(&placement.timeslot_id)
                    .map(|rank| (*rank, placement))
            })
            .collect();
        ranked.sort_by_key(|(rank, placement)| (*rank, placement.seq));
        ranked
    }
}
