//! Thread membership queries.
//!
//! # Responsibility
//! - Derive thread membership by scanning placement tags.
//! - Answer the promotion question without mutating anything.
//!
//! # Invariants
//! - Membership is never stored on the thread; only `thread_ids` on
//!   placements is authoritative.
//! - Empty `subthread_ids` counts for the whole thread.
//! - A card reached only through an attached mutation needs promotion before
//!   its own subthread targeting applies.

use crate::model::object::{ObjectId, SectionId, Thread};
use crate::model::placement::{Placement, PlacementId};
use crate::registry::object_registry::ObjectRegistry;
use crate::registry::placement_log::PlacementLog;
use crate::registry::timeslot_registry::TimeslotRegistry;
use std::collections::BTreeSet;

/// Whether a placement counts for one section of its threads.
pub fn counts_for_section(placement: &Placement, section_id: SectionId) -> bool {
    placement.subthread_ids.is_empty() || placement.subthread_ids.contains(&section_id)
}

/// Read-only thread view over a project's registries.
#[derive(Clone, Copy)]
pub struct ThreadQuery<'a> {
    timeslots: &'a TimeslotRegistry,
    placements: &'a PlacementLog,
    objects: &'a ObjectRegistry,
}

impl<'a> ThreadQuery<'a> {
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

    /// All threads in object listing order.
    pub fn threads(&self) -> Vec<Thread> {
        self.objects.threads()
    }

    /// Placements tagged with the thread, sorted by (rank, seq).
    ///
    /// Placements on timeslots missing from the order are skipped.
    pub fn members(&self, thread_id: ObjectId) -> Vec<&'a Placement> {
        let ranks = self.timeslots.rank_table();
        let mut ranked: Vec<(usize, &'a Placement)> = self
            .placements
            .iter()
            .filter(|placement| placement.has_thread(thread_id))
            .filter_map(|placement| {
                ranks
                    .get(&placement.timeslot_id)
                    .map(|rank| (*rank, placement))
            })
            .collect();
        ranked.sort_by_key(|(rank, placement)| (*rank, placement.seq));
        ranked.into_iter().map(|(_, placement)| placement).collect()
    }

    /// Members that count for one section of the thread.
    pub fn section_members(&self, thread_id: ObjectId, section_id: SectionId) -> Vec<&'a Placement> {
        self.members(thread_id)
            .into_iter()
            .filter(|placement| counts_for_section(placement, section_id))
            .collect()
    }

    /// Distinct ranks the thread line passes through, ascending.
    pub fn path(&self, thread_id: ObjectId) -> Vec<usize> {
        let ranks: BTreeSet<usize> = self
            .members(thread_id)
            .into_iter()
            .filter_map(|placement| self.timeslots.index_of(placement.timeslot_id))
            .collect();
        ranks.into_iter().collect()
    }

    /// Threads a card belongs to directly or through attached placements.
    pub fn associated_threads(&self, card_id: PlacementId) -> BTreeSet<ObjectId> {
        let mut threads = BTreeSet::new();
        if let Some(card) = self.placements.get(card_id) {
            threads.extend(card.thread_ids.iter().copied());
        }
        for attached in self.placements.attached_to(card_id) {
            threads.extend(attached.thread_ids.iter().copied());
        }
        threads
    }

    /// Whether `card_id` reaches `thread_id` only via an attached placement.
    pub fn needs_promotion(&self, card_id: PlacementId, thread_id: ObjectId) -> bool {
        let Some(card) = self.placements.get(card_id) else {
            return false;
        };
        if !card.is_creation() || card.has_thread(thread_id) {
            return false;
        }
        self.placements
            .attached_to(card_id)
            .iter()
            .any(|attached| attached.has_thread(thread_id))
    }

    /// Threads the card must be promoted into before subthread targeting.
    pub fn pending_promotions(&self, card_id: PlacementId) -> Vec<ObjectId> {
        self.associated_threads(card_id)
            .into_iter()
            .filter(|thread_id| self.needs_promotion(card_id, *thread_id))
            .collect()
    }
}
