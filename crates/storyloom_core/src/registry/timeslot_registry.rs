//! Timeslot registry: identity and canonical order of narrative moments.
//!
//! # Responsibility
//! - Own every timeslot record and the single ordered id sequence.
//! - Answer rank lookups (`index_of`, `id_at`) for all other components.
//!
//! # Invariants
//! - Every ordered id exists in the record map and appears exactly once.
//! - Every record in the map is ordered.
//! - Reordering never changes identity; consumers hold ids, not ranks.

use crate::model::timeslot::{Timeslot, TimeslotId};
use log::debug;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by timeslot registry operations.
pub type TimeslotResult<T> = Result<T, TimeslotError>;

/// Errors from timeslot registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeslotError {
    /// Target timeslot is not registered.
    NotFound(TimeslotId),
    /// A timeslot with this id is already registered.
    DuplicateId(TimeslotId),
    /// The order lists an id that has no record.
    MissingRecord(TimeslotId),
    /// A record exists that the order does not list.
    Unordered(TimeslotId),
    /// Removal refused because cards or mutations still reference it.
    NotEmpty(TimeslotId),
}

impl Display for TimeslotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "timeslot not found: {id}"),
            Self::DuplicateId(id) => write!(f, "timeslot already registered: {id}"),
            Self::MissingRecord(id) => write!(f, "timeslot order references unknown id: {id}"),
            Self::Unordered(id) => write!(f, "timeslot is missing from order: {id}"),
            Self::NotEmpty(id) => write!(f, "timeslot is still referenced: {id}"),
        }
    }
}

impl Error for TimeslotError {}

/// Where a new timeslot lands in the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    /// Append after the last timeslot.
    End,
    /// Insert at rank `index + 1`. Indexes past the end append.
    After(usize),
    /// Insert at rank `index`, shifting that timeslot later. Clamped.
    Before(usize),
    /// Insert at exactly this rank. Clamped.
    At(usize),
}

impl InsertPosition {
    fn resolve(self, len: usize) -> usize {
        match self {
            Self::End => len,
            Self::After(index) => index.saturating_add(1).min(len),
            Self::Before(index) | Self::At(index) => index.min(len),
        }
    }
}

/// Anything that may hold a reference to a timeslot.
///
/// Used by [`TimeslotRegistry::remove_if_empty`] to refuse removal of
/// timeslots that still anchor cards or mutations.
pub trait TimeslotReferences {
    fn references_timeslot(&self, timeslot_id: TimeslotId) -> bool;
}

/// In-memory timeslot registry.
#[derive(Debug, Default, Clone)]
pub struct TimeslotRegistry {
    records: HashMap<TimeslotId, Timeslot>,
    order: Vec<TimeslotId>,
    revision: u64,
}

impl TimeslotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from persisted parts.
    ///
    /// # Errors
    /// - `DuplicateId` when an id appears twice in `order` or `timeslots`.
    /// - `MissingRecord` when `order` lists an id without a record.
    /// - `Unordered` when a record is not listed in `order`.
    pub fn from_parts(order: Vec<TimeslotId>, timeslots: Vec<Timeslot>) -> TimeslotResult<Self> {
        let mut records = HashMap::with_capacity(timeslots.len());
        for timeslot in timeslots {
            let id = timeslot.id;
            if records.insert(id, timeslot).is_some() {
                return Err(TimeslotError::DuplicateId(id));
            }
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in &order {
            if !seen.insert(*id) {
                return Err(TimeslotError::DuplicateId(*id));
            }
            if !records.contains_key(id) {
                return Err(TimeslotError::MissingRecord(*id));
            }
        }
        if let Some(orphan) = records.keys().find(|id| !seen.contains(id)) {
            return Err(TimeslotError::Unordered(*orphan));
        }

        Ok(Self {
            records,
            order,
            revision: 0,
        })
    }

    /// Appends a fresh timeslot.
    pub fn create_at_end(&mut self) -> TimeslotId {
        self.create(InsertPosition::End)
    }

    /// Inserts a fresh timeslot right after rank `index`.
    pub fn create_after(&mut self, index: usize) -> TimeslotId {
        self.create(InsertPosition::After(index))
    }

    /// Inserts a fresh timeslot right before rank `index`.
    pub fn create_before(&mut self, index: usize) -> TimeslotId {
        self.create(InsertPosition::Before(index))
    }

    fn create(&mut self, position: InsertPosition) -> TimeslotId {
        let timeslot = Timeslot::new();
        let id = timeslot.id;
        // A freshly generated v4 id cannot collide with a registered one.
        let _ = self.insert(timeslot, position);
        id
    }

    /// Inserts an existing timeslot record, keeping its identity.
    ///
    /// Returns the rank it landed on.
    pub fn insert(&mut self, timeslot: Timeslot, position: InsertPosition) -> TimeslotResult<usize> {
        if self.records.contains_key(&timeslot.id) {
            return Err(TimeslotError::DuplicateId(timeslot.id));
        }
        let rank = position.resolve(self.order.len());
        self.order.insert(rank, timeslot.id);
        debug!(
            "event=timeslot_insert module=timeslots status=ok id={} rank={}",
            timeslot.id, rank
        );
        self.records.insert(timeslot.id, timeslot);
        self.bump();
        Ok(rank)
    }

    /// Moves one timeslot to `new_index` (clamped) without changing identity.
    ///
    /// Returns `false` when the id is unknown or the rank is unchanged.
    pub fn move_to_index(&mut self, id: TimeslotId, new_index: usize) -> bool {
        let Some(current) = self.index_of(id) else {
            return false;
        };
        let target = new_index.min(self.order.len() - 1);
        if current == target {
            return false;
        }
        let moved = self.order.remove(current);
        self.order.insert(target, moved);
        debug!(
            "event=timeslot_move module=timeslots status=ok id={} from={} to={}",
            id, current, target
        );
        self.bump();
        true
    }

    /// Removes one timeslot unconditionally.
    ///
    /// Returns its former rank and record. Callers own the emptiness check.
    pub fn remove(&mut self, id: TimeslotId) -> Option<(usize, Timeslot)> {
        let rank = self.index_of(id)?;
        self.order.remove(rank);
        let record = self.records.remove(&id)?;
        self.bump();
        Some((rank, record))
    }

    /// Removes one timeslot only when nothing references it.
    pub fn remove_if_empty(
        &mut self,
        id: TimeslotId,
        references: &[&dyn TimeslotReferences],
    ) -> bool {
        if !self.contains(id) {
            return false;
        }
        if references.iter().any(|refs| refs.references_timeslot(id)) {
            debug!(
                "event=timeslot_remove module=timeslots status=refused id={} reason=not_empty",
                id
            );
            return false;
        }
        self.remove(id).is_some()
    }

    /// Rank of one timeslot. `None` means "not on the timeline".
    pub fn index_of(&self, id: TimeslotId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    /// Id at one rank.
    pub fn id_at(&self, index: usize) -> Option<TimeslotId> {
        self.order.get(index).copied()
    }

    pub fn get(&self, id: TimeslotId) -> Option<&Timeslot> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: TimeslotId) -> bool {
        self.records.contains_key(&id)
    }

    /// Ordered id sequence.
    pub fn order(&self) -> &[TimeslotId] {
        &self.order
    }

    /// Records in timeline order.
    pub fn ordered(&self) -> Vec<&Timeslot> {
        self.order
            .iter()
            .filter_map(|id| self.records.get(id))
            .collect()
    }

    /// Rank lookup table for bulk queries.
    pub fn rank_table(&self) -> HashMap<TimeslotId, usize> {
        self.order
            .iter()
            .enumerate()
            .map(|(rank, id)| (*id, rank))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Monotonic change counter for dirty checking.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::{InsertPosition, TimeslotError, TimeslotReferences, TimeslotRegistry};
    use crate::model::timeslot::{Timeslot, TimeslotId};

    struct Pinned(TimeslotId);

    impl TimeslotReferences for Pinned {
        fn references_timeslot(&self, timeslot_id: TimeslotId) -> bool {
            self.0 == timeslot_id
        }
    }

    #[test]
    fn create_after_shifts_later_ranks() {
        let mut registry = TimeslotRegistry::new();
        let first = registry.create_at_end();
        let second = registry.create_at_end();

        let inserted = registry.create_after(0);
        assert_eq!(registry.index_of(first), Some(0));
        assert_eq!(registry.index_of(inserted), Some(1));
        assert_eq!(registry.index_of(second), Some(2));
    }

    #[test]
    fn create_before_and_past_end_positions() {
        let mut registry = TimeslotRegistry::new();
        let first = registry.create_at_end();
        let before = registry.create_before(0);
        let appended = registry.create_after(99);

        assert_eq!(registry.order(), &[before, first, appended]);
    }

    #[test]
    fn move_to_index_preserves_identity_and_clamps() {
        let mut registry = TimeslotRegistry::new();
        let a = registry.create_at_end();
        let b = registry.create_at_end();
        let c = registry.create_at_end();

        assert!(registry.move_to_index(a, 10));
        assert_eq!(registry.order(), &[b, c, a]);
        assert!(!registry.move_to_index(a, 2));
        assert!(registry.move_to_index(c, 0));
        assert_eq!(registry.order(), &[c, b, a]);
        assert!(registry.get(a).is_some());
    }

    #[test]
    fn remove_if_empty_respects_references() {
        let mut registry = TimeslotRegistry::new();
        let a = registry.create_at_end();
        let pinned = Pinned(a);

        assert!(!registry.remove_if_empty(a, &[&pinned]));
        assert_eq!(registry.index_of(a), Some(0));
        assert!(registry.remove_if_empty(a, &[]));
        assert_eq!(registry.index_of(a), None);
        assert!(!registry.remove_if_empty(a, &[]));
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let mut registry = TimeslotRegistry::new();
        let slot = Timeslot::new();
        registry.insert(slot.clone(), InsertPosition::End).unwrap();
        assert_eq!(
            registry.insert(slot.clone(), InsertPosition::End),
            Err(TimeslotError::DuplicateId(slot.id))
        );
    }

    #[test]
    fn from_parts_rejects_inconsistent_order() {
        let a = Timeslot::new();
        let b = Timeslot::new();

        let err = TimeslotRegistry::from_parts(vec![a.id, a.id], vec![a.clone()]).unwrap_err();
        assert_eq!(err, TimeslotError::DuplicateId(a.id));

        let err = TimeslotRegistry::from_parts(vec![a.id, b.id], vec![a.clone()]).unwrap_err();
        assert_eq!(err, TimeslotError::MissingRecord(b.id));

        let err = TimeslotRegistry::from_parts(vec![a.id], vec![a.clone(), b.clone()]).unwrap_err();
        assert_eq!(err, TimeslotError::Unordered(b.id));

        let registry = TimeslotRegistry::from_parts(vec![b.id, a.id], vec![a, b.clone()]).unwrap();
        assert_eq!(registry.id_at(0), Some(b.id));
    }

    #[test]
    fn revision_bumps_on_every_mutation() {
        let mut registry = TimeslotRegistry::new();
        let start = registry.revision();
        let a = registry.create_at_end();
        registry.create_at_end();
        registry.move_to_index(a, 1);
        assert_eq!(registry.revision(), start + 3);
    }
}
