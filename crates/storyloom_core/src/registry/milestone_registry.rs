//! Milestone registry: named markers sitting before timeslots.
//!
//! # Invariants
//! - Rank is derived from the anchor timeslot, never stored.
//! - `timeslot_id = None` ranks before the first timeslot, ahead of any
//!   milestone anchored there.
//! - Milestones anchored to a missing timeslot are tolerated and sort last.

use crate::model::milestone::{Milestone, MilestoneId};
use crate::model::timeslot::TimeslotId;
use crate::registry::timeslot_registry::TimeslotRegistry;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by milestone registry operations.
pub type MilestoneResult<T> = Result<T, MilestoneError>;

/// Errors from milestone registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MilestoneError {
    NotFound(MilestoneId),
    DuplicateId(MilestoneId),
    BlankName,
    /// The anchor timeslot is not registered.
    UnknownTimeslot(TimeslotId),
}

impl Display for MilestoneError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "milestone not found: {id}"),
            Self::DuplicateId(id) => write!(f, "milestone already exists: {id}"),
            Self::BlankName => write!(f, "milestone name must not be blank"),
            Self::UnknownTimeslot(id) => write!(f, "milestone anchor timeslot not found: {id}"),
        }
    }
}

impl Error for MilestoneError {}

/// Shallow-merge patch for [`MilestoneRegistry::update`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestonePatch {
    pub name: Option<String>,
    pub timeslot_id: Option<Option<TimeslotId>>,
    pub color: Option<Option<String>>,
    pub export_as: Option<Option<String>>,
}

/// In-memory milestone registry.
#[derive(Debug, Default, Clone)]
pub struct MilestoneRegistry {
    milestones: Vec<Milestone>,
    revision: u64,
}

impl MilestoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from persisted milestones.
    ///
    /// Anchors are not checked here: dangling anchors load as-is.
    pub fn from_milestones(milestones: Vec<Milestone>) -> MilestoneResult<Self> {
        let mut registry = Self::new();
        for milestone in milestones {
            if milestone.name.trim().is_empty() {
                return Err(MilestoneError::BlankName);
            }
            if registry.get(milestone.id).is_some() {
                return Err(MilestoneError::DuplicateId(milestone.id));
            }
            registry.milestones.push(milestone);
        }
        Ok(registry)
    }

    /// Registers one milestone. The anchor must exist when set.
    pub fn create(
        &mut self,
        milestone: Milestone,
        timeslots: &TimeslotRegistry,
    ) -> MilestoneResult<MilestoneId> {
        let id = milestone.id;
        self.restore_at(self.milestones.len(), milestone, timeslots)?;
        Ok(id)
    }

    /// Inserts one milestone at a listing position (used to undo removals).
    pub fn restore_at(
        &mut self,
        index: usize,
        mut milestone: Milestone,
        timeslots: &TimeslotRegistry,
    ) -> MilestoneResult<()> {
        milestone.name = normalize_name(&milestone.name)?;
        if self.get(milestone.id).is_some() {
            return Err(MilestoneError::DuplicateId(milestone.id));
        }
        check_anchor(milestone.timeslot_id, timeslots)?;
        let index = index.min(self.milestones.len());
        debug!(
            "event=milestone_insert module=milestones status=ok id={} position={}",
            milestone.id, index
        );
        self.milestones.insert(index, milestone);
        self.bump();
        Ok(())
    }

    /// Shallow-merges `patch`. Returns the previous value.
    pub fn update(
        &mut self,
        id: MilestoneId,
        patch: MilestonePatch,
        timeslots: &TimeslotRegistry,
    ) -> MilestoneResult<Milestone> {
        let position = self.position(id).ok_or(MilestoneError::NotFound(id))?;
        let previous = self.milestones[position].clone();
        let mut next = previous.clone();
        if let Some(name) = patch.name {
            next.name = normalize_name(&name)?;
        }
        if let Some(timeslot_id) = patch.timeslot_id {
            check_anchor(timeslot_id, timeslots)?;
            next.timeslot_id = timeslot_id;
        }
        if let Some(color) = patch.color {
            next.color = color;
        }
        if let Some(export_as) = patch.export_as {
            next.export_as = export_as;
        }
        self.milestones[position] = next;
        debug!(
            "event=milestone_update module=milestones status=ok id={}",
            id
        );
        self.bump();
        Ok(previous)
    }

    /// Overwrites one milestone with an exact earlier value.
    pub fn replace(&mut self, milestone: Milestone) -> MilestoneResult<Milestone> {
        let position = self
            .position(milestone.id)
            .ok_or(MilestoneError::NotFound(milestone.id))?;
        let previous = std::mem::replace(&mut self.milestones[position], milestone);
        self.bump();
        Ok(previous)
    }

    /// Re-points every milestone anchored at `from` to `to`.
    ///
    /// Returns the ids that moved.
    pub fn reanchor(&mut self, from: TimeslotId, to: Option<TimeslotId>) -> Vec<MilestoneId> {
        let mut moved = Vec::new();
        for milestone in &mut self.milestones {
            if milestone.timeslot_id == Some(from) {
                milestone.timeslot_id = to;
                moved.push(milestone.id);
            }
        }
        if !moved.is_empty() {
            debug!(
                "event=milestone_reanchor module=milestones status=ok from={} count={}",
                from,
                moved.len()
            );
            self.bump();
        }
        moved
    }

    /// Removes one milestone. Returns its listing position and value.
    pub fn remove(&mut self, id: MilestoneId) -> Option<(usize, Milestone)> {
        let position = self.position(id)?;
        let removed = self.milestones.remove(position);
        debug!(
            "event=milestone_remove module=milestones status=ok id={} position={}",
            id, position
        );
        self.bump();
        Some((position, removed))
    }

    pub fn get(&self, id: MilestoneId) -> Option<&Milestone> {
        self.milestones.iter().find(|milestone| milestone.id == id)
    }

    /// Milestones in creation order.
    pub fn list(&self) -> &[Milestone] {
        &self.milestones
    }

    /// Rank of the timeslot a milestone precedes.
    ///
    /// `None` anchor ranks `0`; a dangling anchor yields `None`.
    pub fn rank_of(&self, milestone: &Milestone, timeslots: &TimeslotRegistry) -> Option<usize> {
        match milestone.timeslot_id {
            None => Some(0),
            Some(timeslot_id) => timeslots.index_of(timeslot_id),
        }
    }

    /// Milestones in timeline order.
    ///
    /// Unanchored milestones come before the first-slot ones. Other ties keep
    /// creation order; dangling anchors go last.
    pub fn ordered(&self, timeslots: &TimeslotRegistry) -> Vec<&Milestone> {
        let mut ranked: Vec<((usize, bool, usize), &Milestone)> = self
            .milestones
            .iter()
            .enumerate()
            .map(|(position, milestone)| {
                (self.sort_key(milestone, position, timeslots), milestone)
            })
            .collect();
        ranked.sort_by_key(|(key, _)| *key);
        ranked.into_iter().map(|(_, milestone)| milestone).collect()
    }

    /// Milestone whose section contains the timeslot at `index`.
    ///
    /// That is the last milestone ranked at or before `index`.
    pub fn milestone_for_index(
        &self,
        index: usize,
        timeslots: &TimeslotRegistry,
    ) -> Option<&Milestone> {
        self.ordered(timeslots)
            .into_iter()
            .filter(|milestone| {
                self.rank_of(milestone, timeslots)
                    .is_some_and(|rank| rank <= index)
            })
            .last()
    }

    pub fn len(&self) -> usize {
        self.milestones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.milestones.is_empty()
    }

    /// Monotonic change counter for dirty checking.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn sort_key(
        &self,
        milestone: &Milestone,
        position: usize,
        timeslots: &TimeslotRegistry,
    ) -> (usize, bool, usize) {
        let rank = self.rank_of(milestone, timeslots).unwrap_or(usize::MAX);
        (rank, milestone.timeslot_id.is_some(), position)
    }

    fn position(&self, id: MilestoneId) -> Option<usize> {
        self.milestones.iter().position(|milestone| milestone.id == id)
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

fn normalize_name(value: &str) -> MilestoneResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MilestoneError::BlankName);
    }
    Ok(trimmed.to_string())
}

fn check_anchor(anchor: Option<TimeslotId>, timeslots: &TimeslotRegistry) -> MilestoneResult<()> {
    match anchor {
        Some(timeslot_id) if !timeslots.contains(timeslot_id) => {
            Err(MilestoneError::UnknownTimeslot(timeslot_id))
        }
        _ => Ok(()),
    }
}
