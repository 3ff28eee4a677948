//! Project aggregate and persistence snapshot boundary.
//!
//! # Responsibility
//! - Bundle the four registries into one value that commands mutate.
//! - Convert to and from `ProjectSnapshot`, the shape a persistence
//!   collaborator stores.
//!
//! # Invariants
//! - `from_snapshot` either yields a fully valid project or an error; it
//!   never returns partially loaded state.
//! - Exporting then importing a snapshot reproduces identical query results.

use crate::model::milestone::Milestone;
use crate::model::object::StoryObject;
use crate::model::placement::Placement;
use crate::model::timeslot::{Timeslot, TimeslotId};
use crate::query::temporal::TemporalQuery;
use crate::query::threads::ThreadQuery;
use crate::registry::milestone_registry::{MilestoneError, MilestoneRegistry};
use crate::registry::object_registry::{ObjectError, ObjectRegistry};
use crate::registry::placement_log::{PlacementError, PlacementLog};
use crate::registry::timeslot_registry::{TimeslotError, TimeslotReferences, TimeslotRegistry};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Persistence boundary: everything needed to rebuild a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    #[serde(default)]
    pub timeslot_order: Vec<TimeslotId>,
    #[serde(default)]
    pub timeslots: Vec<Timeslot>,
    #[serde(default)]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub objects: Vec<StoryObject>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

impl ProjectSnapshot {
    /// Parses a snapshot from JSON text.
    pub fn from_json_str(value: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(value).map_err(|err| SnapshotError::Parse(err.to_string()))
    }

    /// Serializes the snapshot as JSON text.
    pub fn to_json_string(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|err| SnapshotError::Parse(err.to_string()))
    }
}

/// Snapshot import failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    Parse(String),
    Timeslots(TimeslotError),
    Objects(ObjectError),
    Placements(PlacementError),
    Milestones(MilestoneError),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid snapshot json: {message}"),
            Self::Timeslots(err) => write!(f, "invalid snapshot timeslots: {err}"),
            Self::Objects(err) => write!(f, "invalid snapshot objects: {err}"),
            Self::Placements(err) => write!(f, "invalid snapshot placements: {err}"),
            Self::Milestones(err) => write!(f, "invalid snapshot milestones: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(_) => None,
            Self::Timeslots(err) => Some(err),
            Self::Objects(err) => Some(err),
            Self::Placements(err) => Some(err),
            Self::Milestones(err) => Some(err),
        }
    }
}

/// The four registries that make up one authoring project.
#[derive(Debug, Clone)]
pub struct Project {
    pub(crate) timeslots: TimeslotRegistry,
    pub(crate) objects: ObjectRegistry,
    pub(crate) placements: PlacementLog,
    pub(crate) milestones: MilestoneRegistry,
}

impl Default for Project {
    fn default() -> Self {
        Self::new()
    }
}

impl Project {
    /// Creates an empty, timeslot-less project.
    pub fn new() -> Self {
        Self {
            timeslots: TimeslotRegistry::new(),
            objects: ObjectRegistry::new(),
            placements: PlacementLog::new(),
            milestones: MilestoneRegistry::new(),
        }
    }

    /// Rebuilds a project from a snapshot, validating every registry.
    pub fn from_snapshot(snapshot: ProjectSnapshot) -> Result<Self, SnapshotError> {
        let timeslots =
            TimeslotRegistry::from_parts(snapshot.timeslot_order, snapshot.timeslots)
                .map_err(SnapshotError::Timeslots)?;
        let objects =
            ObjectRegistry::from_objects(snapshot.objects).map_err(SnapshotError::Objects)?;
        let placements = PlacementLog::from_placements(snapshot.placements)
            .map_err(SnapshotError::Placements)?;
        let milestones = MilestoneRegistry::from_milestones(snapshot.milestones)
            .map_err(SnapshotError::Milestones)?;
        Ok(Self {
            timeslots,
            objects,
            placements,
            milestones,
        })
    }

    /// Exports the current state.
    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            timeslot_order: self.timeslots.order().to_vec(),
            timeslots: self.timeslots.ordered().into_iter().cloned().collect(),
            placements: self.placements.iter().cloned().collect(),
            objects: self.objects.list().to_vec(),
            milestones: self.milestones.list().to_vec(),
        }
    }

    pub fn timeslots(&self) -> &TimeslotRegistry {
        &self.timeslots
    }

    pub fn objects(&self) -> &ObjectRegistry {
        &self.objects
    }

    pub fn placements(&self) -> &PlacementLog {
        &self.placements
    }

    pub fn milestones(&self) -> &MilestoneRegistry {
        &self.milestones
    }

    /// Temporal query view over the current state.
    pub fn temporal(&self) -> TemporalQuery<'_> {
        TemporalQuery::new(&self.timeslots, &self.placements, &self.objects)
    }

    /// Thread query view over the current state.
    pub fn threads(&self) -> ThreadQuery<'_> {
        ThreadQuery::new(&self.timeslots, &self.placements, &self.objects)
    }

    /// Whether any card or placement still references the timeslot.
    pub fn is_timeslot_referenced(&self, timeslot_id: TimeslotId) -> bool {
        self.placements.references_timeslot(timeslot_id)
            || self.objects.references_timeslot(timeslot_id)
    }

    /// Removes a timeslot only when no card or mutation references it.
    pub fn remove_timeslot_if_empty(&mut self, timeslot_id: TimeslotId) -> bool {
        let references: [&dyn TimeslotReferences; 2] = [&self.placements, &self.objects];
        self.timeslots.remove_if_empty(timeslot_id, &references)
    }

    /// Sum of registry revisions. Changes whenever any registry changes.
    pub fn revision(&self) -> u64 {
        self.timeslots.revision()
            + self.objects.revision()
            + self.placements.revision()
            + self.milestones.revision()
    }
}
