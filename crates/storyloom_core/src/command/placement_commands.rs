//! Card and mutation placement commands.
//!
//! # Invariants
//! - A card (Creation placement) and its object's `timeslot_id` move
//!   together: placing, moving or removing a card updates both.
//! - Every placement written here references an ordered timeslot and a
//!   registered object at write time.

use crate::command::{EditError, EditResult};
use crate::history::Command;
use crate::model::object::ObjectId;
use crate::model::placement::{MutationPayload, Placement, PlacementId};
use crate::model::timeslot::TimeslotId;
use crate::project::Project;
use crate::registry::object_registry::ObjectError;
use crate::registry::placement_log::{PlacementError, PlacementPatch};
use crate::registry::timeslot_registry::TimeslotError;

fn ensure_timeslot(project: &Project, timeslot_id: TimeslotId) -> EditResult<()> {
    if !project.timeslots.contains(timeslot_id) {
        return Err(TimeslotError::NotFound(timeslot_id).into());
    }
    Ok(())
}

fn ensure_object(project: &Project, object_id: ObjectId) -> EditResult<()> {
    if project.objects.get(object_id).is_none() {
        return Err(ObjectError::NotFound(object_id).into());
    }
    Ok(())
}

/// Puts an object's card on the timeline.
#[derive(Debug)]
pub struct PlaceObject {
    card: Placement,
    previous_timeslot: Option<Option<TimeslotId>>,
}

impl PlaceObject {
    pub fn new(object_id: ObjectId, timeslot_id: TimeslotId) -> Self {
        Self {
            card: Placement::creation(object_id, timeslot_id),
            previous_timeslot: None,
        }
    }

    /// Id the card gets on execute.
    pub fn card_id(&self) -> PlacementId {
        self.card.id
    }
}

impl Command<Project> for PlaceObject {
    type Error = EditError;

    fn description(&self) -> &str {
        "Place card"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        ensure_timeslot(project, self.card.timeslot_id)?;
        ensure_object(project, self.card.object_id)?;
        let added = project.placements.add(self.card.clone())?;
        match project
            .objects
            .mark_rendered(added.object_id, added.timeslot_id)
        {
            Ok(previous) => {
                self.previous_timeslot = Some(previous);
                self.card = added;
                Ok(())
            }
            Err(err) => {
                project.placements.remove(added.id);
                Err(err.into())
            }
        }
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = self
            .previous_timeslot
            .take()
            .ok_or(EditError::NotExecuted("Place card"))?;
        project
            .placements
            .remove(self.card.id)
            .ok_or(PlacementError::NotFound(self.card.id))?;
        project
            .objects
            .set_rendering(self.card.object_id, previous)?;
        Ok(())
    }
}

/// Records one attribute/content delta at a timeslot.
#[derive(Debug)]
pub struct AddMutation {
    placement: Placement,
    description: &'static str,
    executed: bool,
}

impl AddMutation {
    pub fn new(object_id: ObjectId, timeslot_id: TimeslotId, payload: MutationPayload) -> Self {
        Self::from_placement(Placement::mutation(object_id, timeslot_id, payload))
    }

    /// Wraps a prepared placement (tags, attachment already set).
    pub fn from_placement(placement: Placement) -> Self {
        Self {
            placement,
            description: "Add change",
            executed: false,
        }
    }

    /// Overrides the history label ("Paste change").
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    pub fn placement_id(&self) -> PlacementId {
        self.placement.id
    }
}

impl Command<Project> for AddMutation {
    type Error = EditError;

    fn description(&self) -> &str {
        self.description
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        if !self.placement.is_mutation() {
            return Err(EditError::NotAMutation(self.placement.id));
        }
        ensure_timeslot(project, self.placement.timeslot_id)?;
        ensure_object(project, self.placement.object_id)?;
        if let Some(card_id) = self.placement.attached_to_card_id {
            project
                .placements
                .get(card_id)
                .ok_or(PlacementError::NotFound(card_id))?;
        }
        self.placement = project.placements.add(self.placement.clone())?;
        self.executed = true;
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        if !self.executed {
            return Err(EditError::NotExecuted("Add change"));
        }
        project
            .placements
            .remove(self.placement.id)
            .ok_or(PlacementError::NotFound(self.placement.id))?;
        self.executed = false;
        Ok(())
    }
}

/// Shallow-merges fields of one placement.
///
/// Moving a card to another timeslot also moves its object's `timeslot_id`.
#[derive(Debug)]
pub struct UpdatePlacement {
    placement_id: PlacementId,
    patch: PlacementPatch,
    description: &'static str,
    previous: Option<Placement>,
    previous_object_timeslot: Option<Option<TimeslotId>>,
}

impl UpdatePlacement {
    pub fn new(placement_id: PlacementId, patch: PlacementPatch) -> Self {
        Self::labeled(placement_id, patch, "Edit placement")
    }

    /// Same as `new` with a custom history label.
    pub fn labeled(
        placement_id: PlacementId,
        patch: PlacementPatch,
        description: &'static str,
    ) -> Self {
        Self {
            placement_id,
            patch,
            description,
            previous: None,
            previous_object_timeslot: None,
        }
    }
}

impl Command<Project> for UpdatePlacement {
    type Error = EditError;

    fn description(&self) -> &str {
        self.description
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        if let Some(timeslot_id) = self.patch.timeslot_id {
            ensure_timeslot(project, timeslot_id)?;
        }
        let previous = project
            .placements
            .update(self.placement_id, self.patch.clone())?;

        self.previous_object_timeslot = None;
        if previous.is_creation() {
            if let Some(timeslot_id) = self.patch.timeslot_id {
                match project
                    .objects
                    .mark_rendered(previous.object_id, timeslot_id)
                {
                    Ok(old) => self.previous_object_timeslot = Some(old),
                    Err(err) => {
                        project.placements.replace(previous)?;
                        return Err(err.into());
                    }
                }
            }
        }
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotExecuted("Edit placement"))?;
        if let Some(old) = self.previous_object_timeslot.take() {
            project.objects.set_rendering(previous.object_id, old)?;
        }
        project.placements.replace(previous)?;
        Ok(())
    }
}

/// Removes one placement. Removing a card takes the object off the timeline.
#[derive(Debug)]
pub struct RemovePlacement {
    placement_id: PlacementId,
    description: &'static str,
    removed: Option<(usize, Placement)>,
    previous_object_timeslot: Option<Option<TimeslotId>>,
}

impl RemovePlacement {
    pub fn new(placement_id: PlacementId) -> Self {
        Self {
            placement_id,
            description: "Detach change",
            removed: None,
            previous_object_timeslot: None,
        }
    }
}

impl Command<Project> for RemovePlacement {
    type Error = EditError;

    fn description(&self) -> &str {
        self.description
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let (position, removed) = project
            .placements
            .remove(self.placement_id)
            .ok_or(PlacementError::NotFound(self.placement_id))?;

        self.previous_object_timeslot = None;
        if removed.is_creation() {
            self.description = "Remove card";
        }
        if removed.is_creation() && project.objects.get(removed.object_id).is_some() {
            let old = project.objects.mark_unrendered(removed.object_id)?;
            self.previous_object_timeslot = Some(old);
        }
        self.removed = Some((position, removed));
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let (position, placement) = self
            .removed
            .take()
            .ok_or(EditError::NotExecuted(self.description))?;
        if let Some(old) = self.previous_object_timeslot.take() {
            project.objects.set_rendering(placement.object_id, old)?;
        }
        project.placements.restore_at(position, placement)?;
        Ok(())
    }
}
