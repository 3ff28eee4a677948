//! Timeslot insert/move/remove commands.

use crate::command::{EditError, EditResult};
use crate::history::Command;
use crate::model::milestone::MilestoneId;
use crate::model::timeslot::{Timeslot, TimeslotId};
use crate::project::Project;
use crate::registry::timeslot_registry::{InsertPosition, TimeslotError};

/// Inserts one timeslot. The id is fixed at construction.
#[derive(Debug)]
pub struct CreateTimeslot {
    timeslot: Timeslot,
    position: InsertPosition,
}

impl CreateTimeslot {
    pub fn new(position: InsertPosition) -> Self {
        Self {
            timeslot: Timeslot::new(),
            position,
        }
    }

    /// Id the timeslot gets on execute.
    pub fn timeslot_id(&self) -> TimeslotId {
        self.timeslot.id
    }
}

impl Command<Project> for CreateTimeslot {
    type Error = EditError;

    fn description(&self) -> &str {
        "Insert timeslot"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        project
            .timeslots
            .insert(self.timeslot.clone(), self.position)?;
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        project
            .timeslots
            .remove(self.timeslot.id)
            .ok_or(TimeslotError::NotFound(self.timeslot.id))?;
        Ok(())
    }
}

/// Moves one timeslot to a new rank.
#[derive(Debug)]
pub struct MoveTimeslot {
    timeslot_id: TimeslotId,
    to: usize,
    from: Option<usize>,
}

impl MoveTimeslot {
    pub fn new(timeslot_id: TimeslotId, to: usize) -> Self {
        Self {
            timeslot_id,
            to,
            from: None,
        }
    }
}

impl Command<Project> for MoveTimeslot {
    type Error = EditError;

    fn description(&self) -> &str {
        "Move timeslot"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let from = project
            .timeslots
            .index_of(self.timeslot_id)
            .ok_or(TimeslotError::NotFound(self.timeslot_id))?;
        project.timeslots.move_to_index(self.timeslot_id, self.to);
        self.from = Some(from);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let from = self.from.ok_or(EditError::NotExecuted("Move timeslot"))?;
        project.timeslots.move_to_index(self.timeslot_id, from);
        Ok(())
    }
}

/// Removes one timeslot when no card or mutation references it.
///
/// Milestones anchored to the removed timeslot move to the timeslot that
/// takes its rank; with no successor they are left dangling.
#[derive(Debug)]
pub struct RemoveTimeslot {
    timeslot_id: TimeslotId,
    removed: Option<(usize, Timeslot)>,
    reanchored: Vec<MilestoneId>,
}

impl RemoveTimeslot {
    pub fn new(timeslot_id: TimeslotId) -> Self {
        Self {
            timeslot_id,
            removed: None,
            reanchored: Vec::new(),
        }
    }
}

impl Command<Project> for RemoveTimeslot {
    type Error = EditError;

    fn description(&self) -> &str {
        "Remove timeslot"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let id = self.timeslot_id;
        let rank = project
            .timeslots
            .index_of(id)
            .ok_or(TimeslotError::NotFound(id))?;
        let record = project
            .timeslots
            .get(id)
            .cloned()
            .ok_or(TimeslotError::NotFound(id))?;
        let successor = project.timeslots.id_at(rank + 1);

        if !project.remove_timeslot_if_empty(id) {
            return Err(TimeslotError::NotEmpty(id).into());
        }
        self.reanchored = match successor {
            Some(next) => project.milestones.reanchor(id, Some(next)),
            None => Vec::new(),
        };
        self.removed = Some((rank, record));
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let (rank, record) = self
            .removed
            .take()
            .ok_or(EditError::NotExecuted("Remove timeslot"))?;
        project
            .timeslots
            .insert(record, InsertPosition::At(rank))?;
        for milestone_id in self.reanchored.drain(..) {
            if let Some(milestone) = project.milestones.get(milestone_id) {
                let mut restored = milestone.clone();
                restored.timeslot_id = Some(self.timeslot_id);
                project.milestones.replace(restored)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateTimeslot, MoveTimeslot, RemoveTimeslot};
    use crate::command::EditError;
    use crate::history::Command;
    use crate::model::milestone::Milestone;
    use crate::model::placement::Placement;
    use crate::project::Project;
    use crate::registry::timeslot_registry::{InsertPosition, TimeslotError};
    use uuid::Uuid;

    #[test]
    fn create_redo_reuses_identity() {
        let mut project = Project::new();
        let mut command = CreateTimeslot::new(InsertPosition::End);
        let id = command.timeslot_id();

        command.execute(&mut project).unwrap();
        command.undo(&mut project).unwrap();
        assert!(project.timeslots().is_empty());
        command.execute(&mut project).unwrap();
        assert_eq!(project.timeslots().id_at(0), Some(id));
    }

    #[test]
    fn move_undo_restores_rank() {
        let mut project = Project::new();
        let a = project.timeslots.create_at_end();
        let b = project.timeslots.create_at_end();
        let mut command = MoveTimeslot::new(a, 1);

        command.execute(&mut project).unwrap();
        assert_eq!(project.timeslots().order(), &[b, a]);
        command.undo(&mut project).unwrap();
        assert_eq!(project.timeslots().order(), &[a, b]);
    }

    #[test]
    fn remove_refuses_referenced_timeslot() {
        let mut project = Project::new();
        let a = project.timeslots.create_at_end();
        project
            .placements
            .add(Placement::creation(Uuid::new_v4(), a))
            .unwrap();

        let err = RemoveTimeslot::new(a).execute(&mut project).unwrap_err();
        assert_eq!(err, EditError::Timeslot(TimeslotError::NotEmpty(a)));
        assert_eq!(project.timeslots().index_of(a), Some(0));
    }

    #[test]
    fn remove_reanchors_milestones_and_undo_restores() {
        let mut project = Project::new();
        let a = project.timeslots.create_at_end();
        let b = project.timeslots.create_at_end();
        let milestone = project
            .milestones
            .create(Milestone::new("Act II", Some(a)), &project.timeslots)
            .unwrap();

        let mut command = RemoveTimeslot::new(a);
        command.execute(&mut project).unwrap();
        assert_eq!(project.milestones().get(milestone).unwrap().timeslot_id, Some(b));

        command.undo(&mut project).unwrap();
        assert_eq!(project.timeslots().order(), &[a, b]);
        assert_eq!(project.milestones().get(milestone).unwrap().timeslot_id, Some(a));
    }
}
