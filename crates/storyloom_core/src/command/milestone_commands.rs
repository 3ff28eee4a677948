//! Milestone create/update/remove commands.

use crate::command::{EditError, EditResult};
use crate::history::Command;
use crate::model::milestone::{Milestone, MilestoneId};
use crate::project::Project;
use crate::registry::milestone_registry::{MilestoneError, MilestonePatch};

/// Registers one milestone. The id is fixed at construction.
#[derive(Debug)]
pub struct CreateMilestone {
    milestone: Milestone,
}

impl CreateMilestone {
    pub fn new(milestone: Milestone) -> Self {
        Self { milestone }
    }

    pub fn milestone_id(&self) -> MilestoneId {
        self.milestone.id
    }
}

impl Command<Project> for CreateMilestone {
    type Error = EditError;

    fn description(&self) -> &str {
        "Add milestone"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        project
            .milestones
            .create(self.milestone.clone(), &project.timeslots)?;
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        project
            .milestones
            .remove(self.milestone.id)
            .ok_or(MilestoneError::NotFound(self.milestone.id))?;
        Ok(())
    }
}

/// Renames, re-anchors or restyles one milestone.
#[derive(Debug)]
pub struct UpdateMilestone {
    milestone_id: MilestoneId,
    patch: MilestonePatch,
    previous: Option<Milestone>,
}

impl UpdateMilestone {
    pub fn new(milestone_id: MilestoneId, patch: MilestonePatch) -> Self {
        Self {
            milestone_id,
            patch,
            previous: None,
        }
    }
}

impl Command<Project> for UpdateMilestone {
    type Error = EditError;

    fn description(&self) -> &str {
        "Edit milestone"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = project.milestones.update(
            self.milestone_id,
            self.patch.clone(),
            &project.timeslots,
        )?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotExecuted("Edit milestone"))?;
        project.milestones.replace(previous)?;
        Ok(())
    }
}

/// Removes one milestone.
#[derive(Debug)]
pub struct RemoveMilestone {
    milestone_id: MilestoneId,
    removed: Option<(usize, Milestone)>,
}

impl RemoveMilestone {
    pub fn new(milestone_id: MilestoneId) -> Self {
        Self {
            milestone_id,
            removed: None,
        }
    }
}

impl Command<Project> for RemoveMilestone {
    type Error = EditError;

    fn description(&self) -> &str {
        "Delete milestone"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let removed = project
            .milestones
            .remove(self.milestone_id)
            .ok_or(MilestoneError::NotFound(self.milestone_id))?;
        self.removed = Some(removed);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let (position, milestone) = self
            .removed
            .take()
            .ok_or(EditError::NotExecuted("Delete milestone"))?;
        // Anchor may dangle after later timeslot edits; restore it as it was.
        let anchor = milestone.timeslot_id;
        let mut unanchored = milestone;
        unanchored.timeslot_id = None;
        project
            .milestones
            .restore_at(position, unanchored.clone(), &project.timeslots)?;
        unanchored.timeslot_id = anchor;
        project.milestones.replace(unanchored)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateMilestone, RemoveMilestone, UpdateMilestone};
    use crate::command::EditError;
    use crate::history::Command;
    use crate::model::milestone::Milestone;
    use crate::project::Project;
    use crate::registry::milestone_registry::{MilestoneError, MilestonePatch};
    use uuid::Uuid;

    #[test]
    fn create_rejects_unknown_anchor() {
        let mut project = Project::new();
        let ghost = Uuid::new_v4();
        let err = CreateMilestone::new(Milestone::new("Part I", Some(ghost)))
            .execute(&mut project)
            .unwrap_err();
        assert_eq!(
            err,
            EditError::Milestone(MilestoneError::UnknownTimeslot(ghost))
        );
        assert!(project.milestones().is_empty());
    }

    #[test]
    fn update_undo_restores_previous_anchor() {
        let mut project = Project::new();
        let t1 = project.timeslots.create_at_end();
        let t2 = project.timeslots.create_at_end();
        let mut create = CreateMilestone::new(Milestone::new("Part I", Some(t1)));
        create.execute(&mut project).unwrap();
        let id = create.milestone_id();

        let mut update = UpdateMilestone::new(
            id,
            MilestonePatch {
                timeslot_id: Some(Some(t2)),
                ..MilestonePatch::default()
            },
        );
        update.execute(&mut project).unwrap();
        let milestone = project.milestones().get(id).unwrap();
        assert_eq!(
            project.milestones().rank_of(milestone, project.timeslots()),
            Some(1)
        );
        update.undo(&mut project).unwrap();
        assert_eq!(project.milestones().get(id).unwrap().timeslot_id, Some(t1));
    }

    #[test]
    fn remove_undo_keeps_listing_position_and_dangling_anchor() {
        let mut project = Project::new();
        let t1 = project.timeslots.create_at_end();
        let first = project
            .milestones
            .create(Milestone::new("Part I", Some(t1)), &project.timeslots)
            .unwrap();
        project
            .milestones
            .create(Milestone::new("Part II", None), &project.timeslots)
            .unwrap();

        let mut command = RemoveMilestone::new(first);
        command.execute(&mut project).unwrap();
        project.timeslots.remove(t1);

        command.undo(&mut project).unwrap();
        let restored = &project.milestones().list()[0];
        assert_eq!(restored.id, first);
        assert_eq!(restored.timeslot_id, Some(t1));
    }
}
