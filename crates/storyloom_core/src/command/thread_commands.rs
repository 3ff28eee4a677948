//! Thread tagging, subthread targeting and card promotion commands.
//!
//! # Invariants
//! - `thread_ids` keeps set semantics: tagging twice or untagging a missing
//!   tag is a successful no-op.
//! - Only objects flagged `is_thread` can be added as tags.
//! - A card reached by a thread only through an attached placement refuses
//!   subthread targeting until it is promoted.

use crate::command::{EditError, EditResult};
use crate::history::Command;
use crate::model::object::{ObjectId, SectionId};
use crate::model::placement::{Placement, PlacementId};
use crate::project::Project;
use crate::registry::placement_log::{PlacementError, PlacementPatch};

fn placement(project: &Project, id: PlacementId) -> EditResult<&Placement> {
    Ok(project
        .placements
        .get(id)
        .ok_or(PlacementError::NotFound(id))?)
}

fn write_thread_ids(
    project: &mut Project,
    placement_id: PlacementId,
    thread_ids: Vec<ObjectId>,
) -> EditResult<Placement> {
    let previous = project.placements.update(
        placement_id,
        PlacementPatch {
            thread_ids: Some(thread_ids),
            ..PlacementPatch::default()
        },
    )?;
    Ok(previous)
}

fn restore(
    project: &mut Project,
    previous: Option<Option<Placement>>,
    label: &'static str,
) -> EditResult<()> {
    match previous {
        None => Err(EditError::NotExecuted(label)),
        Some(None) => Ok(()),
        Some(Some(previous)) => {
            project.placements.replace(previous)?;
            Ok(())
        }
    }
}

/// Tags one placement with a thread.
#[derive(Debug)]
pub struct AddThreadTag {
    placement_id: PlacementId,
    thread_id: ObjectId,
    /// `Some(None)` when execute found the tag already present.
    previous: Option<Option<Placement>>,
}

impl AddThreadTag {
    pub fn new(placement_id: PlacementId, thread_id: ObjectId) -> Self {
        Self {
            placement_id,
            thread_id,
            previous: None,
        }
    }
}

impl Command<Project> for AddThreadTag {
    type Error = EditError;

    fn description(&self) -> &str {
        "Add to thread"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        project.objects.require_thread(self.thread_id)?;
        let current = placement(project, self.placement_id)?;
        if current.has_thread(self.thread_id) {
            self.previous = Some(None);
            return Ok(());
        }
        let mut thread_ids = current.thread_ids.clone();
        thread_ids.push(self.thread_id);
        let previous = write_thread_ids(project, self.placement_id, thread_ids)?;
        self.previous = Some(Some(previous));
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        restore(project, self.previous.take(), "Add to thread")
    }
}

/// Removes one thread tag from a placement.
#[derive(Debug)]
pub struct RemoveThreadTag {
    placement_id: PlacementId,
    thread_id: ObjectId,
    previous: Option<Option<Placement>>,
}

impl RemoveThreadTag {
    pub fn new(placement_id: PlacementId, thread_id: ObjectId) -> Self {
        Self {
            placement_id,
            thread_id,
            previous: None,
        }
    }
}

impl Command<Project> for RemoveThreadTag {
    type Error = EditError;

    fn description(&self) -> &str {
        "Remove from thread"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let current = placement(project, self.placement_id)?;
        if !current.has_thread(self.thread_id) {
            self.previous = Some(None);
            return Ok(());
        }
        let thread_ids = current
            .thread_ids
            .iter()
            .copied()
            .filter(|id| *id != self.thread_id)
            .collect();
        let previous = write_thread_ids(project, self.placement_id, thread_ids)?;
        self.previous = Some(Some(previous));
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        restore(project, self.previous.take(), "Remove from thread")
    }
}

/// Restricts a placement to sections of its threads. Empty means whole thread.
#[derive(Debug)]
pub struct SetSubthreads {
    placement_id: PlacementId,
    subthread_ids: Vec<SectionId>,
    previous: Option<Placement>,
}

impl SetSubthreads {
    pub fn new(placement_id: PlacementId, subthread_ids: Vec<SectionId>) -> Self {
        let mut unique = Vec::with_capacity(subthread_ids.len());
        for id in subthread_ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        Self {
            placement_id,
            subthread_ids: unique,
            previous: None,
        }
    }
}

impl Command<Project> for SetSubthreads {
    type Error = EditError;

    fn description(&self) -> &str {
        "Set subthreads"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let current = placement(project, self.placement_id)?;
        if current.is_creation() {
            let pending = project.threads().pending_promotions(self.placement_id);
            if !pending.is_empty() {
                return Err(EditError::NeedsPromotion {
                    card_id: self.placement_id,
                    thread_ids: pending,
                });
            }
        }
        let previous = project.placements.update(
            self.placement_id,
            PlacementPatch {
                subthread_ids: Some(self.subthread_ids.clone()),
                ..PlacementPatch::default()
            },
        )?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotExecuted("Set subthreads"))?;
        project.placements.replace(previous)?;
        Ok(())
    }
}

/// Tags a card with a thread it only reaches through an attached placement.
#[derive(Debug)]
pub struct PromoteCard {
    card_id: PlacementId,
    thread_id: ObjectId,
    previous: Option<Placement>,
}

impl PromoteCard {
    pub fn new(card_id: PlacementId, thread_id: ObjectId) -> Self {
        Self {
            card_id,
            thread_id,
            previous: None,
        }
    }
}

impl Command<Project> for PromoteCard {
    type Error = EditError;

    fn description(&self) -> &str {
        "Promote card into thread"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let card = placement(project, self.card_id)?;
        if !card.is_creation() {
            return Err(EditError::NotACard(self.card_id));
        }
        if !project.threads().needs_promotion(self.card_id, self.thread_id) {
            return Err(EditError::PromotionNotNeeded {
                card_id: self.card_id,
                thread_id: self.thread_id,
            });
        }
        let mut thread_ids = card.thread_ids.clone();
        thread_ids.push(self.thread_id);
        let previous = write_thread_ids(project, self.card_id, thread_ids)?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotExecuted("Promote card into thread"))?;
        project.placements.replace(previous)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{AddThreadTag, PromoteCard, RemoveThreadTag, SetSubthreads};
    use crate::command::EditError;
    use crate::history::Command;
    use crate::model::object::{Section, StoryObject};
    use crate::model::placement::{MutationPayload, Placement, PlacementId};
    use crate::project::Project;
    use crate::registry::object_registry::ObjectError;
    use uuid::Uuid;

    struct Fixture {
        project: Project,
        thread: Uuid,
        section: Uuid,
        card: PlacementId,
        attached: PlacementId,
    }

    fn fixture() -> Fixture {
        let mut project = Project::new();
        let slot = project.timeslots.create_at_end();
        let mut thread_object = StoryObject::new_thread("Heist", "#f00");
        let section = Section::new("Planning", "");
        let section_id = section.id;
        thread_object.sections.push(section);
        let thread = project.objects.create(thread_object).unwrap();
        let vault = project.objects.create(StoryObject::new("Vault")).unwrap();
        let mara = project.objects.create(StoryObject::new("Mara")).unwrap();

        let card = project
            .placements
            .add(Placement::creation(vault, slot))
            .unwrap()
            .id;
        let attached = project
            .placements
            .add(Placement::mutation(mara, slot, MutationPayload::new("cracks")).attached_to(card))
            .unwrap()
            .id;
        Fixture {
            project,
            thread,
            section: section_id,
            card,
            attached,
        }
    }

    #[test]
    fn tagging_is_idempotent_and_undoable() {
        let Fixture {
            mut project,
            thread,
            attached,
            ..
        } = fixture();

        let mut first = AddThreadTag::new(attached, thread);
        first.execute(&mut project).unwrap();
        let mut second = AddThreadTag::new(attached, thread);
        second.execute(&mut project).unwrap();
        assert_eq!(project.placements().get(attached).unwrap().thread_ids, vec![thread]);

        second.undo(&mut project).unwrap();
        assert_eq!(project.placements().get(attached).unwrap().thread_ids, vec![thread]);
        first.undo(&mut project).unwrap();
        assert!(project.placements().get(attached).unwrap().thread_ids.is_empty());
    }

    #[test]
    fn tagging_requires_thread_object() {
        let Fixture {
            mut project,
            attached,
            ..
        } = fixture();
        let plain = project.objects.create(StoryObject::new("Coin")).unwrap();

        let err = AddThreadTag::new(attached, plain)
            .execute(&mut project)
            .unwrap_err();
        assert_eq!(err, EditError::Object(ObjectError::NotAThread(plain)));
    }

    #[test]
    fn untag_missing_tag_is_no_op() {
        let Fixture {
            mut project,
            thread,
            card,
            ..
        } = fixture();
        let mut command = RemoveThreadTag::new(card, thread);
        command.execute(&mut project).unwrap();
        command.undo(&mut project).unwrap();
        assert!(project.placements().get(card).unwrap().thread_ids.is_empty());
    }

    #[test]
    fn subthreads_on_card_wait_for_promotion() {
        let Fixture {
            mut project,
            thread,
            section,
            card,
            attached,
        } = fixture();
        AddThreadTag::new(attached, thread)
            .execute(&mut project)
            .unwrap();

        let err = SetSubthreads::new(card, vec![section])
            .execute(&mut project)
            .unwrap_err();
        assert_eq!(
            err,
            EditError::NeedsPromotion {
                card_id: card,
                thread_ids: vec![thread]
            }
        );

        let mut promote = PromoteCard::new(card, thread);
        promote.execute(&mut project).unwrap();
        SetSubthreads::new(card, vec![section, section])
            .execute(&mut project)
            .unwrap();
        assert_eq!(
            project.placements().get(card).unwrap().subthread_ids,
            vec![section]
        );
    }

    #[test]
    fn promote_rejects_mutations_and_unneeded_promotion() {
        let Fixture {
            mut project,
            thread,
            card,
            attached,
            ..
        } = fixture();

        let err = PromoteCard::new(attached, thread)
            .execute(&mut project)
            .unwrap_err();
        assert_eq!(err, EditError::NotACard(attached));

        let err = PromoteCard::new(card, thread)
            .execute(&mut project)
            .unwrap_err();
        assert_eq!(
            err,
            EditError::PromotionNotNeeded {
                card_id: card,
                thread_id: thread
            }
        );
    }

    #[test]
    fn promote_undo_drops_card_tag() {
        let Fixture {
            mut project,
            thread,
            card,
            attached,
            ..
        } = fixture();
        AddThreadTag::new(attached, thread)
            .execute(&mut project)
            .unwrap();

        let mut promote = PromoteCard::new(card, thread);
        promote.execute(&mut project).unwrap();
        assert!(project.placements().get(card).unwrap().has_thread(thread));
        assert!(!project.threads().needs_promotion(card, thread));

        promote.undo(&mut project).unwrap();
        assert!(project.threads().needs_promotion(card, thread));
    }
}
