//! Object create/update/re-parent/remove commands.

use crate::command::{EditError, EditResult};
use crate::history::Command;
use crate::model::object::{ObjectId, StoryObject};
use crate::project::Project;
use crate::registry::object_registry::{ObjectError, ObjectPatch};

/// Registers one object.
#[derive(Debug)]
pub struct CreateObject {
    object: StoryObject,
}

impl CreateObject {
    pub fn new(object: StoryObject) -> Self {
        Self { object }
    }
}

impl Command<Project> for CreateObject {
    type Error = EditError;

    fn description(&self) -> &str {
        if self.object.is_thread {
            "Create thread"
        } else {
            "Create object"
        }
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        project.objects.create(self.object.clone())?;
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        project
            .objects
            .remove(self.object.id)
            .ok_or(ObjectError::NotFound(self.object.id))?;
        Ok(())
    }
}

/// Shallow-merges base fields of one object.
#[derive(Debug)]
pub struct UpdateObject {
    object_id: ObjectId,
    patch: ObjectPatch,
    previous: Option<StoryObject>,
}

impl UpdateObject {
    pub fn new(object_id: ObjectId, patch: ObjectPatch) -> Self {
        Self {
            object_id,
            patch,
            previous: None,
        }
    }
}

impl Command<Project> for UpdateObject {
    type Error = EditError;

    fn description(&self) -> &str {
        "Edit object"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = project.objects.update(self.object_id, self.patch.clone())?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotExecuted("Edit object"))?;
        project.objects.replace(previous)?;
        Ok(())
    }
}

/// Moves one object in the hierarchy.
#[derive(Debug)]
pub struct SetObjectParent {
    object_id: ObjectId,
    parent_id: Option<ObjectId>,
    previous: Option<Option<ObjectId>>,
}

impl SetObjectParent {
    pub fn new(object_id: ObjectId, parent_id: Option<ObjectId>) -> Self {
        Self {
            object_id,
            parent_id,
            previous: None,
        }
    }
}

impl Command<Project> for SetObjectParent {
    type Error = EditError;

    fn description(&self) -> &str {
        "Move object"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = project.objects.set_parent(self.object_id, self.parent_id)?;
        self.previous = Some(previous);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let previous = self
            .previous
            .take()
            .ok_or(EditError::NotExecuted("Move object"))?;
        project.objects.set_parent(self.object_id, previous)?;
        Ok(())
    }
}

/// Removes one object that is off the timeline and has no children.
#[derive(Debug)]
pub struct RemoveObject {
    object_id: ObjectId,
    removed: Option<(usize, StoryObject)>,
}

impl RemoveObject {
    pub fn new(object_id: ObjectId) -> Self {
        Self {
            object_id,
            removed: None,
        }
    }
}

impl Command<Project> for RemoveObject {
    type Error = EditError;

    fn description(&self) -> &str {
        "Delete object"
    }

    fn execute(&mut self, project: &mut Project) -> EditResult<()> {
        let id = self.object_id;
        let object = project.objects.get(id).ok_or(ObjectError::NotFound(id))?;
        if object.rendered || project.placements.references_object(id) {
            return Err(ObjectError::StillReferenced(id).into());
        }
        if !project.objects.children(Some(id)).is_empty() {
            return Err(ObjectError::HasChildren(id).into());
        }
        self.removed = project.objects.remove(id);
        Ok(())
    }

    fn undo(&mut self, project: &mut Project) -> EditResult<()> {
        let (position, object) = self
            .removed
            .take()
            .ok_or(EditError::NotExecuted("Delete object"))?;
        project.objects.restore_at(position, object)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CreateObject, RemoveObject, SetObjectParent, UpdateObject};
    use crate::command::EditError;
    use crate::history::Command;
    use crate::model::object::StoryObject;
    use crate::model::placement::Placement;
    use crate::project::Project;
    use crate::registry::object_registry::{ObjectError, ObjectPatch};
    use serde_json::json;

    #[test]
    fn update_undo_restores_exact_object() {
        let mut project = Project::new();
        let mut object = StoryObject::new("Mara");
        object.attributes.insert("age".to_string(), json!(30));
        let id = object.id;
        CreateObject::new(object.clone())
            .execute(&mut project)
            .unwrap();

        let mut command = UpdateObject::new(
            id,
            ObjectPatch {
                name: Some("Mara Vell".to_string()),
                attributes: Some(Default::default()),
                ..ObjectPatch::default()
            },
        );
        command.execute(&mut project).unwrap();
        assert_eq!(project.objects().get(id).unwrap().name, "Mara Vell");
        command.undo(&mut project).unwrap();
        assert_eq!(project.objects().get(id).unwrap(), &object);
    }

    #[test]
    fn set_parent_undo_restores_root() {
        let mut project = Project::new();
        let parent = project.objects.create(StoryObject::new("City")).unwrap();
        let child = project.objects.create(StoryObject::new("Dock")).unwrap();

        let mut command = SetObjectParent::new(child, Some(parent));
        command.execute(&mut project).unwrap();
        assert_eq!(project.objects().get(child).unwrap().parent_id, Some(parent));
        command.undo(&mut project).unwrap();
        assert_eq!(project.objects().get(child).unwrap().parent_id, None);
    }

    #[test]
    fn remove_refuses_placed_object_and_restores_position() {
        let mut project = Project::new();
        let slot = project.timeslots.create_at_end();
        let first = project.objects.create(StoryObject::new("A")).unwrap();
        let placed = project.objects.create(StoryObject::new("B")).unwrap();
        project
            .placements
            .add(Placement::creation(placed, slot))
            .unwrap();

        let err = RemoveObject::new(placed).execute(&mut project).unwrap_err();
        assert_eq!(err, EditError::Object(ObjectError::StillReferenced(placed)));

        let mut command = RemoveObject::new(first);
        command.execute(&mut project).unwrap();
        assert_eq!(project.objects().len(), 1);
        command.undo(&mut project).unwrap();
        assert_eq!(project.objects().list()[0].id, first);
    }
}
