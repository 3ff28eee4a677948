//! Object registry: tracked entities, hierarchy and thread flags.
//!
//! # Responsibility
//! - Own base records of every tracked object.
//! - Keep the parent hierarchy acyclic.
//! - Project thread views for objects flagged `is_thread`.
//!
//! # Invariants
//! - Every stored object passes `StoryObject::validate()`.
//! - Parent links never form a cycle.
//! - Listing order is creation order.

use crate::model::object::{
    AttributeMap, ObjectId, ObjectValidationError, Section, StoryObject, Thread,
};
use crate::model::timeslot::TimeslotId;
use crate::registry::timeslot_registry::TimeslotReferences;
use log::debug;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by object registry operations.
pub type ObjectResult<T> = Result<T, ObjectError>;

/// Errors from object registry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    Validation(ObjectValidationError),
    NotFound(ObjectId),
    DuplicateId(ObjectId),
    ParentNotFound(ObjectId),
    /// Re-parenting would create a cycle.
    CycleDetected {
        object_id: ObjectId,
        parent_id: ObjectId,
    },
    /// Target object exists but is not flagged as thread.
    NotAThread(ObjectId),
    /// Removal refused because placements still reference the object.
    StillReferenced(ObjectId),
    /// Removal refused because other objects are parented under it.
    HasChildren(ObjectId),
}

impl Display for ObjectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "object not found: {id}"),
            Self::DuplicateId(id) => write!(f, "object already exists: {id}"),
            Self::ParentNotFound(id) => write!(f, "object parent not found: {id}"),
            Self::CycleDetected {
                object_id,
                parent_id,
            } => write!(
                f,
                "re-parenting would create cycle: object {object_id} under {parent_id}"
            ),
            Self::NotAThread(id) => write!(f, "object is not a thread: {id}"),
            Self::StillReferenced(id) => write!(f, "object is still placed on the timeline: {id}"),
            Self::HasChildren(id) => write!(f, "object still has children: {id}"),
        }
    }
}

impl Error for ObjectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ObjectValidationError> for ObjectError {
    fn from(value: ObjectValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Shallow-merge patch for [`ObjectRegistry::update`].
///
/// Hierarchy and timeline fields have dedicated methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectPatch {
    pub name: Option<String>,
    pub aliases: Option<Vec<String>>,
    pub type_id: Option<Option<String>>,
    pub attributes: Option<AttributeMap>,
    pub content: Option<String>,
    pub sections: Option<Vec<Section>>,
    pub is_thread: Option<bool>,
    pub thread_color: Option<Option<String>>,
    pub show_on_timeline: Option<bool>,
    pub show_connecting_lines: Option<bool>,
}

/// In-memory object registry.
#[derive(Debug, Default, Clone)]
pub struct ObjectRegistry {
    objects: Vec<StoryObject>,
    revision: u64,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from persisted objects, re-checking every invariant.
    pub fn from_objects(objects: Vec<StoryObject>) -> ObjectResult<Self> {
        let mut registry = Self::new();
        for object in &objects {
            object.validate()?;
            if registry.get(object.id).is_some() {
                return Err(ObjectError::DuplicateId(object.id));
            }
            registry.objects.push(object.clone());
        }
        for object in &objects {
            if let Some(parent_id) = object.parent_id {
                if registry.get(parent_id).is_none() {
                    return Err(ObjectError::ParentNotFound(parent_id));
                }
                if registry.would_create_cycle(object.id, parent_id) {
                    return Err(ObjectError::CycleDetected {
                        object_id: object.id,
                        parent_id,
                    });
                }
            }
        }
        Ok(registry)
    }

    /// Registers one object.
    pub fn create(&mut self, object: StoryObject) -> ObjectResult<ObjectId> {
        let id = object.id;
        self.restore_at(self.objects.len(), object)?;
        Ok(id)
    }

    /// Inserts one object at a listing position (used to undo removals).
    pub fn restore_at(&mut self, index: usize, object: StoryObject) -> ObjectResult<()> {
        object.validate()?;
        if self.get(object.id).is_some() {
            return Err(ObjectError::DuplicateId(object.id));
        }
        if let Some(parent_id) = object.parent_id {
            if self.get(parent_id).is_none() {
                return Err(ObjectError::ParentNotFound(parent_id));
            }
        }
        debug!(
            "event=object_insert module=objects status=ok id={} thread={}",
            object.id, object.is_thread
        );
        let index = index.min(self.objects.len());
        self.objects.insert(index, object);
        self.bump();
        Ok(())
    }

    /// Shallow-merges `patch`. Returns the previous value.
    pub fn update(&mut self, id: ObjectId, patch: ObjectPatch) -> ObjectResult<StoryObject> {
        let position = self.position(id).ok_or(ObjectError::NotFound(id))?;
        let previous = self.objects[position].clone();
        let mut next = previous.clone();

        if let Some(name) = patch.name {
            next.name = name.trim().to_string();
        }
        if let Some(aliases) = patch.aliases {
            next.aliases = aliases;
        }
        if let Some(type_id) = patch.type_id {
            next.type_id = type_id;
        }
        if let Some(attributes) = patch.attributes {
            next.attributes = attributes;
        }
        if let Some(content) = patch.content {
            next.content = content;
        }
        if let Some(sections) = patch.sections {
            next.sections = sections;
        }
        if let Some(is_thread) = patch.is_thread {
            next.is_thread = is_thread;
        }
        if let Some(thread_color) = patch.thread_color {
            next.thread_color = thread_color;
        }
        if let Some(show) = patch.show_on_timeline {
            next.show_on_timeline = show;
        }
        if let Some(show) = patch.show_connecting_lines {
            next.show_connecting_lines = show;
        }
        next.validate()?;

        self.objects[position] = next;
        self.bump();
        Ok(previous)
    }

    /// Overwrites one object with an exact earlier value.
    pub fn replace(&mut self, object: StoryObject) -> ObjectResult<StoryObject> {
        object.validate()?;
        let position = self
            .position(object.id)
            .ok_or(ObjectError::NotFound(object.id))?;
        let previous = std::mem::replace(&mut self.objects[position], object);
        self.bump();
        Ok(previous)
    }

    /// Moves one object under `parent_id` (or to root). Returns the old parent.
    pub fn set_parent(
        &mut self,
        id: ObjectId,
        parent_id: Option<ObjectId>,
    ) -> ObjectResult<Option<ObjectId>> {
        let position = self.position(id).ok_or(ObjectError::NotFound(id))?;
        if let Some(parent_id) = parent_id {
            if self.get(parent_id).is_none() {
                return Err(ObjectError::ParentNotFound(parent_id));
            }
            if self.would_create_cycle(id, parent_id) {
                return Err(ObjectError::CycleDetected {
                    object_id: id,
                    parent_id,
                });
            }
        }
        let previous = std::mem::replace(&mut self.objects[position].parent_id, parent_id);
        self.bump();
        Ok(previous)
    }

    /// Sets the card timeslot. Returns the previous `timeslot_id`.
    pub fn mark_rendered(
        &mut self,
        id: ObjectId,
        timeslot_id: TimeslotId,
    ) -> ObjectResult<Option<TimeslotId>> {
        self.set_rendering(id, Some(timeslot_id))
    }

    /// Clears the card timeslot. Returns the previous `timeslot_id`.
    pub fn mark_unrendered(&mut self, id: ObjectId) -> ObjectResult<Option<TimeslotId>> {
        self.set_rendering(id, None)
    }

    /// Sets or clears the card timeslot, keeping `rendered` in sync.
    pub fn set_rendering(
        &mut self,
        id: ObjectId,
        timeslot_id: Option<TimeslotId>,
    ) -> ObjectResult<Option<TimeslotId>> {
        let position = self.position(id).ok_or(ObjectError::NotFound(id))?;
        let object = &mut self.objects[position];
        let previous = object.timeslot_id;
        object.timeslot_id = timeslot_id;
        object.rendered = timeslot_id.is_some();
        self.bump();
        Ok(previous)
    }

    /// Removes one object. Returns its listing position and value.
    pub fn remove(&mut self, id: ObjectId) -> Option<(usize, StoryObject)> {
        let position = self.position(id)?;
        let removed = self.objects.remove(position);
        self.bump();
        Some((position, removed))
    }

    pub fn get(&self, id: ObjectId) -> Option<&StoryObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// All objects in creation order.
    pub fn list(&self) -> &[StoryObject] {
        &self.objects
    }

    /// Direct children of one parent; `None` lists root objects.
    pub fn children(&self, parent_id: Option<ObjectId>) -> Vec<&StoryObject> {
        self.objects
            .iter()
            .filter(|object| object.parent_id == parent_id)
            .collect()
    }

    /// Thread views in creation order.
    pub fn threads(&self) -> Vec<Thread> {
        self.objects.iter().filter_map(Thread::from_object).collect()
    }

    /// Returns the object when it exists and is flagged as thread.
    pub fn require_thread(&self, id: ObjectId) -> ObjectResult<&StoryObject> {
        let object = self.get(id).ok_or(ObjectError::NotFound(id))?;
        if !object.is_thread {
            return Err(ObjectError::NotAThread(id));
        }
        Ok(object)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Monotonic change counter for dirty checking.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, id: ObjectId) -> Option<usize> {
        self.objects.iter().position(|object| object.id == id)
    }

    fn would_create_cycle(&self, object_id: ObjectId, candidate_parent: ObjectId) -> bool {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent);
        while let Some(current) = cursor {
            if current == object_id || !visited.insert(current) {
                return true;
            }
            cursor = self.get(current).and_then(|object| object.parent_id);
        }
        false
    }

    fn bump(&mut self) {
        self.revision += 1;
    }
}

impl TimeslotReferences for ObjectRegistry {
    fn references_timeslot(&self, timeslot_id: TimeslotId) -> bool {
        self.objects
            .iter()
            .any(|object| object.timeslot_id == Some(timeslot_id))
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectError, ObjectPatch, ObjectRegistry};
    use crate::model::object::StoryObject;
    use crate::registry::timeslot_registry::TimeslotReferences;
    use uuid::Uuid;

    #[test]
    fn set_parent_rejects_cycles() {
        let mut registry = ObjectRegistry::new();
        let city = registry.create(StoryObject::new("City")).unwrap();
        let district = registry.create(StoryObject::new("District")).unwrap();
        registry.set_parent(district, Some(city)).unwrap();

        let err = registry.set_parent(city, Some(district)).unwrap_err();
        assert_eq!(
            err,
            ObjectError::CycleDetected {
                object_id: city,
                parent_id: district
            }
        );
        assert_eq!(registry.children(Some(city)).len(), 1);
    }

    #[test]
    fn rendering_keeps_flag_in_sync() {
        let mut registry = ObjectRegistry::new();
        let id = registry.create(StoryObject::new("Mara")).unwrap();
        let slot = Uuid::new_v4();

        assert_eq!(registry.mark_rendered(id, slot).unwrap(), None);
        assert!(registry.get(id).unwrap().rendered);
        assert!(registry.references_timeslot(slot));

        assert_eq!(registry.mark_unrendered(id).unwrap(), Some(slot));
        assert!(!registry.get(id).unwrap().rendered);
        assert!(!registry.references_timeslot(slot));
    }

    #[test]
    fn update_rejects_blank_name_and_keeps_state() {
        let mut registry = ObjectRegistry::new();
        let id = registry.create(StoryObject::new("Mara")).unwrap();
        let err = registry
            .update(
                id,
                ObjectPatch {
                    name: Some("  ".to_string()),
                    ..ObjectPatch::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ObjectError::Validation(_)));
        assert_eq!(registry.get(id).unwrap().name, "Mara");
    }

    #[test]
    fn require_thread_distinguishes_plain_objects() {
        let mut registry = ObjectRegistry::new();
        let plain = registry.create(StoryObject::new("Mara")).unwrap();
        let thread = registry
            .create(StoryObject::new_thread("Heist", "#00f"))
            .unwrap();

        assert_eq!(
            registry.require_thread(plain).unwrap_err(),
            ObjectError::NotAThread(plain)
        );
        assert!(registry.require_thread(thread).is_ok());
        assert_eq!(registry.threads().len(), 1);
    }

    #[test]
    fn from_objects_rejects_missing_parent() {
        let mut child = StoryObject::new("Orphan");
        let ghost = Uuid::new_v4();
        child.parent_id = Some(ghost);
        let err = ObjectRegistry::from_objects(vec![child]).unwrap_err();
        assert_eq!(err, ObjectError::ParentNotFound(ghost));
    }
}
