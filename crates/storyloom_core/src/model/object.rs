//! Story object domain model.
//!
//! # Responsibility
//! - Define tracked entities (characters, places, items, threads) and their
//!   base attributes, body content and named sections.
//!
//! # Invariants
//! - `timeslot_id` is set iff `rendered` is true.
//! - An object is never its own parent.
//! - Section ids are unique within one object.
//! - Historical attribute values never live here; they live in mutation
//!   placements.

use crate::model::timeslot::TimeslotId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of one tracked object.
pub type ObjectId = Uuid;

/// Stable identifier of one named section inside an object body.
pub type SectionId = Uuid;

/// Attribute map keyed by attribute name.
///
/// `BTreeMap` keeps iteration order deterministic for comparisons and export.
pub type AttributeMap = BTreeMap<String, serde_json::Value>;

/// Named slice of a rich object body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub content: String,
}

impl Section {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Tracked entity whose state is reconstructed along the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryObject {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Free-form category id owned by the host application.
    #[serde(default)]
    pub type_id: Option<String>,
    /// Base attributes, independent of any timeslot.
    #[serde(default)]
    pub attributes: AttributeMap,
    /// Hierarchy parent. Unrelated to time.
    #[serde(default)]
    pub parent_id: Option<ObjectId>,
    /// Whether the object has a card on the timeline.
    #[serde(default)]
    pub rendered: bool,
    /// First visual placement moment. Set iff `rendered`.
    #[serde(default)]
    pub timeslot_id: Option<TimeslotId>,
    #[serde(default)]
    pub is_thread: bool,
    #[serde(default)]
    pub thread_color: Option<String>,
    #[serde(default = "default_true")]
    pub show_on_timeline: bool,
    #[serde(default = "default_true")]
    pub show_connecting_lines: bool,
    /// Base body content before any content mutation.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sections: Vec<Section>,
}

fn default_true() -> bool {
    true
}

impl StoryObject {
    /// Creates an unrendered, non-thread object with a generated id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            aliases: Vec::new(),
            type_id: None,
            attributes: AttributeMap::new(),
            parent_id: None,
            rendered: false,
            timeslot_id: None,
            is_thread: false,
            thread_color: None,
            show_on_timeline: true,
            show_connecting_lines: true,
            content: String::new(),
            sections: Vec::new(),
        }
    }

    /// Creates an object flagged as a narrative thread.
    pub fn new_thread(name: impl Into<String>, color: impl Into<String>) -> Self {
        let mut object = Self::new(name);
        object.is_thread = true;
        object.thread_color = Some(color.into());
        object
    }

    /// Looks up one section by id.
    pub fn section(&self, section_id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == section_id)
    }

    /// Validates object-local invariants.
    pub fn validate(&self) -> Result<(), ObjectValidationError> {
        if self.id.is_nil() {
            return Err(ObjectValidationError::NilId);
        }
        if self.name.trim().is_empty() {
            return Err(ObjectValidationError::BlankName);
        }
        if self.rendered != self.timeslot_id.is_some() {
            return Err(ObjectValidationError::RenderedMismatch {
                rendered: self.rendered,
            });
        }
        if self.parent_id == Some(self.id) {
            return Err(ObjectValidationError::SelfParent(self.id));
        }
        let mut seen = HashSet::new();
        for section in &self.sections {
            if !seen.insert(section.id) {
                return Err(ObjectValidationError::DuplicateSection(section.id));
            }
        }
        Ok(())
    }
}

/// Object-local validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectValidationError {
    NilId,
    BlankName,
    RenderedMismatch { rendered: bool },
    SelfParent(ObjectId),
    DuplicateSection(SectionId),
}

impl Display for ObjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "object id must not be nil"),
            Self::BlankName => write!(f, "object name must not be blank"),
            Self::RenderedMismatch { rendered: true } => {
                write!(f, "rendered object must carry a timeslot id")
            }
            Self::RenderedMismatch { rendered: false } => {
                write!(f, "unrendered object must not carry a timeslot id")
            }
            Self::SelfParent(id) => write!(f, "object cannot be its own parent: {id}"),
            Self::DuplicateSection(id) => write!(f, "duplicate section id: {id}"),
        }
    }
}

impl Error for ObjectValidationError {}

/// Derived view of an object flagged as thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub id: ObjectId,
    pub name: String,
    pub color: Option<String>,
    pub show_on_timeline: bool,
    pub show_connecting_lines: bool,
}

impl Thread {
    /// Projects a thread view from an object. Returns `None` for non-threads.
    pub fn from_object(object: &StoryObject) -> Option<Self> {
        if !object.is_thread {
            return None;
        }
        Some(Self {
            id: object.id,
            name: object.name.clone(),
            color: object.thread_color.clone(),
            show_on_timeline: object.show_on_timeline,
            show_connecting_lines: object.show_connecting_lines,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectValidationError, Section, StoryObject, Thread};
    use uuid::Uuid;

    #[test]
    fn new_object_is_valid_and_unrendered() {
        let object = StoryObject::new("Mara");
        assert!(!object.rendered);
        assert!(object.timeslot_id.is_none());
        object.validate().expect("fresh object should validate");
    }

    #[test]
    fn validate_rejects_rendered_without_timeslot() {
        let mut object = StoryObject::new("Mara");
        object.rendered = true;
        assert_eq!(
            object.validate().unwrap_err(),
            ObjectValidationError::RenderedMismatch { rendered: true }
        );

        object.rendered = false;
        object.timeslot_id = Some(Uuid::new_v4());
        assert_eq!(
            object.validate().unwrap_err(),
            ObjectValidationError::RenderedMismatch { rendered: false }
        );
    }

    #[test]
    fn validate_rejects_blank_name_and_duplicate_sections() {
        let object = StoryObject::new("   ");
        assert_eq!(object.validate().unwrap_err(), ObjectValidationError::BlankName);

        let mut object = StoryObject::new("Ledger");
        let section = Section::new("Intro", "");
        object.sections = vec![section.clone(), section.clone()];
        assert_eq!(
            object.validate().unwrap_err(),
            ObjectValidationError::DuplicateSection(section.id)
        );
    }

    #[test]
    fn thread_view_only_for_thread_objects() {
        let plain = StoryObject::new("Mara");
        assert!(Thread::from_object(&plain).is_none());

        let thread = StoryObject::new_thread("Revenge arc", "#aa0000");
        let view = Thread::from_object(&thread).expect("thread view");
        assert_eq!(view.name, "Revenge arc");
        assert_eq!(view.color.as_deref(), Some("#aa0000"));
        assert!(view.show_on_timeline);
    }

    #[test]
    fn deserialize_fills_display_defaults() {
        let value = serde_json::json!({
            "id": "11111111-2222-4333-8444-555555555555",
            "name": "Harbor"
        });
        let object: StoryObject = serde_json::from_value(value).unwrap();
        assert!(object.show_on_timeline);
        assert!(object.show_connecting_lines);
        assert!(object.attributes.is_empty());
    }
}
