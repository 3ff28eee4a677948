//! Engine instance: one open project with its navigator and history.
//!
//! # Responsibility
//! - Own the project, cursor navigator, command history, selection and
//!   mutation clipboard of one editing session.
//! - Route every edit through the command history.
//! - Accumulate change notifications for observers.
//!
//! # Invariants
//! - After any edit, undo, redo or load the cursor and anchor are clamped to
//!   the current timeline length.
//! - `load` is atomic: on error the previous state is untouched.
//! - `load` and `clear` reset history, navigator and selection.
//! - Precondition failures on navigation and history return `false`.

use crate::command::milestone_commands::{CreateMilestone, RemoveMilestone, UpdateMilestone};
use crate::command::object_commands::{CreateObject, RemoveObject, SetObjectParent, UpdateObject};
use crate::command::placement_commands::{
    AddMutation, PlaceObject, RemovePlacement, UpdatePlacement,
};
use crate::command::thread_commands::{AddThreadTag, PromoteCard, RemoveThreadTag, SetSubthreads};
use crate::command::timeslot_commands::{CreateTimeslot, MoveTimeslot, RemoveTimeslot};
use crate::command::{EditError, ProjectBatch, ProjectCommand, ProjectHistory};
use crate::config::{ConfigError, EngineConfig};
use crate::model::milestone::{Milestone, MilestoneId};
use crate::model::object::{ObjectId, SectionId, StoryObject};
use crate::model::placement::{MutationPayload, Placement, PlacementId};
use crate::model::timeslot::TimeslotId;
use crate::navigation::cursor::CursorNavigator;
use crate::project::{Project, ProjectSnapshot, SnapshotError};
use crate::query::temporal::ObjectState;
use crate::registry::milestone_registry::MilestonePatch;
use crate::registry::object_registry::ObjectPatch;
use crate::registry::placement_log::PlacementPatch;
use crate::registry::timeslot_registry::InsertPosition;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by engine APIs.
pub type EngineResult<T> = Result<T, EngineError>;

/// Area of state touched since the last `take_changes()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Timeslots,
    Objects,
    Placements,
    Milestones,
    Cursor,
    Selection,
    Clipboard,
    History,
}

/// Engine-level failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Config(ConfigError),
    Edit(EditError),
    Snapshot(SnapshotError),
    /// The timeline has no timeslot under the cursor.
    EmptyTimeline,
    /// The operation needs a selected placement.
    NoSelection,
    /// The selected placement is not a mutation.
    SelectionNotMutation(PlacementId),
    /// Paste requested with an empty clipboard.
    EmptyClipboard,
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Edit(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
            Self::EmptyTimeline => write!(f, "timeline has no timeslots"),
            Self::NoSelection => write!(f, "no placement selected"),
            Self::SelectionNotMutation(id) => {
                write!(f, "selected placement is not a change: {id}")
            }
            Self::EmptyClipboard => write!(f, "clipboard is empty"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Edit(err) => Some(err),
            Self::Snapshot(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<EditError> for EngineError {
    fn from(value: EditError) -> Self {
        Self::Edit(value)
    }
}

impl From<SnapshotError> for EngineError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}

#[derive(Clone, Copy)]
struct Revisions {
    timeslots: u64,
    objects: u64,
    placements: u64,
    milestones: u64,
}

impl Revisions {
    fn of(project: &Project) -> Self {
        Self {
            timeslots: project.timeslots().revision(),
            objects: project.objects().revision(),
            placements: project.placements().revision(),
            milestones: project.milestones().revision(),
        }
    }
}

/// One editing session over a project.
pub struct Engine {
    project: Project,
    navigator: CursorNavigator,
    history: ProjectHistory,
    config: EngineConfig,
    changes: BTreeSet<ChangeKind>,
    selection: Option<PlacementId>,
    clipboard: Option<MutationPayload>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::with_valid_config(EngineConfig::default())
    }
}

impl Engine {
    /// Creates an engine over an empty project.
    ///
    /// # Errors
    /// - `Config` when `config.validate()` fails.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: EngineConfig) -> Self {
        Self {
            project: Project::new(),
            navigator: CursorNavigator::new(),
            history: ProjectHistory::new(config.history_capacity),
            config,
            changes: BTreeSet::new(),
            selection: None,
            clipboard: None,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn navigator(&self) -> &CursorNavigator {
        &self.navigator
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Executes one command through history.
    ///
    /// A failed command leaves the project and the stacks unchanged.
    pub fn apply(&mut self, command: ProjectCommand) -> EngineResult<()> {
        let description = command.description().to_string();
        let before = Revisions::of(&self.project);
        if let Err(err) = self.history.execute(command, &mut self.project) {
            warn!(
                "event=edit_apply module=engine status=error command=\"{}\" error=\"{}\"",
                description, err
            );
            return Err(err.into());
        }
        debug!(
            "event=edit_apply module=engine status=ok command=\"{}\"",
            description
        );
        self.after_history_step(before);
        Ok(())
    }

    /// Executes several commands as one history entry.
    pub fn apply_batch(
        &mut self,
        description: impl Into<String>,
        steps: Vec<ProjectCommand>,
    ) -> EngineResult<()> {
        let mut batch = ProjectBatch::new(description);
        for step in steps {
            batch.push(step);
        }
        self.apply(Box::new(batch))
    }

    /// Undoes the latest edit. `false` when nothing was undone.
    pub fn undo(&mut self) -> bool {
        let before = Revisions::of(&self.project);
        match self.history.undo(&mut self.project) {
            Ok(true) => {
                self.after_history_step(before);
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!(
                    "event=edit_undo module=engine status=error error=\"{}\"",
                    err
                );
                false
            }
        }
    }

    /// Redoes the latest undone edit. `false` when nothing was redone.
    pub fn redo(&mut self) -> bool {
        let before = Revisions::of(&self.project);
        match self.history.redo(&mut self.project) {
            Ok(true) => {
                self.after_history_step(before);
                true
            }
            Ok(false) => false,
            Err(err) => {
                warn!(
                    "event=edit_redo module=engine status=error error=\"{}\"",
                    err
                );
                false
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_description(&self) -> Option<&str> {
        self.history.undo_description()
    }

    pub fn redo_description(&self) -> Option<&str> {
        self.history.redo_description()
    }

    fn after_history_step(&mut self, before: Revisions) {
        let after = Revisions::of(&self.project);
        if after.timeslots != before.timeslots {
            self.changes.insert(ChangeKind::Timeslots);
        }
        if after.objects != before.objects {
            self.changes.insert(ChangeKind::Objects);
        }
        if after.placements != before.placements {
            self.changes.insert(ChangeKind::Placements);
        }
        if after.milestones != before.milestones {
            self.changes.insert(ChangeKind::Milestones);
        }
        self.changes.insert(ChangeKind::History);

        if let Some(selected) = self.selection {
            if self.project.placements().get(selected).is_none() {
                self.selection = None;
                self.changes.insert(ChangeKind::Selection);
            }
        }
        let len = self.project.timeslots().len();
        if self.navigator.clamp_to(len) {
            self.changes.insert(ChangeKind::Cursor);
        }
    }

    /// Inserts a timeslot. Returns its id.
    pub fn insert_timeslot(&mut self, position: InsertPosition) -> EngineResult<TimeslotId> {
        let command = CreateTimeslot::new(position);
        let id = command.timeslot_id();
        self.apply(Box::new(command))?;
        Ok(id)
    }

    pub fn append_timeslot(&mut self) -> EngineResult<TimeslotId> {
        self.insert_timeslot(InsertPosition::End)
    }

    /// Inserts right after the cursor (at the start of an empty timeline).
    pub fn insert_timeslot_after_cursor(&mut self) -> EngineResult<TimeslotId> {
        if self.project.timeslots().is_empty() {
            return self.append_timeslot();
        }
        self.insert_timeslot(InsertPosition::After(self.navigator.cursor()))
    }

    pub fn move_timeslot(&mut self, timeslot_id: TimeslotId, to: usize) -> EngineResult<()> {
        self.apply(Box::new(MoveTimeslot::new(timeslot_id, to)))
    }

    /// Removes an empty timeslot, re-anchoring its milestones.
    pub fn remove_timeslot(&mut self, timeslot_id: TimeslotId) -> EngineResult<()> {
        self.apply(Box::new(RemoveTimeslot::new(timeslot_id)))
    }

    /// Removes the timeslot under the cursor when it is empty.
    pub fn remove_current_timeslot(&mut self) -> EngineResult<()> {
        let id = self.current_timeslot().ok_or(EngineError::EmptyTimeline)?;
        self.remove_timeslot(id)
    }

    /// Timeslot under the cursor.
    pub fn current_timeslot(&self) -> Option<TimeslotId> {
        self.project.timeslots().id_at(self.navigator.cursor())
    }

    pub fn create_object(&mut self, object: StoryObject) -> EngineResult<ObjectId> {
        let id = object.id;
        self.apply(Box::new(CreateObject::new(object)))?;
        Ok(id)
    }

    pub fn update_object(&mut self, object_id: ObjectId, patch: ObjectPatch) -> EngineResult<()> {
        self.apply(Box::new(UpdateObject::new(object_id, patch)))
    }

    pub fn set_object_parent(
        &mut self,
        object_id: ObjectId,
        parent_id: Option<ObjectId>,
    ) -> EngineResult<()> {
        self.apply(Box::new(SetObjectParent::new(object_id, parent_id)))
    }

    pub fn remove_object(&mut self, object_id: ObjectId) -> EngineResult<()> {
        self.apply(Box::new(RemoveObject::new(object_id)))
    }

    /// Puts the object's card at a timeslot. Returns the card id.
    pub fn place_object(
        &mut self,
        object_id: ObjectId,
        timeslot_id: TimeslotId,
    ) -> EngineResult<PlacementId> {
        let command = PlaceObject::new(object_id, timeslot_id);
        let id = command.card_id();
        self.apply(Box::new(command))?;
        Ok(id)
    }

    /// Records a change of the object at a timeslot. Returns the placement id.
    pub fn add_mutation(
        &mut self,
        object_id: ObjectId,
        timeslot_id: TimeslotId,
        payload: MutationPayload,
    ) -> EngineResult<PlacementId> {
        self.add_placement(Placement::mutation(object_id, timeslot_id, payload))
    }

    /// Records a prepared mutation placement (attachment, tags preset).
    pub fn add_placement(&mut self, placement: Placement) -> EngineResult<PlacementId> {
        let command = AddMutation::from_placement(placement);
        let id = command.placement_id();
        self.apply(Box::new(command))?;
        Ok(id)
    }

    pub fn update_placement(
        &mut self,
        placement_id: PlacementId,
        patch: PlacementPatch,
    ) -> EngineResult<()> {
        self.apply(Box::new(UpdatePlacement::new(placement_id, patch)))
    }

    /// Moves a placement to another timeslot.
    pub fn move_placement(
        &mut self,
        placement_id: PlacementId,
        timeslot_id: TimeslotId,
    ) -> EngineResult<()> {
        let patch = PlacementPatch {
            timeslot_id: Some(timeslot_id),
            ..PlacementPatch::default()
        };
        self.apply(Box::new(UpdatePlacement::labeled(
            placement_id,
            patch,
            "Move placement",
        )))
    }

    pub fn remove_placement(&mut self, placement_id: PlacementId) -> EngineResult<()> {
        self.apply(Box::new(RemovePlacement::new(placement_id)))
    }

    pub fn add_thread_tag(
        &mut self,
        placement_id: PlacementId,
        thread_id: ObjectId,
    ) -> EngineResult<()> {
        self.apply(Box::new(AddThreadTag::new(placement_id, thread_id)))
    }

    pub fn remove_thread_tag(
        &mut self,
        placement_id: PlacementId,
        thread_id: ObjectId,
    ) -> EngineResult<()> {
        self.apply(Box::new(RemoveThreadTag::new(placement_id, thread_id)))
    }

    pub fn set_subthreads(
        &mut self,
        placement_id: PlacementId,
        section_ids: Vec<SectionId>,
    ) -> EngineResult<()> {
        self.apply(Box::new(SetSubthreads::new(placement_id, section_ids)))
    }

    pub fn promote_card(&mut self, card_id: PlacementId, thread_id: ObjectId) -> EngineResult<()> {
        self.apply(Box::new(PromoteCard::new(card_id, thread_id)))
    }

    pub fn create_milestone(&mut self, milestone: Milestone) -> EngineResult<MilestoneId> {
        let command = CreateMilestone::new(milestone);
        let id = command.milestone_id();
        self.apply(Box::new(command))?;
        Ok(id)
    }

    pub fn update_milestone(
        &mut self,
        milestone_id: MilestoneId,
        patch: MilestonePatch,
    ) -> EngineResult<()> {
        self.apply(Box::new(UpdateMilestone::new(milestone_id, patch)))
    }

    pub fn remove_milestone(&mut self, milestone_id: MilestoneId) -> EngineResult<()> {
        self.apply(Box::new(RemoveMilestone::new(milestone_id)))
    }

    pub fn cursor(&self) -> usize {
        self.navigator.cursor()
    }

    pub fn anchor(&self) -> Option<usize> {
        self.navigator.anchor()
    }

    pub fn next(&mut self) -> bool {
        let len = self.project.timeslots().len();
        let moved = self.navigator.next(len);
        self.note_cursor(moved)
    }

    pub fn prev(&mut self) -> bool {
        let len = self.project.timeslots().len();
        let moved = self.navigator.prev(len);
        self.note_cursor(moved)
    }

    pub fn first(&mut self) -> bool {
        let len = self.project.timeslots().len();
        let moved = self.navigator.first(len);
        self.note_cursor(moved)
    }

    pub fn last(&mut self) -> bool {
        let len = self.project.timeslots().len();
        let moved = self.navigator.last(len);
        self.note_cursor(moved)
    }

    pub fn move_to(&mut self, index: usize) -> bool {
        let len = self.project.timeslots().len();
        let moved = self.navigator.move_to(index, len);
        self.note_cursor(moved)
    }

    /// Jumps to `target`, saving the current position as anchor if none is set.
    pub fn navigate_with_anchor(&mut self, target: usize) -> bool {
        let len = self.project.timeslots().len();
        let moved = self.navigator.navigate_with_anchor(target, len);
        self.note_cursor(moved)
    }

    pub fn return_to_anchor(&mut self) -> bool {
        let len = self.project.timeslots().len();
        let moved = self.navigator.return_to_anchor(len);
        self.note_cursor(moved)
    }

    pub fn clear_anchor(&mut self) -> bool {
        let cleared = self.navigator.clear_anchor();
        self.note_cursor(cleared)
    }

    /// Jumps (with anchor) to the next timeslot where the object changes.
    pub fn jump_to_next_change(&mut self, object_id: ObjectId) -> bool {
        let cursor = self.navigator.cursor();
        match self.project.temporal().next_change_index(object_id, cursor) {
            Some(target) => self.navigate_with_anchor(target),
            None => false,
        }
    }

    /// Jumps (with anchor) to the previous timeslot where the object changes.
    pub fn jump_to_previous_change(&mut self, object_id: ObjectId) -> bool {
        let cursor = self.navigator.cursor();
        match self
            .project
            .temporal()
            .previous_change_index(object_id, cursor)
        {
            Some(target) => self.navigate_with_anchor(target),
            None => false,
        }
    }

    /// State of one object at the cursor. `None` on an empty timeline.
    pub fn state_at_cursor(&self, object_id: ObjectId) -> Option<ObjectState> {
        if self.project.timeslots().is_empty() {
            return None;
        }
        Some(
            self.project
                .temporal()
                .state_at(object_id, self.navigator.cursor()),
        )
    }

    fn note_cursor(&mut self, changed: bool) -> bool {
        if changed {
            self.changes.insert(ChangeKind::Cursor);
        }
        changed
    }

    pub fn selection(&self) -> Option<PlacementId> {
        self.selection
    }

    /// Selects a placement, or clears the selection with `None`.
    ///
    /// Returns `false` for unknown placements or when nothing changes.
    pub fn select(&mut self, placement_id: Option<PlacementId>) -> bool {
        if let Some(id) = placement_id {
            if self.project.placements().get(id).is_none() {
                return false;
            }
        }
        if self.selection == placement_id {
            return false;
        }
        self.selection = placement_id;
        self.changes.insert(ChangeKind::Selection);
        true
    }

    pub fn has_clipboard(&self) -> bool {
        self.clipboard.is_some()
    }

    /// Copies the selected mutation's payload.
    pub fn copy_selection(&mut self) -> EngineResult<()> {
        let id = self.selection.ok_or(EngineError::NoSelection)?;
        let payload = self
            .project
            .placements()
            .get(id)
            .and_then(|placement| placement.mutation.clone())
            .ok_or(EngineError::SelectionNotMutation(id))?;
        self.clipboard = Some(payload);
        self.changes.insert(ChangeKind::Clipboard);
        Ok(())
    }

    /// Pastes the clipboard as a new mutation of the selected placement's
    /// object at the cursor. Selects and returns the new placement.
    pub fn paste_at_cursor(&mut self) -> EngineResult<PlacementId> {
        let payload = self.clipboard.clone().ok_or(EngineError::EmptyClipboard)?;
        let source = self.selection.ok_or(EngineError::NoSelection)?;
        let object_id = self
            .project
            .placements()
            .get(source)
            .map(|placement| placement.object_id)
            .ok_or(EngineError::NoSelection)?;
        let timeslot_id = self.current_timeslot().ok_or(EngineError::EmptyTimeline)?;

        let command =
            AddMutation::new(object_id, timeslot_id, payload).with_description("Paste change");
        let id = command.placement_id();
        self.apply(Box::new(command))?;
        self.select(Some(id));
        Ok(id)
    }

    /// Replaces all state with a validated snapshot.
    ///
    /// # Errors
    /// - `Snapshot` when the snapshot is inconsistent; nothing changes then.
    pub fn load(&mut self, snapshot: ProjectSnapshot) -> EngineResult<()> {
        let project = match Project::from_snapshot(snapshot) {
            Ok(project) => project,
            Err(err) => {
                warn!(
                    "event=project_load module=engine status=error error=\"{}\"",
                    err
                );
                return Err(err.into());
            }
        };
        info!(
            "event=project_load module=engine status=ok timeslots={} objects={} placements={} milestones={}",
            project.timeslots().len(),
            project.objects().len(),
            project.placements().len(),
            project.milestones().len()
        );
        self.replace_project(project);
        Ok(())
    }

    /// Resets to an empty, timeslot-less project.
    pub fn clear(&mut self) {
        info!("event=project_clear module=engine status=ok");
        self.replace_project(Project::new());
    }

    /// Exports the current state.
    pub fn snapshot(&self) -> ProjectSnapshot {
        self.project.snapshot()
    }

    fn replace_project(&mut self, project: Project) {
        self.project = project;
        self.history.clear();
        self.navigator.reset();
        self.selection = None;
        self.clipboard = None;
        self.changes.extend([
            ChangeKind::Timeslots,
            ChangeKind::Objects,
            ChangeKind::Placements,
            ChangeKind::Milestones,
            ChangeKind::Cursor,
            ChangeKind::Selection,
            ChangeKind::Clipboard,
            ChangeKind::History,
        ]);
    }

    /// Drains the change kinds accumulated since the previous call.
    pub fn take_changes(&mut self) -> BTreeSet<ChangeKind> {
        std::mem::take(&mut self.changes)
    }

    /// Sum of registry revisions; changes with every project mutation.
    pub fn revision(&self) -> u64 {
        self.project.revision()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeKind, Engine, EngineError};
    use crate::command::EditError;
    use crate::config::{ConfigError, EngineConfig};
    use crate::model::object::StoryObject;
    use crate::model::placement::MutationPayload;
    use crate::registry::timeslot_registry::TimeslotError;
    use serde_json::json;

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig {
            history_capacity: 0,
            ..EngineConfig::default()
        };
        let err = Engine::new(config).err().expect("zero capacity must fail");
        assert_eq!(err, EngineError::Config(ConfigError::ZeroHistoryCapacity));
    }

    #[test]
    fn failed_edit_is_not_recorded() {
        let mut engine = Engine::default();
        let t1 = engine.append_timeslot().expect("append should succeed");
        let object = engine
            .create_object(StoryObject::new("Mara"))
            .expect("create should succeed");
        engine.place_object(object, t1).expect("place should succeed");
        engine.take_changes();

        let err = engine
            .remove_timeslot(t1)
            .expect_err("referenced timeslot must not be removed");
        assert_eq!(err, EngineError::Edit(EditError::Timeslot(TimeslotError::NotEmpty(t1))));
        assert_eq!(engine.undo_description(), Some("Place card"));
        assert!(engine.take_changes().is_empty());
    }

    #[test]
    fn undo_of_insert_clamps_cursor() {
        let mut engine = Engine::default();
        engine.append_timeslot().expect("append should succeed");
        engine.append_timeslot().expect("append should succeed");
        assert!(engine.last());
        assert_eq!(engine.cursor(), 1);

        assert!(engine.undo());
        assert_eq!(engine.cursor(), 0);
        let changes = engine.take_changes();
        assert!(changes.contains(&ChangeKind::Timeslots));
        assert!(changes.contains(&ChangeKind::Cursor));
    }

    #[test]
    fn copy_and_paste_selected_change() {
        let mut engine = Engine::default();
        let t1 = engine.append_timeslot().expect("append should succeed");
        engine.append_timeslot().expect("append should succeed");
        let object = engine
            .create_object(StoryObject::new("Mara"))
            .expect("create should succeed");
        let change = engine
            .add_mutation(
                object,
                t1,
                MutationPayload::new("wounded").with_change("health", json!(10), json!(3)),
            )
            .expect("mutation should be added");

        assert_eq!(engine.paste_at_cursor(), Err(EngineError::EmptyClipboard));
        assert!(engine.select(Some(change)));
        engine.copy_selection().expect("copy should succeed");
        assert!(engine.next());

        let pasted = engine.paste_at_cursor().expect("paste should succeed");
        assert_eq!(engine.selection(), Some(pasted));
        assert_eq!(engine.undo_description(), Some("Paste change"));
        let state = engine.state_at_cursor(object).expect("timeline is not empty");
        assert_eq!(state.attribute("health"), Some(&json!(3)));
        assert_eq!(state.applied_mutations.len(), 2);

        assert!(engine.undo());
        assert_eq!(engine.selection(), None);
    }

    #[test]
    fn failed_load_keeps_previous_state() {
        let mut engine = Engine::default();
        let t1 = engine.append_timeslot().expect("append should succeed");
        let mut broken = engine.snapshot();
        broken.timeslot_order.push(t1);

        assert!(matches!(
            engine.load(broken),
            Err(EngineError::Snapshot(_))
        ));
        assert_eq!(engine.project().timeslots().order(), &[t1]);
        assert!(engine.can_undo());
    }

    #[test]
    fn clear_resets_history_and_navigation() {
        let mut engine = Engine::default();
        engine.append_timeslot().expect("append should succeed");
        engine.append_timeslot().expect("append should succeed");
        engine.navigate_with_anchor(1);

        engine.clear();
        assert!(engine.project().timeslots().is_empty());
        assert!(!engine.can_undo());
        assert_eq!(engine.cursor(), 0);
        assert_eq!(engine.anchor(), None);
    }
}
