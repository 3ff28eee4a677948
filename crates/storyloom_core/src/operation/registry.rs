//! Operation registry: named, precondition-guarded engine actions.
//!
//! # Responsibility
//! - Register operations with ids, labels, default shortcuts and
//!   preconditions.
//! - Execute operations against an engine, swallowing and logging failures.
//! - Resolve key chords through defaults plus keymap overrides.
//!
//! # Invariants
//! - Operation ids are unique, trimmed and non-empty.
//! - `execute` never propagates an error: a failed or refused operation
//!   returns `false` and leaves the engine as it was.
//! - At most one operation answers a given chord in `operation_for`.

use crate::config::EngineConfig;
use crate::model::object::ObjectId;
use crate::model::placement::PlacementId;
use crate::operation::keymap::{Keymap, KeymapError, Shortcut};
use crate::service::engine::{Engine, EngineError};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Engine state an operation precondition may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationContext {
    pub cursor: usize,
    pub timeline_len: usize,
    pub has_anchor: bool,
    pub selection: Option<PlacementId>,
    /// Whether the selected placement is a mutation.
    pub selection_is_mutation: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_clipboard: bool,
}

impl OperationContext {
    pub fn from_engine(engine: &Engine) -> Self {
        let selection = engine.selection();
        let selection_is_mutation = selection
            .and_then(|id| engine.project().placements().get(id))
            .is_some_and(|placement| placement.is_mutation());
        Self {
            cursor: engine.cursor(),
            timeline_len: engine.project().timeslots().len(),
            has_anchor: engine.anchor().is_some(),
            selection,
            selection_is_mutation,
            can_undo: engine.can_undo(),
            can_redo: engine.can_redo(),
            has_clipboard: engine.has_clipboard(),
        }
    }
}

/// Optional arguments passed through to an operation handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationArgs {
    pub target_index: Option<usize>,
    pub placement_id: Option<PlacementId>,
    pub thread_id: Option<ObjectId>,
}

/// Precondition over engine state.
pub type Precondition = fn(&OperationContext) -> bool;

/// Handler body. `Ok(false)` means "nothing changed".
pub type Handler = fn(&mut Engine, &OperationArgs) -> Result<bool, OperationError>;

/// One registered operation.
#[derive(Debug, Clone)]
pub struct Operation {
    pub id: String,
    pub label: String,
    pub default_shortcut: Option<Shortcut>,
    /// Whether a successful run records a history entry.
    pub undoable: bool,
    pub precondition: Precondition,
    pub handler: Handler,
}

impl Operation {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        precondition: Precondition,
        handler: Handler,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            default_shortcut: None,
            undoable: false,
            precondition,
            handler,
        }
    }

    pub fn with_shortcut(mut self, shortcut: Shortcut) -> Self {
        self.default_shortcut = Some(shortcut);
        self
    }

    pub fn undoable(mut self) -> Self {
        self.undoable = true;
        self
    }
}

/// Registration, dispatch and binding errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    InvalidOperationId(String),
    DuplicateOperationId(String),
    OperationNotFound(String),
    /// The handler needs an argument the caller did not pass.
    MissingArgument {
        operation_id: String,
        argument: &'static str,
    },
    /// The chord is already bound to another operation.
    ShortcutConflict {
        shortcut: Shortcut,
        operation_id: String,
    },
    Keymap(KeymapError),
    Engine(EngineError),
}

impl Display for OperationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOperationId(value) => write!(f, "operation id is invalid: `{value}`"),
            Self::DuplicateOperationId(value) => {
                write!(f, "operation id already registered: {value}")
            }
            Self::OperationNotFound(value) => write!(f, "operation not found: {value}"),
            Self::MissingArgument {
                operation_id,
                argument,
            } => write!(f, "operation {operation_id} needs argument `{argument}`"),
            Self::ShortcutConflict {
                shortcut,
                operation_id,
            } => write!(f, "shortcut {shortcut} is already bound to {operation_id}"),
            Self::Keymap(err) => write!(f, "{err}"),
            Self::Engine(err) => write!(f, "{err}"),
        }
    }
}

impl Error for OperationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Keymap(err) => Some(err),
            Self::Engine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KeymapError> for OperationError {
    fn from(value: KeymapError) -> Self {
        Self::Keymap(value)
    }
}

impl From<EngineError> for OperationError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Registered operations plus shortcut overrides.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: BTreeMap<String, Operation>,
    keymap: Keymap,
}

impl OperationRegistry {
    /// Empty registry without built-in operations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in operation.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for operation in builtin_operations() {
            // Built-in ids are unique literals.
            let _ = registry.register(operation);
        }
        registry
    }

    /// Built-in operations plus overrides from `config.keymap_path`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, OperationError> {
        let mut registry = Self::with_defaults();
        if let Some(path) = &config.keymap_path {
            registry.keymap = Keymap::load_file(path)?;
        }
        Ok(registry)
    }

    /// Registers one operation.
    ///
    /// # Errors
    /// - `InvalidOperationId` for blank ids or ids with whitespace inside.
    /// - `DuplicateOperationId` when the id is taken.
    pub fn register(&mut self, mut operation: Operation) -> Result<(), OperationError> {
        operation.id = operation.id.trim().to_string();
        if !is_valid_operation_id(&operation.id) {
            return Err(OperationError::InvalidOperationId(operation.id));
        }
        if self.operations.contains_key(operation.id.as_str()) {
            return Err(OperationError::DuplicateOperationId(operation.id));
        }
        self.operations.insert(operation.id.clone(), operation);
        Ok(())
    }

    pub fn get(&self, operation_id: &str) -> Option<&Operation> {
        self.operations.get(operation_id.trim())
    }

    /// Registered ids, sorted.
    pub fn operation_ids(&self) -> Vec<&str> {
        self.operations.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Whether the operation exists and its precondition holds now.
    pub fn can_execute(&self, engine: &Engine, operation_id: &str) -> bool {
        let Some(operation) = self.get(operation_id) else {
            return false;
        };
        (operation.precondition)(&OperationContext::from_engine(engine))
    }

    /// Runs one operation. `false` when refused, failed or a no-op.
    pub fn execute(&self, engine: &mut Engine, operation_id: &str, args: &OperationArgs) -> bool {
        let Some(operation) = self.get(operation_id) else {
            warn!(
                "event=operation_execute module=operations status=error reason=not_found id={}",
                operation_id.trim()
            );
            return false;
        };
        if !(operation.precondition)(&OperationContext::from_engine(engine)) {
            debug!(
                "event=operation_execute module=operations status=skipped reason=precondition id={}",
                operation.id
            );
            return false;
        }
        match (operation.handler)(engine, args) {
            Ok(changed) => {
                debug!(
                    "event=operation_execute module=operations status=ok id={} changed={}",
                    operation.id, changed
                );
                changed
            }
            Err(err) => {
                warn!(
                    "event=operation_execute module=operations status=error id={} error=\"{}\"",
                    operation.id, err
                );
                false
            }
        }
    }

    /// Runs the operation bound to a chord, if any.
    pub fn execute_shortcut(&self, engine: &mut Engine, shortcut: &Shortcut) -> bool {
        match self.operation_for(shortcut) {
            Some(operation_id) => self.execute(engine, operation_id, &OperationArgs::default()),
            None => false,
        }
    }

    /// Shortcut in effect for one operation.
    pub fn shortcut_for(&self, operation_id: &str) -> Option<&Shortcut> {
        let operation = self.get(operation_id)?;
        self.keymap
            .effective(&operation.id, operation.default_shortcut.as_ref())
    }

    /// Operation answering a chord.
    pub fn operation_for(&self, shortcut: &Shortcut) -> Option<&str> {
        self.operations
            .keys()
            .find(|id| self.shortcut_for(id) == Some(shortcut))
            .map(String::as_str)
    }

    /// Id of another operation already bound to `shortcut`.
    pub fn find_conflict(&self, shortcut: &Shortcut, except_operation_id: &str) -> Option<&str> {
        let except = except_operation_id.trim();
        self.operations
            .keys()
            .filter(|id| id.as_str() != except)
            .find(|id| self.shortcut_for(id) == Some(shortcut))
            .map(String::as_str)
    }

    /// Rebinds (`Some`) or unbinds (`None`) one operation.
    ///
    /// # Errors
    /// - `OperationNotFound` for unknown ids.
    /// - `ShortcutConflict` when another operation holds the chord.
    pub fn set_shortcut(
        &mut self,
        operation_id: &str,
        shortcut: Option<Shortcut>,
    ) -> Result<(), OperationError> {
        let id = operation_id.trim();
        if !self.operations.contains_key(id) {
            return Err(OperationError::OperationNotFound(id.to_string()));
        }
        if let Some(shortcut) = &shortcut {
            if let Some(holder) = self.find_conflict(shortcut, id) {
                return Err(OperationError::ShortcutConflict {
                    shortcut: shortcut.clone(),
                    operation_id: holder.to_string(),
                });
            }
        }
        self.keymap.set_override(id, shortcut);
        Ok(())
    }

    /// Restores one operation's default shortcut.
    pub fn reset_shortcut(&mut self, operation_id: &str) -> bool {
        self.keymap.reset(operation_id.trim())
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    /// Replaces all overrides (e.g. after loading a file).
    pub fn set_keymap(&mut self, keymap: Keymap) {
        self.keymap = keymap;
    }
}

fn is_valid_operation_id(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

fn chord(text: &str) -> Option<Shortcut> {
    Shortcut::parse(text).ok()
}

fn builtin(
    id: &str,
    label: &str,
    shortcut: Option<&str>,
    precondition: Precondition,
    handler: Handler,
) -> Operation {
    Operation {
        id: id.to_string(),
        label: label.to_string(),
        default_shortcut: shortcut.and_then(chord),
        undoable: false,
        precondition,
        handler,
    }
}

fn require_target(args: &OperationArgs, operation_id: &str) -> Result<usize, OperationError> {
    args.target_index.ok_or(OperationError::MissingArgument {
        operation_id: operation_id.to_string(),
        argument: "target_index",
    })
}

fn require_thread(args: &OperationArgs, operation_id: &str) -> Result<ObjectId, OperationError> {
    args.thread_id.ok_or(OperationError::MissingArgument {
        operation_id: operation_id.to_string(),
        argument: "thread_id",
    })
}

fn tag_target(engine: &Engine, args: &OperationArgs) -> Option<PlacementId> {
    args.placement_id.or(engine.selection())
}

/// Built-in operations in registration order.
pub fn builtin_operations() -> Vec<Operation> {
    vec![
        builtin(
            "navigation.next",
            "Next timeslot",
            Some("Right"),
            |ctx| ctx.cursor + 1 < ctx.timeline_len,
            |engine, _| Ok(engine.next()),
        ),
        builtin(
            "navigation.prev",
            "Previous timeslot",
            Some("Left"),
            |ctx| ctx.cursor > 0,
            |engine, _| Ok(engine.prev()),
        ),
        builtin(
            "navigation.first",
            "First timeslot",
            Some("Home"),
            |ctx| ctx.timeline_len > 0 && ctx.cursor > 0,
            |engine, _| Ok(engine.first()),
        ),
        builtin(
            "navigation.last",
            "Last timeslot",
            Some("End"),
            |ctx| ctx.cursor + 1 < ctx.timeline_len,
            |engine, _| Ok(engine.last()),
        ),
        builtin(
            "navigation.jump",
            "Jump to timeslot",
            None,
            |ctx| ctx.timeline_len > 0,
            |engine, args| {
                let target = require_target(args, "navigation.jump")?;
                Ok(engine.navigate_with_anchor(target))
            },
        ),
        builtin(
            "anchor.return",
            "Return to anchor",
            Some("Alt+Left"),
            |ctx| ctx.has_anchor,
            |engine, _| Ok(engine.return_to_anchor()),
        ),
        builtin(
            "anchor.clear",
            "Clear anchor",
            Some("Shift+Escape"),
            |ctx| ctx.has_anchor,
            |engine, _| Ok(engine.clear_anchor()),
        ),
        builtin(
            "timeslot.insert_after",
            "Insert timeslot after cursor",
            Some("Ctrl+Enter"),
            |_| true,
            |engine, _| {
                engine.insert_timeslot_after_cursor()?;
                Ok(true)
            },
        )
        .undoable(),
        builtin(
            "timeslot.append",
            "Append timeslot",
            Some("Ctrl+Shift+Enter"),
            |_| true,
            |engine, _| {
                engine.append_timeslot()?;
                Ok(true)
            },
        )
        .undoable(),
        builtin(
            "timeslot.remove_current",
            "Remove current timeslot",
            Some("Ctrl+Delete"),
            |ctx| ctx.timeline_len > 0,
            |engine, _| {
                engine.remove_current_timeslot()?;
                Ok(true)
            },
        )
        .undoable(),
        builtin(
            "history.undo",
            "Undo",
            Some("Ctrl+Z"),
            |ctx| ctx.can_undo,
            |engine, _| Ok(engine.undo()),
        ),
        builtin(
            "history.redo",
            "Redo",
            Some("Ctrl+Shift+Z"),
            |ctx| ctx.can_redo,
            |engine, _| Ok(engine.redo()),
        ),
        builtin(
            "clipboard.copy",
            "Copy change",
            Some("Ctrl+C"),
            |ctx| ctx.selection_is_mutation,
            |engine, _| {
                engine.copy_selection()?;
                Ok(true)
            },
        ),
        builtin(
            "clipboard.paste",
            "Paste change",
            Some("Ctrl+V"),
            |ctx| ctx.has_clipboard && ctx.selection.is_some() && ctx.timeline_len > 0,
            |engine, _| {
                engine.paste_at_cursor()?;
                Ok(true)
            },
        )
        .undoable(),
        builtin(
            "thread.tag",
            "Add to thread",
            Some("Ctrl+T"),
            |ctx| ctx.selection.is_some(),
            |engine, args| {
                let thread_id = require_thread(args, "thread.tag")?;
                let placement_id =
                    tag_target(engine, args).ok_or(EngineError::NoSelection)?;
                engine.add_thread_tag(placement_id, thread_id)?;
                Ok(true)
            },
        )
        .undoable(),
        builtin(
            "thread.untag",
            "Remove from thread",
            Some("Ctrl+Shift+T"),
            |ctx| ctx.selection.is_some(),
            |engine, args| {
                let thread_id = require_thread(args, "thread.untag")?;
                let placement_id =
                    tag_target(engine, args).ok_or(EngineError::NoSelection)?;
                engine.remove_thread_tag(placement_id, thread_id)?;
                Ok(true)
            },
        )
        .undoable(),
    ]
}
