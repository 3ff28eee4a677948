//! Command history: reversible edits with bounded undo/redo stacks.
//!
//! # Responsibility
//! - Define the `Command` contract for reversible edits.
//! - Record executed commands and replay them backward/forward.
//! - Compose multi-step edits into one history entry (`Batch`).
//!
//! # Invariants
//! - A command whose `execute` fails is never recorded.
//! - Executing a new command clears the redo stack.
//! - Stacks never exceed the configured capacity; the oldest entry drops.
//! - Commands receive only the edit target, never the history itself, so a
//!   command cannot record nested history entries.

mod batch;

pub use batch::Batch;

use log::{debug, warn};
use std::collections::VecDeque;

/// Default number of entries kept on each stack.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Reversible unit of change against a target `T`.
pub trait Command<T> {
    type Error;

    /// Short author-facing label ("Insert timeslot").
    fn description(&self) -> &str;

    /// Applies the change. Also used for redo, so it must be repeatable
    /// after `undo` and reproduce the same identities.
    fn execute(&mut self, target: &mut T) -> Result<(), Self::Error>;

    /// Restores the exact pre-`execute` state.
    fn undo(&mut self, target: &mut T) -> Result<(), Self::Error>;
}

/// Boxed command trait object stored on the stacks.
pub type BoxedCommand<T, E> = Box<dyn Command<T, Error = E>>;

/// Bounded undo/redo stacks over target `T`.
pub struct HistoryManager<T, E> {
    undo_stack: VecDeque<BoxedCommand<T, E>>,
    redo_stack: VecDeque<BoxedCommand<T, E>>,
    capacity: usize,
}

impl<T, E: std::fmt::Display> HistoryManager<T, E> {
    /// Creates empty stacks. A zero capacity is raised to one.
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Executes `command` and records it on success.
    pub fn execute(&mut self, mut command: BoxedCommand<T, E>, target: &mut T) -> Result<(), E> {
        command.execute(target)?;
        debug!(
            "event=history_record module=history status=ok command=\"{}\"",
            command.description()
        );
        push_bounded(&mut self.undo_stack, command, self.capacity);
        self.redo_stack.clear();
        Ok(())
    }

    /// Undoes the latest entry. `Ok(false)` when there is nothing to undo.
    ///
    /// A failed undo leaves the entry on the undo stack.
    pub fn undo(&mut self, target: &mut T) -> Result<bool, E> {
        let Some(mut command) = self.undo_stack.pop_back() else {
            return Ok(false);
        };
        if let Err(err) = command.undo(target) {
            warn!(
                "event=history_undo module=history status=error command=\"{}\" error=\"{}\"",
                command.description(),
                err
            );
            self.undo_stack.push_back(command);
            return Err(err);
        }
        push_bounded(&mut self.redo_stack, command, self.capacity);
        Ok(true)
    }

    /// Redoes the latest undone entry. `Ok(false)` when there is nothing to redo.
    ///
    /// A failed redo leaves the entry on the redo stack.
    pub fn redo(&mut self, target: &mut T) -> Result<bool, E> {
        let Some(mut command) = self.redo_stack.pop_back() else {
            return Ok(false);
        };
        if let Err(err) = command.execute(target) {
            warn!(
                "event=history_redo module=history status=error command=\"{}\" error=\"{}\"",
                command.description(),
                err
            );
            self.redo_stack.push_back(command);
            return Err(err);
        }
        push_bounded(&mut self.undo_stack, command, self.capacity);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Label of the entry `undo` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|command| command.description())
    }

    /// Label of the entry `redo` would reapply.
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|command| command.description())
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops both stacks.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

fn push_bounded<C>(stack: &mut VecDeque<C>, item: C, capacity: usize) {
    stack.push_back(item);
    while stack.len() > capacity {
        stack.pop_front();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{Command, HistoryManager};

    /// Pushes one value onto a vector; undo pops it.
    pub(crate) struct PushValue(pub i32);

    impl Command<Vec<i32>> for PushValue {
        type Error = String;

        fn description(&self) -> &str {
            "push value"
        }

        fn execute(&mut self, target: &mut Vec<i32>) -> Result<(), String> {
            if self.0 < 0 {
                return Err(format!("negative value {}", self.0));
            }
            target.push(self.0);
            Ok(())
        }

        fn undo(&mut self, target: &mut Vec<i32>) -> Result<(), String> {
            target.pop();
            Ok(())
        }
    }

    #[test]
    fn undo_and_redo_are_inverse() {
        let mut history: HistoryManager<Vec<i32>, String> = HistoryManager::new(10);
        let mut target = vec![];

        history.execute(Box::new(PushValue(1)), &mut target).unwrap();
        history.execute(Box::new(PushValue(2)), &mut target).unwrap();
        assert_eq!(target, vec![1, 2]);

        assert!(history.undo(&mut target).unwrap());
        assert_eq!(target, vec![1]);
        assert!(history.redo(&mut target).unwrap());
        assert_eq!(target, vec![1, 2]);
    }

    #[test]
    fn empty_stacks_are_no_ops() {
        let mut history: HistoryManager<Vec<i32>, String> = HistoryManager::new(10);
        let mut target = vec![];
        assert!(!history.undo(&mut target).unwrap());
        assert!(!history.redo(&mut target).unwrap());
        assert!(history.undo_description().is_none());
    }

    #[test]
    fn new_edit_clears_redo_branch() {
        let mut history: HistoryManager<Vec<i32>, String> = HistoryManager::new(10);
        let mut target = vec![];
        history.execute(Box::new(PushValue(1)), &mut target).unwrap();
        history.undo(&mut target).unwrap();
        assert!(history.can_redo());

        history.execute(Box::new(PushValue(3)), &mut target).unwrap();
        assert!(!history.can_redo());
        assert_eq!(target, vec![3]);
    }

    #[test]
    fn failed_command_is_not_recorded() {
        let mut history: HistoryManager<Vec<i32>, String> = HistoryManager::new(10);
        let mut target = vec![];
        let err = history
            .execute(Box::new(PushValue(-1)), &mut target)
            .unwrap_err();
        assert!(err.contains("negative"));
        assert!(!history.can_undo());
    }

    #[test]
    fn capacity_drops_oldest_entry() {
        let mut history: HistoryManager<Vec<i32>, String> = HistoryManager::new(2);
        let mut target = vec![];
        for value in 1..=3 {
            history.execute(Box::new(PushValue(value)), &mut target).unwrap();
        }
        assert_eq!(history.undo_len(), 2);
        assert!(history.undo(&mut target).unwrap());
        assert!(history.undo(&mut target).unwrap());
        assert!(!history.undo(&mut target).unwrap());
        assert_eq!(target, vec![1]);
    }
}
