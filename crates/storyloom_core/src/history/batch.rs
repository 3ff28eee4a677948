//! Multi-step command recorded as one history entry.

use crate::history::{BoxedCommand, Command};
use log::warn;
use std::fmt::Display;

/// Ordered list of commands that execute and undo as one unit.
///
/// Steps execute in registration order and undo in reverse. When a step
/// fails, the steps already applied are rolled back before the error is
/// returned, so the target is left as it was.
pub struct Batch<T, E> {
    description: String,
    steps: Vec<BoxedCommand<T, E>>,
}

impl<T, E: Display> Batch<T, E> {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            steps: Vec::new(),
        }
    }

    /// Appends one step, builder style.
    pub fn with_step(mut self, step: BoxedCommand<T, E>) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends one step.
    pub fn push(&mut self, step: BoxedCommand<T, E>) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<T, E: Display> Command<T> for Batch<T, E> {
    type Error = E;

    fn description(&self) -> &str {
        &self.description
    }

    fn execute(&mut self, target: &mut T) -> Result<(), E> {
        for applied in 0..self.steps.len() {
            if let Err(err) = self.steps[applied].execute(target) {
                for step in self.steps[..applied].iter_mut().rev() {
                    if let Err(rollback) = step.undo(target) {
                        warn!(
                            "event=batch_rollback module=history status=error batch=\"{}\" step=\"{}\" error=\"{}\"",
                            self.description,
                            step.description(),
                            rollback
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn undo(&mut self, target: &mut T) -> Result<(), E> {
        let len = self.steps.len();
        for undone in 0..len {
            let position = len - 1 - undone;
            if let Err(err) = self.steps[position].undo(target) {
                for step in self.steps[position + 1..].iter_mut() {
                    if let Err(rollback) = step.execute(target) {
                        warn!(
                            "event=batch_rollback module=history status=error batch=\"{}\" step=\"{}\" error=\"{}\"",
                            self.description,
                            step.description(),
                            rollback
                        );
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}
