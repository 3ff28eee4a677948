//! Operation surface for host UIs.
//!
//! # Responsibility
//! - Name every user-facing action and guard it with a precondition.
//! - Bind actions to keyboard shortcuts with persisted overrides.
//!
//! # See also
//! - `service::engine` for the methods operations invoke.

pub mod keymap;
pub mod registry;
