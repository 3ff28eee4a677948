//! Core timeline logic for Storyloom.
//! This crate is the single source of truth for timeline, placement and
//! history invariants.

pub mod command;
pub mod config;
pub mod history;
pub mod logging;
pub mod model;
pub mod navigation;
pub mod operation;
pub mod project;
pub mod query;
pub mod registry;
pub mod service;

pub use command::{EditError, EditResult, ProjectBatch, ProjectCommand, ProjectHistory};
pub use config::{ConfigError, EngineConfig, LoggingConfig};
pub use history::{Batch, BoxedCommand, Command, HistoryManager, DEFAULT_HISTORY_CAPACITY};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::milestone::{Milestone, MilestoneId};
pub use model::object::{
    AttributeMap, ObjectId, ObjectValidationError, Section, SectionId, StoryObject, Thread,
};
pub use model::placement::{
    MutationPayload, Placement, PlacementId, PlacementKind, PlacementValidationError, ValueChange,
};
pub use model::timeslot::{Timeslot, TimeslotId};
pub use navigation::cursor::CursorNavigator;
pub use operation::keymap::{Keymap, KeymapError, Shortcut};
pub use operation::registry::{
    Operation, OperationArgs, OperationContext, OperationError, OperationRegistry,
};
pub use project::{Project, ProjectSnapshot, SnapshotError};
pub use query::temporal::{AttributeStep, ObjectState, TemporalQuery};
pub use query::threads::{counts_for_section, ThreadQuery};
pub use registry::milestone_registry::{MilestoneError, MilestonePatch, MilestoneRegistry};
pub use registry::object_registry::{ObjectError, ObjectPatch, ObjectRegistry};
pub use registry::placement_log::{PlacementError, PlacementLog, PlacementPatch};
pub use registry::timeslot_registry::{
    InsertPosition, TimeslotError, TimeslotReferences, TimeslotRegistry,
};
pub use service::engine::{ChangeKind, Engine, EngineError, EngineResult};

/// Liveness probe for hosts embedding the engine.
pub fn ping() -> &'static str {
    "pong"
}

/// Version string of this crate, as built.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
