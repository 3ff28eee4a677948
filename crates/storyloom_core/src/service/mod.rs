//! Session-level services.
//!
//! # Responsibility
//! - Orchestrate registries, queries, navigation and history into one
//!   editing session API.
//! - Keep host/UI layers decoupled from command plumbing.

pub mod engine;
