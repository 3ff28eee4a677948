//! Pure read-side queries over project registries.
//!
//! Nothing in this module mutates state; every query borrows the registries
//! and recomputes on demand.

pub mod temporal;
pub mod threads;
