//! Domain model for timeline-bound story objects.
//!
//! # Responsibility
//! - Define canonical data structures shared by registries, queries and
//!   commands.
//! - Keep identity (`Uuid` aliases) separate from timeline rank.
//!
//! # Invariants
//! - Every record is identified by a stable id that is never reused.
//! - "Before/after" is only ever derived from the timeslot order, never
//!   stored on a record.

pub mod milestone;
pub mod object;
pub mod placement;
pub mod timeslot;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns current wall-clock time as Unix epoch milliseconds.
///
/// Falls back to `0` if the system clock reports a pre-epoch time.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
