//! Timeline position state.

pub mod cursor;
