//! Cursor/anchor navigator over timeslot indices.
//!
//! # Responsibility
//! - Track the author's current index and one saved anchor for
//!   jump-and-return navigation.
//!
//! # Invariants
//! - Every transition clamps into `0..len`; an empty timeline pins both
//!   values to `cursor = 0, anchor = None`.
//! - Once set, the anchor is never overwritten by further jumps; nested
//!   jumps return to the first place.
//! - Transitions return `false` instead of failing when nothing changes.

use serde::{Deserialize, Serialize};

/// Cursor position plus optional return anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorNavigator {
    cursor: usize,
    anchor: Option<usize>,
}

impl CursorNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn anchor(&self) -> Option<usize> {
        self.anchor
    }

    pub fn has_anchor(&self) -> bool {
        self.anchor.is_some()
    }

    /// Steps one timeslot forward.
    pub fn next(&mut self, len: usize) -> bool {
        self.move_to(self.cursor.saturating_add(1), len)
    }

    /// Steps one timeslot back.
    pub fn prev(&mut self, len: usize) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.move_to(self.cursor - 1, len)
    }

    pub fn first(&mut self, len: usize) -> bool {
        self.move_to(0, len)
    }

    pub fn last(&mut self, len: usize) -> bool {
        self.move_to(len.saturating_sub(1), len)
    }

    /// Moves to `index`, clamped to the last timeslot. Keeps the anchor.
    pub fn move_to(&mut self, index: usize, len: usize) -> bool {
        let target = clamp(index, len);
        if target == self.cursor {
            return false;
        }
        self.cursor = target;
        true
    }

    /// Jumps to `target`, remembering where the jump started.
    ///
    /// The anchor is captured only when none is set and the target differs
    /// from the current cursor.
    pub fn navigate_with_anchor(&mut self, target: usize, len: usize) -> bool {
        let target = clamp(target, len);
        if target == self.cursor {
            return false;
        }
        if self.anchor.is_none() {
            self.anchor = Some(self.cursor);
        }
        self.cursor = target;
        true
    }

    /// Jumps back to the anchor and clears it.
    pub fn return_to_anchor(&mut self, len: usize) -> bool {
        let Some(anchor) = self.anchor.take() else {
            return false;
        };
        self.cursor = clamp(anchor, len);
        true
    }

    /// Discards the anchor without moving.
    pub fn clear_anchor(&mut self) -> bool {
        self.anchor.take().is_some()
    }

    /// Re-clamps after the timeline shrank or grew.
    pub fn clamp_to(&mut self, len: usize) -> bool {
        let before = *self;
        self.cursor = clamp(self.cursor, len);
        if len == 0 {
            self.anchor = None;
        } else if let Some(anchor) = self.anchor {
            self.anchor = Some(clamp(anchor, len));
        }
        before != *self
    }

    /// Resets to the start with no anchor.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn clamp(index: usize, len: usize) -> usize {
    index.min(len.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::CursorNavigator;

    #[test]
    fn next_and_prev_clamp_at_bounds() {
        let mut nav = CursorNavigator::new();
        assert!(!nav.prev(3));
        assert!(nav.next(3));
        assert!(nav.next(3));
        assert!(!nav.next(3));
        assert_eq!(nav.cursor(), 2);
        assert!(nav.first(3));
        assert!(nav.last(3));
        assert_eq!(nav.cursor(), 2);
    }

    #[test]
    fn empty_timeline_never_moves() {
        let mut nav = CursorNavigator::new();
        assert!(!nav.next(0));
        assert!(!nav.move_to(5, 0));
        assert!(!nav.navigate_with_anchor(3, 0));
        assert_eq!(nav.anchor(), None);
    }

    #[test]
    fn anchor_round_trip_keeps_first_anchor() {
        let mut nav = CursorNavigator::new();
        nav.move_to(1, 10);

        assert!(nav.navigate_with_anchor(7, 10));
        assert_eq!(nav.anchor(), Some(1));
        assert!(nav.navigate_with_anchor(4, 10));
        assert_eq!(nav.anchor(), Some(1));
        assert_eq!(nav.cursor(), 4);

        assert!(nav.return_to_anchor(10));
        assert_eq!(nav.cursor(), 1);
        assert_eq!(nav.anchor(), None);
        assert!(!nav.return_to_anchor(10));
    }

    #[test]
    fn jump_to_current_index_does_not_anchor() {
        let mut nav = CursorNavigator::new();
        nav.move_to(2, 5);
        assert!(!nav.navigate_with_anchor(2, 5));
        assert!(!nav.has_anchor());
    }

    #[test]
    fn clear_anchor_keeps_cursor() {
        let mut nav = CursorNavigator::new();
        nav.navigate_with_anchor(3, 5);
        assert!(nav.clear_anchor());
        assert_eq!(nav.cursor(), 3);
        assert!(!nav.clear_anchor());
    }

    #[test]
    fn clamp_to_shrinks_cursor_and_anchor() {
        let mut nav = CursorNavigator::new();
        nav.move_to(4, 6);
        nav.navigate_with_anchor(5, 6);
        assert!(nav.clamp_to(3));
        assert_eq!(nav.cursor(), 2);
        assert_eq!(nav.anchor(), Some(2));
        assert!(nav.clamp_to(0));
        assert_eq!(nav.cursor(), 0);
        assert_eq!(nav.anchor(), None);
    }
}
