//! Bounds change detection and classification.
//!
//! The detector is the stateful half of change tracking: it accumulates
//! sticky "size changed" / "position changed" flags across the intermediate
//! events of a transaction and classifies each event as a position change, a
//! size change, or both. The state itself ([`TransactionState`]) is a plain
//! value owned by each tracker and threaded through the pure [`evaluate`]
//! function, so classification stays testable without a tracker.
//!
//! # Flow
//!
//! 1. Compare the current snapshot against the cached one.
//! 2. OR the diffs into the sticky flags.
//! 3. Gate: dispatch only if something changed and the window is not
//!    minimized, unless `force` bypasses the gate (transaction end).
//! 4. Classify. Terminal events fold the sticky flags into the
//!    classification and then reset them.

use crate::geometry::{self, BoundsDiff, BoundsSnapshot, ChangeType, WindowState};

// ============================================================================
// Transaction State
// ============================================================================

/// Sticky accumulators for the currently open transaction.
///
/// Once set within a transaction the flags stay set until the terminal event
/// resets them; intermediate events never reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionState {
    /// A size change was observed since the last terminal event.
    pub size_changed: bool,
    /// A position change was observed since the last terminal event.
    pub position_changed: bool,
}

// ============================================================================
// Detection
// ============================================================================

/// Outcome of a dispatched detection pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    /// The classified change.
    pub change_type: ChangeType,
    /// The raw comparison that produced it.
    pub diff: BoundsDiff,
}

/// Runs one detection pass.
///
/// Returns `Some` when the event should dispatch, `None` when the gate
/// suppressed it. `intermediate` is `true` for "changing" events and `false`
/// for terminal "changed" events; `force` bypasses the changed-gate so a
/// transaction end always commits.
///
/// Sticky flags are updated on every pass, but reset only when a terminal
/// pass actually dispatches - a gated-out terminal event leaves them intact
/// for the follow-up forced pass.
pub fn evaluate(
    current: &BoundsSnapshot,
    cached: &BoundsSnapshot,
    state: &mut TransactionState,
    intermediate: bool,
    force: bool,
) -> Option<Detection> {
    let diff = geometry::compare(current, cached, state.size_changed);

    state.size_changed |= diff.width || diff.height;
    state.position_changed |= diff.x || diff.y;

    // A transition into minimized never dispatches by itself, no matter how
    // far the raw coordinates moved.
    let gate_open = diff.changed && current.state != WindowState::Minimized;
    if !(gate_open || force) {
        return None;
    }

    let size = diff.width || diff.height || (!intermediate && state.size_changed);
    let position = diff.x || diff.y || (!intermediate && state.position_changed);

    let change_type = if size && position {
        ChangeType::PositionAndSize
    } else if size {
        ChangeType::Size
    } else {
        // Default: a forced terminal pass with no detected diff still
        // reports a position change.
        ChangeType::Position
    };

    if !intermediate {
        state.size_changed = false;
        state.position_changed = false;
    }

    Some(Detection { change_type, diff })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    fn snap(x: i32, y: i32, width: i32, height: i32) -> BoundsSnapshot {
        BoundsSnapshot::new(Bounds::new(x, y, width, height), true, WindowState::Normal)
    }

    #[test]
    fn test_no_diff_no_dispatch() {
        let mut state = TransactionState::default();
        let a = snap(0, 0, 100, 100);
        assert!(evaluate(&a, &a, &mut state, false, false).is_none());
        assert_eq!(state, TransactionState::default());
    }

    #[test]
    fn test_pure_move_classifies_position() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let current = snap(10, 0, 100, 100);
        let det = evaluate(&current, &cached, &mut state, false, false).unwrap();
        assert_eq!(det.change_type, ChangeType::Position);
    }

    #[test]
    fn test_pure_resize_classifies_size() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let current = snap(0, 0, 150, 100);
        let det = evaluate(&current, &cached, &mut state, false, false).unwrap();
        assert_eq!(det.change_type, ChangeType::Size);
    }

    #[test]
    fn test_edge_anchored_resize_is_size_not_position_and_size() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let current = snap(50, 0, 50, 100);
        let det = evaluate(&current, &cached, &mut state, false, false).unwrap();
        assert_eq!(det.change_type, ChangeType::Size);
    }

    #[test]
    fn test_sticky_flags_merge_across_intermediates() {
        let mut state = TransactionState::default();

        // First intermediate: a move.
        let cached = snap(0, 0, 100, 100);
        let moved = snap(10, 0, 100, 100);
        let det = evaluate(&moved, &cached, &mut state, true, false).unwrap();
        assert_eq!(det.change_type, ChangeType::Position);
        assert!(state.position_changed);

        // Second intermediate: a resize against the updated cache.
        let resized = snap(10, 0, 120, 100);
        let det = evaluate(&resized, &moved, &mut state, true, false).unwrap();
        // Intermediate events classify only their own diff.
        assert_eq!(det.change_type, ChangeType::Size);
        assert!(state.size_changed && state.position_changed);

        // Terminal: no further diff, forced; sticky flags fold in.
        let det = evaluate(&resized, &resized, &mut state, false, true).unwrap();
        assert_eq!(det.change_type, ChangeType::PositionAndSize);
        assert_eq!(state, TransactionState::default());
    }

    #[test]
    fn test_terminal_resets_sticky_flags_exactly_once() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let current = snap(5, 5, 100, 100);

        assert!(evaluate(&current, &cached, &mut state, false, false).is_some());
        assert_eq!(state, TransactionState::default());

        // Identical geometry afterwards: no dispatch, flags stay reset.
        assert!(evaluate(&current, &current, &mut state, false, false).is_none());
        assert_eq!(state, TransactionState::default());
    }

    #[test]
    fn test_intermediate_never_resets_flags() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let current = snap(5, 5, 100, 100);
        assert!(evaluate(&current, &cached, &mut state, true, false).is_some());
        assert!(state.position_changed);
    }

    #[test]
    fn test_minimized_gate_blocks_dispatch() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let mut current = snap(500, 500, 50, 50);
        current.state = WindowState::Minimized;
        assert!(evaluate(&current, &cached, &mut state, false, false).is_none());
        // Diffs were still accumulated for the eventual restore.
        assert!(state.size_changed);
        assert!(state.position_changed);
    }

    #[test]
    fn test_minimized_gate_bypassed_by_force() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let mut current = snap(500, 500, 50, 50);
        current.state = WindowState::Minimized;
        let det = evaluate(&current, &cached, &mut state, false, true).unwrap();
        assert_eq!(det.change_type, ChangeType::PositionAndSize);
    }

    #[test]
    fn test_forced_terminal_with_no_diff_defaults_to_position() {
        let mut state = TransactionState::default();
        let a = snap(0, 0, 100, 100);
        let det = evaluate(&a, &a, &mut state, false, true).unwrap();
        assert_eq!(det.change_type, ChangeType::Position);
        assert!(!det.diff.changed);
    }

    #[test]
    fn test_gated_terminal_keeps_flags_for_forced_followup() {
        let mut state = TransactionState::default();
        let cached = snap(0, 0, 100, 100);
        let mut current = snap(10, 10, 100, 100);
        current.state = WindowState::Minimized;

        // Gate blocks: flags survive.
        assert!(evaluate(&current, &cached, &mut state, false, false).is_none());
        assert!(state.position_changed);

        // Forced follow-up commits the accumulated change.
        let det = evaluate(&current, &current, &mut state, false, true).unwrap();
        assert_eq!(det.change_type, ChangeType::Position);
        assert_eq!(state, TransactionState::default());
    }
}
