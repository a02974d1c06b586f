//! Geometry types and the bounds delta engine.
//!
//! This module defines the value types exchanged with the native toolkit
//! (bounds, window state, snapshots) and the pure functions that compare two
//! bounds snapshots. Comparison is where move-vs-resize disambiguation lives:
//! a resize anchored at an opposite edge shifts the anchored edge's coordinate
//! by exactly the size delta, and must not be reported as a move.

use serde::{Deserialize, Serialize};

// ============================================================================
// Bounds
// ============================================================================

/// A window rectangle in global pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    /// X coordinate of the left edge.
    pub x: i32,
    /// Y coordinate of the top edge.
    pub y: i32,
    /// Width of the rectangle.
    pub width: i32,
    /// Height of the rectangle.
    pub height: i32,
}

impl Bounds {
    /// Creates a new bounds rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the x coordinate of the right edge.
    #[must_use]
    pub const fn right(&self) -> i32 { self.x.saturating_add(self.width) }

    /// Returns the y coordinate of the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 { self.y.saturating_add(self.height) }

    /// Clips this rectangle so it fits inside `area`, preserving size where
    /// possible by shifting the origin.
    #[must_use]
    pub fn clipped_to(&self, area: &Self) -> Self {
        let width = self.width.min(area.width);
        let height = self.height.min(area.height);
        let x = self.x.clamp(area.x, area.right().saturating_sub(width));
        let y = self.y.clamp(area.y, area.bottom().saturating_sub(height));
        Self { x, y, width, height }
    }
}

/// Offsets a coordinate by a delta using 64-bit arithmetic.
///
/// Coordinates arriving from native callbacks can be garbage; the offset is
/// computed in `i64` and clamped back into the `i32` range. If the result is
/// not representable the pre-offset value is returned unchanged, so toolkit
/// corruption never spreads to sibling windows.
#[must_use]
pub fn offset_clamped(value: i32, delta: i32) -> i32 {
    let shifted = i64::from(value) + i64::from(delta);
    i32::try_from(shifted).unwrap_or(value)
}

// ============================================================================
// Window State
// ============================================================================

/// Coarse native window state carried in every snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WindowState {
    /// Regular restored window.
    #[default]
    Normal,
    /// Window fills its screen's work area.
    Maximized,
    /// Window is minimized to the task bar / dock.
    Minimized,
}

/// An immutable observation of a window's geometry and state.
///
/// Snapshots are replaced wholesale on each observation; each tracker owns
/// the snapshot for its window exclusively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsSnapshot {
    /// The observed rectangle.
    #[serde(flatten)]
    pub bounds: Bounds,
    /// Whether the window has a native frame.
    pub frame: bool,
    /// Coarse window state at observation time.
    pub state: WindowState,
}

impl BoundsSnapshot {
    /// Creates a snapshot from raw parts.
    #[must_use]
    pub const fn new(bounds: Bounds, frame: bool, state: WindowState) -> Self {
        Self { bounds, frame, state }
    }
}

// ============================================================================
// Change Classification
// ============================================================================

/// What kind of bounds change a dispatch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChangeType {
    /// Only the origin moved.
    Position,
    /// Only the size changed.
    Size,
    /// Both origin and size changed.
    PositionAndSize,
}

impl ChangeType {
    /// Whether this change includes a position component.
    #[must_use]
    pub const fn includes_position(self) -> bool {
        matches!(self, Self::Position | Self::PositionAndSize)
    }

    /// Whether this change includes a size component.
    #[must_use]
    pub const fn includes_size(self) -> bool {
        matches!(self, Self::Size | Self::PositionAndSize)
    }

    /// Merges two change types observed within one coalesced run.
    ///
    /// Any mix of position and size information upgrades to
    /// [`ChangeType::PositionAndSize`].
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Position, Self::Position) => Self::Position,
            (Self::Size, Self::Size) => Self::Size,
            _ => Self::PositionAndSize,
        }
    }
}

/// Why a change event was produced, relative to the receiving window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeReason {
    /// The window itself moved or resized.
    #[serde(rename = "self")]
    SelfChange,
    /// Another member of the window's group drove the change.
    #[serde(rename = "group")]
    Group,
    /// The animation subsystem drove this window.
    #[serde(rename = "animation")]
    Animation,
    /// The animation subsystem drove the group leader.
    #[serde(rename = "group-animation")]
    GroupAnimation,
}

// ============================================================================
// Compare
// ============================================================================

/// Result of comparing a current snapshot against the cached one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundsDiff {
    /// The left edge moved (after anchor disambiguation).
    pub x: bool,
    /// The top edge moved (after anchor disambiguation).
    pub y: bool,
    /// The width changed.
    pub width: bool,
    /// The height changed.
    pub height: bool,
    /// The window state changed.
    pub state: bool,
    /// Any geometry component changed. State transitions alone do not count.
    pub changed: bool,
}

/// Compares two snapshots and reports which components differ.
///
/// `size_change_pending` is the sticky size flag of the active transaction:
/// once any size change has been observed, a position difference on an axis
/// is discounted when it exactly equals the negated size difference on that
/// axis. That is the signature of a resize anchored at the opposite edge, not
/// a real move.
#[must_use]
pub fn compare(
    current: &BoundsSnapshot,
    cached: &BoundsSnapshot,
    size_change_pending: bool,
) -> BoundsDiff {
    let cur = &current.bounds;
    let old = &cached.bounds;

    let width = cur.width != old.width;
    let height = cur.height != old.height;
    let size_observed = width || height || size_change_pending;

    let x = cur.x != old.x && !(size_observed && anchored_shift(cur.x, old.x, cur.width, old.width));
    let y = cur.y != old.y
        && !(size_observed && anchored_shift(cur.y, old.y, cur.height, old.height));

    let state = current.state != cached.state;
    let changed = x || y || width || height;

    BoundsDiff { x, y, width, height, state, changed }
}

/// True when a coordinate shift is exactly the negated size delta on the same
/// axis, i.e. the edge is anchored to the opposite edge of a resize.
fn anchored_shift(cur_pos: i32, old_pos: i32, cur_size: i32, old_size: i32) -> bool {
    i64::from(cur_pos) - i64::from(old_pos) == i64::from(old_size) - i64::from(cur_size)
}

// ============================================================================
// Delta
// ============================================================================

/// Signed offsets between a current and a cached rectangle.
///
/// `x2`/`y2` are the offsets of the opposite (right/bottom) edges. Used only
/// transiently while propagating a leader's movement to its group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delta {
    /// Left edge offset.
    pub x: i32,
    /// Right edge offset.
    pub x2: i32,
    /// Top edge offset.
    pub y: i32,
    /// Bottom edge offset.
    pub y2: i32,
    /// Width offset.
    pub width: i32,
    /// Height offset.
    pub height: i32,
}

impl Delta {
    /// Whether every component is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.x == 0 && self.x2 == 0 && self.y == 0 && self.y2 == 0 && self.width == 0
            && self.height == 0
    }
}

/// Computes the signed offsets between two rectangles. Pure subtraction, no
/// disambiguation.
#[must_use]
pub fn delta(current: &Bounds, cached: &Bounds) -> Delta {
    Delta {
        x: current.x.wrapping_sub(cached.x),
        x2: current.right().wrapping_sub(cached.right()),
        y: current.y.wrapping_sub(cached.y),
        y2: current.bottom().wrapping_sub(cached.bottom()),
        width: current.width.wrapping_sub(cached.width),
        height: current.height.wrapping_sub(cached.height),
    }
}

// ============================================================================
// Tests
// ============================================================================
