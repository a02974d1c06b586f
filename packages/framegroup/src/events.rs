//! Published event names and payload types.
//!
//! All events the tracker publishes to the bus are defined here so the names
//! stay consistent with what the higher layer subscribes to.
//!
//! ## Event shapes
//!
//! - `begin-bounds-changing` / `end-bounds-changing` - bracket a user drag,
//!   payload is the identity plus a bounds snapshot.
//! - `synth-bounds-change` - the window-local semantic change event, payload
//!   is [`BoundsChangePayload`] with a `type` field distinguishing
//!   transitional (`bounds-changing`) from terminal (`bounds-changed`)
//!   events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{Bounds, ChangeReason, ChangeType};

// ============================================================================
// Event Names
// ============================================================================

/// Published when a user drag begins, before the window has moved.
pub const BEGIN_BOUNDS_CHANGING: &str = "begin-bounds-changing";

/// Published when a user drag ends, before the terminal dispatch.
pub const END_BOUNDS_CHANGING: &str = "end-bounds-changing";

/// The window-local semantic bounds-change event.
pub const SYNTH_BOUNDS_CHANGE: &str = "synth-bounds-change";

// ============================================================================
// Payload Types
// ============================================================================

/// Whether a change event is transitional or terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsEventKind {
    /// Intermediate event while a transaction is still open.
    #[serde(rename = "bounds-changing")]
    Changing,
    /// Terminal event committing a transaction.
    #[serde(rename = "bounds-changed")]
    Changed,
}

/// Payload for `begin-bounds-changing` / `end-bounds-changing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionPayload {
    /// Window uuid.
    pub uuid: Uuid,
    /// Window name.
    pub name: String,
    /// Top coordinate of the snapshot.
    pub top: i32,
    /// Left coordinate of the snapshot.
    pub left: i32,
    /// Snapshot width.
    pub width: i32,
    /// Snapshot height.
    pub height: i32,
}

impl TransitionPayload {
    /// Builds a transition payload from identity and a bounds snapshot.
    #[must_use]
    pub fn new(uuid: Uuid, name: &str, bounds: &Bounds) -> Self {
        Self {
            uuid,
            name: name.to_string(),
            top: bounds.y,
            left: bounds.x,
            width: bounds.width,
            height: bounds.height,
        }
    }
}

/// Payload for `synth-bounds-change`.
///
/// The same shape is queued while a window is in a deferred state; queued
/// events carry `deferred: true` and are replayed as a
/// `bounds-changing` + `bounds-changed` pair on flush.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsChangePayload {
    /// What changed.
    pub change_type: ChangeType,
    /// Why it changed, relative to this window.
    pub reason: ChangeReason,
    /// Window name.
    pub name: String,
    /// Window uuid.
    pub uuid: Uuid,
    /// Transitional or terminal.
    #[serde(rename = "type")]
    pub kind: BoundsEventKind,
    /// Whether this event was produced while the window was deferred.
    pub deferred: bool,
    /// Top coordinate of the post-event bounds.
    pub top: i32,
    /// Left coordinate of the post-event bounds.
    pub left: i32,
    /// Post-event width.
    pub width: i32,
    /// Post-event height.
    pub height: i32,
}

impl BoundsChangePayload {
    /// Returns a copy relabeled with a different event kind.
    #[must_use]
    pub fn relabeled(&self, kind: BoundsEventKind) -> Self {
        Self { kind, ..self.clone() }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Sink for published events.
///
/// The embedding layer supplies the real pub/sub bus; the core only ever
/// publishes, it never subscribes through this trait.
pub trait EventBus {
    /// Publishes an event by name with a JSON payload.
    fn publish(&self, event: &str, payload: serde_json::Value);
}

// ============================================================================
// Tests
// ============================================================================
