//! Deferred event queue with flush-time coalescing.
//!
//! While a window is hidden, minimized, or maximized, semantic change events
//! are appended here instead of being published. On restore the queue is
//! flushed: only terminal events survive, contiguous runs sharing a reason
//! collapse into one event with their change types merged, and each survivor
//! is replayed as a `bounds-changing` + `bounds-changed` pair so downstream
//! consumers still see the transitional-then-terminal contract.

use smallvec::SmallVec;

use crate::constants::DEFERRED_QUEUE_INLINE_CAP;
use crate::events::{BoundsChangePayload, BoundsEventKind};

/// Per-window buffer of deferred change events.
///
/// Append-only until flushed, then cleared atomically.
#[derive(Debug, Default)]
pub struct DeferredEventQueue {
    events: SmallVec<[BoundsChangePayload; DEFERRED_QUEUE_INLINE_CAP]>,
}

impl DeferredEventQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Appends an event.
    pub fn push(&mut self, event: BoundsChangePayload) { self.events.push(event); }

    /// Number of queued events.
    #[must_use]
    pub fn len(&self) -> usize { self.events.len() }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    /// Flushes the queue, returning the coalesced survivors in order.
    ///
    /// Only terminal (`bounds-changed`) events survive. Maximal contiguous
    /// runs sharing a reason collapse to the run's last event carrying the
    /// merged change type. The queue is empty afterwards.
    pub fn flush(&mut self) -> Vec<BoundsChangePayload> {
        let events = std::mem::take(&mut self.events);
        let mut flushed: Vec<BoundsChangePayload> = Vec::new();

        for event in events {
            if event.kind != BoundsEventKind::Changed {
                continue;
            }
            match flushed.last_mut() {
                Some(last) if last.reason == event.reason => {
                    // Same run: keep the newest geometry, merge the types.
                    let merged = last.change_type.merge(event.change_type);
                    *last = event;
                    last.change_type = merged;
                }
                _ => flushed.push(event),
            }
        }

        if !flushed.is_empty() {
            tracing::debug!(count = flushed.len(), "deferred queue flushed");
        }
        flushed
    }
}

// ============================================================================
// Tests
// ============================================================================
