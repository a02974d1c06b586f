//! Tuning constants for bounds tracking and group propagation.

/// Pixel tolerance when deciding whether a follower edge is attached to a
/// leader edge during a grouped resize.
pub const SHARED_EDGE_TOLERANCE: i32 = 5;

/// Inline capacity of the per-window deferred event queue.
///
/// A window rarely accumulates more than a handful of events while hidden or
/// minimized; the queue spills to the heap past this.
pub const DEFERRED_QUEUE_INLINE_CAP: usize = 8;
