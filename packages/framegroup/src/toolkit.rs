//! Collaborator traits for the native toolkit and its satellites.
//!
//! The core never talks to a real windowing system directly; everything it
//! needs from the outside world is expressed as a trait here and injected at
//! construction time. Production code wires these to the native toolkit,
//! tests wire them to in-memory mocks.
//!
//! All methods take `&self`: the run model is single-threaded and
//! cooperative, and implementations that need mutation use interior
//! mutability.

use uuid::Uuid;

use crate::error::Result;
use crate::geometry::{Bounds, WindowState};

// ============================================================================
// Window Handle
// ============================================================================

/// Handle to a native window.
pub trait WindowHandle {
    /// Reads the window's current rectangle.
    ///
    /// # Errors
    ///
    /// Returns an error if the native window is gone or the toolkit call
    /// fails.
    fn bounds(&self) -> Result<Bounds>;

    /// Whether the window is currently minimized.
    fn is_minimized(&self) -> bool;

    /// Whether the window is currently maximized.
    fn is_maximized(&self) -> bool;

    /// Whether the window is currently fullscreen.
    fn is_fullscreen(&self) -> bool;

    /// Whether the window has a native frame.
    fn has_frame(&self) -> bool;

    /// Applies a rectangle to the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the toolkit rejects the geometry.
    fn set_bounds(&self, bounds: Bounds) -> Result<()>;

    /// Restores a maximized window.
    ///
    /// # Errors
    ///
    /// Returns an error if the native call fails.
    fn unmaximize(&self) -> Result<()>;

    /// Raises the window in the stacking order without activating it.
    fn bring_to_front(&self);

    /// The visible work area of the screen the window occupies, used to clip
    /// propagated follower geometry.
    fn visible_work_area(&self) -> Bounds;

    /// Normalizes bounds after a restore from minimized, returning the last
    /// known visible geometry.
    ///
    /// # Errors
    ///
    /// Returns an error if the native call fails.
    fn normalize_restored_bounds(&self) -> Result<Bounds>;

    /// Derives the coarse window state from the native flags.
    fn window_state(&self) -> WindowState {
        if self.is_minimized() {
            WindowState::Minimized
        } else if self.is_maximized() {
            WindowState::Maximized
        } else {
            WindowState::Normal
        }
    }
}

// ============================================================================
// Animation Subsystem
// ============================================================================

/// Read-only view into the animation subsystem.
pub trait AnimationDriver {
    /// Whether the window with the given uuid is currently being animated.
    fn has_window(&self, uuid: Uuid) -> bool;
}

// ============================================================================
// Deferred-Move Ledger
// ============================================================================

/// Sink for raw per-window move records produced by batched transactions.
pub trait DeferredMoveLedger {
    /// Records a window's final position from a committed transaction.
    fn handle_move(&self, uuid: Uuid, bounds: Bounds);
}

// ============================================================================
// Batched Move Transactions
// ============================================================================

/// Placement flags for one window inside a batched transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveFlags {
    /// Whether the new size is applied along with the position.
    pub include_size: bool,
    /// Keep the window's z-order untouched.
    pub suppress_z_order: bool,
    /// Do not activate the window.
    pub suppress_activation: bool,
}

impl MoveFlags {
    /// Flags for group propagation: stacking and activation are never
    /// disturbed, size is included only for size-bearing changes.
    #[must_use]
    pub const fn propagation(include_size: bool) -> Self {
        Self {
            include_size,
            suppress_z_order: true,
            suppress_activation: true,
        }
    }
}

/// A window's final position as reported by a committed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCompletion {
    /// The moved window.
    pub uuid: Uuid,
    /// Where the window ended up.
    pub bounds: Bounds,
}

/// An open multi-window move transaction.
///
/// Queued placements are applied atomically on commit.
pub trait MoveTransaction {
    /// Queues a placement for one window.
    ///
    /// # Errors
    ///
    /// Returns an error if the facility rejects the placement.
    fn set_window_pos(&mut self, uuid: Uuid, bounds: Bounds, flags: MoveFlags) -> Result<()>;

    /// Commits all queued placements, returning each window's final position.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit fails; no placement is applied in that
    /// case.
    fn commit(self: Box<Self>) -> Result<Vec<MoveCompletion>>;
}

/// Factory for batched move transactions, available on platforms whose
/// window server supports atomic multi-window placement.
pub trait TransactionFactory {
    /// Opens a new transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the window server connection is unavailable.
    fn begin(&self) -> Result<Box<dyn MoveTransaction>>;
}
