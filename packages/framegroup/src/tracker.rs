//! Per-window bounds change tracking.
//!
//! One [`BoundsChangeTracker`] exists per tracked window. It consumes the
//! stream of raw native notifications for that window, runs each through the
//! detector against the cached snapshot, resolves why the change happened
//! (the window itself, its group leader, the animation subsystem), and either
//! publishes the semantic event or queues it while the window is in a
//! deferred state.
//!
//! # Flow
//!
//! 1. A native notification arrives as a [`NativeEvent`].
//! 2. The tracker snapshots current geometry and runs a detection pass.
//! 3. A dispatched pass resolves its reason, publishes or defers the
//!    payload, and hands the change to the propagator if the window is
//!    grouped.
//! 4. The cached snapshot is replaced after every pass, dispatched or not.
//!
//! The whole pipeline runs single-threaded with run-to-completion handlers;
//! the tracker owns its cache and transaction state exclusively.

use std::sync::Arc;

use crate::deferred::DeferredEventQueue;
use crate::detector::{self, TransactionState};
use crate::error::{FrameGroupError, Result};
use crate::events::{
    BoundsChangePayload, BoundsEventKind, EventBus, TransitionPayload, BEGIN_BOUNDS_CHANGING,
    END_BOUNDS_CHANGING, SYNTH_BOUNDS_CHANGE,
};
use crate::geometry::{Bounds, BoundsSnapshot, ChangeReason, ChangeType};
use crate::group::{GroupStore, LeaderKind, WindowIdentity};
use crate::propagation::GroupedMovePropagator;
use crate::toolkit::{AnimationDriver, DeferredMoveLedger, WindowHandle};

// ============================================================================
// Native Events
// ============================================================================

/// Raw notifications from the native toolkit, normalized per window.
///
/// The set is closed: every notification the tracker reacts to is a variant
/// here, and dispatch matches exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEvent {
    /// A user grabbed the window frame; a drag transaction opens.
    BeginUserBoundsChange,
    /// Intermediate geometry while a transaction is open.
    BoundsChanging(Bounds),
    /// The toolkit reports the bounds settled.
    BoundsChanged,
    /// The user released the window frame; the drag transaction commits.
    EndUserBoundsChange,
    /// An animation on this window finished at the given geometry.
    AnimationEnd(Bounds),
    /// The window was minimized.
    Minimize,
    /// The window was maximized.
    Maximize,
    /// The window was restored from minimized.
    Restore,
    /// The window was restored from maximized.
    Unmaximize,
    /// The window was shown or hidden.
    VisibilityChanged {
        /// New visibility.
        visible: bool,
    },
    /// A raw move record for this window, forwarded to the deferred-move
    /// ledger.
    DeferredSetBounds(Bounds),
    /// This window's group committed a transaction led by another member.
    EndGroupTransaction,
}

// ============================================================================
// Tracker
// ============================================================================

/// Tracks bounds changes for a single window.
pub struct BoundsChangeTracker {
    identity: WindowIdentity,
    handle: Arc<dyn WindowHandle>,
    bus: Arc<dyn EventBus>,
    animation: Arc<dyn AnimationDriver>,
    store: Arc<GroupStore>,
    propagator: Arc<GroupedMovePropagator>,
    ledger: Arc<dyn DeferredMoveLedger>,

    cached: BoundsSnapshot,
    state: TransactionState,
    queue: DeferredEventQueue,
    visible: bool,
    user_drag_active: bool,
    detached: bool,
}

impl BoundsChangeTracker {
    /// Creates a tracker, seeding the cache from the window's live geometry.
    ///
    /// # Errors
    ///
    /// Returns an error when the initial bounds read fails.
    pub fn new(
        identity: WindowIdentity,
        handle: Arc<dyn WindowHandle>,
        bus: Arc<dyn EventBus>,
        animation: Arc<dyn AnimationDriver>,
        store: Arc<GroupStore>,
        propagator: Arc<GroupedMovePropagator>,
        ledger: Arc<dyn DeferredMoveLedger>,
    ) -> Result<Self> {
        let cached = Self::observe_handle(&handle)?;
        Ok(Self {
            identity,
            handle,
            bus,
            animation,
            store,
            propagator,
            ledger,
            cached,
            state: TransactionState::default(),
            queue: DeferredEventQueue::new(),
            visible: true,
            user_drag_active: false,
            detached: false,
        })
    }

    /// The tracked window's identity.
    #[must_use]
    pub const fn identity(&self) -> &WindowIdentity { &self.identity }

    /// The last committed snapshot.
    #[must_use]
    pub const fn cached(&self) -> &BoundsSnapshot { &self.cached }

    /// Stops tracking: leaves the window's group and rejects further events.
    pub fn detach(&mut self) {
        self.detached = true;
        self.store.leave_group(self.identity.uuid);
        tracing::debug!(window = %self.identity.name, "tracker detached");
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Handles one native notification.
    ///
    /// # Errors
    ///
    /// Returns [`FrameGroupError::Detached`] after [`detach`](Self::detach),
    /// or a toolkit error from geometry reads and propagation.
    pub fn dispatch(&mut self, event: NativeEvent) -> Result<()> {
        if self.detached {
            return Err(FrameGroupError::Detached(self.identity.name.clone()));
        }

        match event {
            NativeEvent::BeginUserBoundsChange => self.on_begin_user_change(),
            NativeEvent::BoundsChanging(bounds) => self.on_bounds_changing(bounds),
            NativeEvent::BoundsChanged => self.on_bounds_changed(),
            NativeEvent::EndUserBoundsChange => self.on_end_user_change(),
            NativeEvent::AnimationEnd(bounds) => self.on_animation_end(bounds),
            NativeEvent::Minimize => self.on_minimize(),
            NativeEvent::Maximize => self.on_maximize(),
            NativeEvent::Restore => self.on_restore(),
            NativeEvent::Unmaximize => self.on_unmaximize(),
            NativeEvent::VisibilityChanged { visible } => self.on_visibility(visible),
            NativeEvent::DeferredSetBounds(bounds) => self.on_deferred_set_bounds(bounds),
            NativeEvent::EndGroupTransaction => self.on_end_group_transaction(),
        }
    }

    fn on_begin_user_change(&mut self) -> Result<()> {
        self.user_drag_active = true;
        let payload =
            TransitionPayload::new(self.identity.uuid, &self.identity.name, &self.cached.bounds);
        self.publish(BEGIN_BOUNDS_CHANGING, &payload);
        Ok(())
    }

    fn on_end_user_change(&mut self) -> Result<()> {
        let payload =
            TransitionPayload::new(self.identity.uuid, &self.identity.name, &self.cached.bounds);
        self.publish(END_BOUNDS_CHANGING, &payload);

        // Commit the drag transaction even if the last notification already
        // matched the cache.
        let current = self.observe()?;
        self.run_pass(&current, false, true)?;
        self.user_drag_active = false;
        Ok(())
    }

    fn on_bounds_changing(&mut self, bounds: Bounds) -> Result<()> {
        let current = self.snapshot_of(bounds);
        self.run_pass(&current, true, false)?;
        Ok(())
    }

    fn on_bounds_changed(&mut self) -> Result<()> {
        let current = self.observe()?;
        let dispatched = self.run_pass(&current, false, false)?;

        if self.api_transaction_active() {
            // Programmatic transactions have no end notification of their
            // own; the settled event doubles as the commit.
            let current = self.observe()?;
            self.run_pass(&current, false, true)?;
        } else if !dispatched
            && self.store.group_of(self.identity.uuid).is_none()
            && !self.user_drag_active
            && !self.animation.has_window(self.identity.uuid)
            && self.state != TransactionState::default()
        {
            // An ungrouped settle with nothing dispatched and no open driver
            // still has to commit whatever the sticky flags accumulated. A
            // settle with clean flags and identical geometry stays quiet.
            let current = self.observe()?;
            self.run_pass(&current, false, true)?;
        }
        Ok(())
    }

    fn on_animation_end(&mut self, bounds: Bounds) -> Result<()> {
        let current = self.snapshot_of(bounds);
        self.run_pass(&current, false, true)?;
        Ok(())
    }

    fn on_minimize(&mut self) -> Result<()> {
        // The minimized gate keeps this from dispatching; the pass still
        // accumulates sticky flags and parks the cache on the new geometry.
        let current = self.observe()?;
        self.run_pass(&current, false, false)?;
        Ok(())
    }

    fn on_maximize(&mut self) -> Result<()> {
        // The window is already in the deferred state when this arrives, so
        // the resulting event is queued rather than published.
        let current = self.observe()?;
        self.run_pass(&current, false, false)?;
        Ok(())
    }

    fn on_restore(&mut self) -> Result<()> {
        let restored = self.handle.normalize_restored_bounds()?;
        self.cached = self.snapshot_of(restored);

        if self.state != TransactionState::default() {
            // Changes gated out while minimized commit now.
            let current = self.cached;
            self.run_pass(&current, false, true)?;
        }
        self.flush_if_live();
        Ok(())
    }

    fn on_unmaximize(&mut self) -> Result<()> {
        self.flush_if_live();
        let current = self.observe()?;
        self.run_pass(&current, false, false)?;
        Ok(())
    }

    fn on_visibility(&mut self, visible: bool) -> Result<()> {
        self.visible = visible;
        if visible {
            self.flush_if_live();
        }
        Ok(())
    }

    fn on_deferred_set_bounds(&mut self, bounds: Bounds) -> Result<()> {
        // Pass-through to the external bookkeeping; no tracker state changes.
        self.ledger.handle_move(self.identity.uuid, bounds);
        Ok(())
    }

    fn on_end_group_transaction(&mut self) -> Result<()> {
        // Follower-side commit of a transaction led by another member. Force
        // only when sticky flags are pending; an already-committed follower
        // stays quiet.
        let current = self.observe()?;
        let force = self.state != TransactionState::default();
        self.run_pass(&current, false, force)?;
        Ok(())
    }

    // ========================================================================
    // Detection Pass
    // ========================================================================

    /// Runs one detection pass and returns whether it dispatched.
    ///
    /// The cache is replaced afterwards regardless of the outcome; a gated
    /// pass leaves its mark only in the sticky flags.
    fn run_pass(&mut self, current: &BoundsSnapshot, intermediate: bool, force: bool) -> Result<bool> {
        let detection =
            detector::evaluate(current, &self.cached, &mut self.state, intermediate, force);

        let dispatched = if let Some(detection) = detection {
            let reason = self.resolve_reason();
            let kind = if intermediate {
                BoundsEventKind::Changing
            } else {
                BoundsEventKind::Changed
            };
            let payload = self.payload(detection.change_type, reason, kind, &current.bounds);

            if self.is_deferred() {
                tracing::trace!(
                    window = %self.identity.name,
                    change = ?detection.change_type,
                    "deferring change event"
                );
                self.queue.push(payload);
            } else {
                self.publish(SYNTH_BOUNDS_CHANGE, &payload);
            }

            if let Some(group) = self.store.group_of(self.identity.uuid) {
                self.propagator.handle_dispatch(
                    &self.identity,
                    group,
                    &self.cached.bounds,
                    &current.bounds,
                    detection.change_type,
                    self.user_drag_active,
                    force && !intermediate,
                )?;
            }
            true
        } else {
            false
        };

        self.cached = *current;
        Ok(dispatched)
    }

    /// Resolves why the current change is happening, relative to this window.
    ///
    /// When the group has a leader other than this window, the leader is the
    /// acting window and the reason becomes a group reason; the animation
    /// check always targets the acting window.
    fn resolve_reason(&self) -> ChangeReason {
        let leader = self
            .store
            .group_of(self.identity.uuid)
            .and_then(|group| self.store.leader(group));

        match leader {
            Some(leader) if leader.uuid != self.identity.uuid => {
                if self.animation.has_window(leader.uuid) {
                    ChangeReason::GroupAnimation
                } else {
                    ChangeReason::Group
                }
            }
            _ => {
                if self.animation.has_window(self.identity.uuid) {
                    ChangeReason::Animation
                } else {
                    ChangeReason::SelfChange
                }
            }
        }
    }

    // ========================================================================
    // Deferred State
    // ========================================================================

    /// Whether events must be queued instead of published.
    fn is_deferred(&self) -> bool {
        !self.visible || self.handle.is_minimized() || self.handle.is_maximized()
    }

    /// Flushes the deferred queue if the window left the deferred state.
    ///
    /// Each survivor replays as a `bounds-changing` + `bounds-changed` pair
    /// so consumers still see the transitional-then-terminal contract.
    fn flush_if_live(&mut self) {
        if self.is_deferred() || self.queue.is_empty() {
            return;
        }
        for event in self.queue.flush() {
            self.publish(SYNTH_BOUNDS_CHANGE, &event.relabeled(BoundsEventKind::Changing));
            self.publish(SYNTH_BOUNDS_CHANGE, &event);
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn observe(&self) -> Result<BoundsSnapshot> {
        Self::observe_handle(&self.handle)
    }

    fn observe_handle(handle: &Arc<dyn WindowHandle>) -> Result<BoundsSnapshot> {
        Ok(BoundsSnapshot::new(
            handle.bounds()?,
            handle.has_frame(),
            handle.window_state(),
        ))
    }

    fn snapshot_of(&self, bounds: Bounds) -> BoundsSnapshot {
        BoundsSnapshot::new(bounds, self.handle.has_frame(), self.handle.window_state())
    }

    fn payload(
        &self,
        change_type: ChangeType,
        reason: ChangeReason,
        kind: BoundsEventKind,
        bounds: &Bounds,
    ) -> BoundsChangePayload {
        BoundsChangePayload {
            change_type,
            reason,
            name: self.identity.name.clone(),
            uuid: self.identity.uuid,
            kind,
            deferred: self.is_deferred(),
            top: bounds.y,
            left: bounds.x,
            width: bounds.width,
            height: bounds.height,
        }
    }

    fn publish<T: serde::Serialize>(&self, event: &str, payload: &T) {
        match serde_json::to_value(payload) {
            Ok(value) => self.bus.publish(event, value),
            Err(error) => {
                tracing::error!(window = %self.identity.name, %error, "payload serialization failed");
            }
        }
    }

    /// Whether this window's group is inside an api-led transaction.
    ///
    /// Followers of an api move get no terminal native event of their own,
    /// so the settle notification has to double as their commit too.
    fn api_transaction_active(&self) -> bool {
        self.store
            .group_of(self.identity.uuid)
            .and_then(|group| self.store.leader(group))
            .is_some_and(|leader| leader.kind == LeaderKind::Api)
    }
}

// ============================================================================
// Tests
// ============================================================================
