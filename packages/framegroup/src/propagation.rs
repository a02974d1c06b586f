//! Grouped move propagation.
//!
//! When the leader of a docking group moves or resizes, every other member
//! must follow. This module elects the leader for a transaction, computes
//! each follower's new geometry from the leader's delta, and applies the
//! result through a platform-selected [`PropagationStrategy`]:
//!
//! - [`BatchedStrategy`] collects all follower placements into a single
//!   atomic multi-window transaction and commits once (window servers that
//!   support batched placement).
//! - [`SequentialStrategy`] applies follower geometry one window at a time
//!   and leaves fullscreen/maximized followers untouched.
//!
//! For pure size changes the follower geometry comes from the shared-edge
//! resize rule: a follower edge within a small pixel tolerance of a leader
//! edge is treated as attached and moves by that edge's delta. For anything
//! involving position, followers are offset by the leader's raw delta with
//! safe-integer clamping.

use std::sync::Arc;

use crate::config::{GroupBehavior, TrackingConfig};
use crate::constants::SHARED_EDGE_TOLERANCE;
use crate::error::Result;
use crate::geometry::{self, Bounds, ChangeType, Delta, offset_clamped};
use crate::group::{GroupId, GroupLeader, GroupMember, GroupStore, LeaderKind, WindowIdentity};
use crate::toolkit::{AnimationDriver, DeferredMoveLedger, MoveFlags, TransactionFactory};

// ============================================================================
// Planned Moves
// ============================================================================

/// A follower together with its computed target geometry.
pub struct PlannedMove {
    /// The follower window.
    pub member: GroupMember,
    /// Where it should end up.
    pub bounds: Bounds,
}

// ============================================================================
// Propagation Strategies
// ============================================================================

/// Applies a set of planned follower moves.
///
/// One implementation is selected at startup by platform capability and
/// shared by all trackers.
pub trait PropagationStrategy {
    /// Applies the planned moves.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying toolkit or transaction facility
    /// fails.
    fn apply(&self, moves: &[PlannedMove], include_size: bool) -> Result<()>;
}

/// Atomic multi-window strategy for platforms with a batched transaction
/// facility.
///
/// Maximized followers are unmaximized first, every placement suppresses
/// z-order and activation changes, and the whole batch commits once. Final
/// per-window positions from the commit are forwarded to the deferred-move
/// ledger.
pub struct BatchedStrategy {
    factory: Arc<dyn TransactionFactory>,
    ledger: Arc<dyn DeferredMoveLedger>,
}

impl BatchedStrategy {
    /// Creates a batched strategy over the platform transaction facility.
    #[must_use]
    pub fn new(
        factory: Arc<dyn TransactionFactory>,
        ledger: Arc<dyn DeferredMoveLedger>,
    ) -> Self {
        Self { factory, ledger }
    }
}

impl PropagationStrategy for BatchedStrategy {
    fn apply(&self, moves: &[PlannedMove], include_size: bool) -> Result<()> {
        if moves.is_empty() {
            return Ok(());
        }

        let mut transaction = self.factory.begin()?;
        let flags = MoveFlags::propagation(include_size);

        for planned in moves {
            // Stacking only, not activation.
            planned.member.handle.bring_to_front();
            if planned.member.handle.is_maximized() {
                planned.member.handle.unmaximize()?;
            }
            transaction.set_window_pos(planned.member.identity.uuid, planned.bounds, flags)?;
        }

        for completion in transaction.commit()? {
            self.ledger.handle_move(completion.uuid, completion.bounds);
        }
        Ok(())
    }
}

/// Sequential per-window strategy for platforms without batched placement.
///
/// Fullscreen and maximized followers are skipped rather than forcibly
/// restored.
#[derive(Default)]
pub struct SequentialStrategy;

impl SequentialStrategy {
    /// Creates a sequential strategy.
    #[must_use]
    pub const fn new() -> Self { Self }
}

impl PropagationStrategy for SequentialStrategy {
    fn apply(&self, moves: &[PlannedMove], _include_size: bool) -> Result<()> {
        for planned in moves {
            let handle = &planned.member.handle;
            if handle.is_fullscreen() || handle.is_maximized() {
                tracing::trace!(
                    follower = %planned.member.identity.name,
                    "skipping fullscreen/maximized follower"
                );
                continue;
            }
            handle.bring_to_front();
            handle.set_bounds(planned.bounds)?;
        }
        Ok(())
    }
}

// ============================================================================
// Follower Geometry
// ============================================================================

/// Whether two edge coordinates are close enough to count as attached.
const fn edges_attached(a: i32, b: i32) -> bool {
    (a as i64 - b as i64).abs() <= SHARED_EDGE_TOLERANCE as i64
}

/// One axis of the shared-edge resize rule.
///
/// Each follower edge that sits within tolerance of a leader cached edge
/// moves by that leader edge's delta; unattached edges stay put.
fn resize_axis(
    follower_lo: i32,
    follower_hi: i32,
    leader_lo: i32,
    leader_hi: i32,
    delta_lo: i32,
    delta_hi: i32,
) -> (i32, i32) {
    let lo_shift = if edges_attached(follower_lo, leader_lo) {
        delta_lo
    } else if edges_attached(follower_lo, leader_hi) {
        delta_hi
    } else {
        0
    };
    let hi_shift = if edges_attached(follower_hi, leader_lo) {
        delta_lo
    } else if edges_attached(follower_hi, leader_hi) {
        delta_hi
    } else {
        0
    };
    (offset_clamped(follower_lo, lo_shift), offset_clamped(follower_hi, hi_shift))
}

/// Computes a follower's new geometry from the leader's movement.
#[must_use]
pub fn follower_bounds(
    change_type: ChangeType,
    leader_cached: &Bounds,
    delta: &Delta,
    follower: &Bounds,
    work_area: &Bounds,
) -> Bounds {
    if change_type == ChangeType::Size {
        let (left, right) = resize_axis(
            follower.x,
            follower.right(),
            leader_cached.x,
            leader_cached.right(),
            delta.x,
            delta.x2,
        );
        let (top, bottom) = resize_axis(
            follower.y,
            follower.bottom(),
            leader_cached.y,
            leader_cached.bottom(),
            delta.y,
            delta.y2,
        );

        let width = if right > left { right - left } else { follower.width };
        let height = if bottom > top { bottom - top } else { follower.height };
        Bounds::new(left, top, width, height).clipped_to(work_area)
    } else {
        // Anything involving position: raw offset by the leader's delta.
        Bounds::new(
            offset_clamped(follower.x, delta.x),
            offset_clamped(follower.y, delta.y),
            follower.width,
            follower.height,
        )
    }
}

// ============================================================================
// Propagator
// ============================================================================

/// Drives group propagation for one tracker's dispatches.
pub struct GroupedMovePropagator {
    store: Arc<GroupStore>,
    strategy: Arc<dyn PropagationStrategy>,
    animation: Arc<dyn AnimationDriver>,
    config: TrackingConfig,
}

impl GroupedMovePropagator {
    /// Creates a propagator over the shared group store.
    #[must_use]
    pub fn new(
        store: Arc<GroupStore>,
        strategy: Arc<dyn PropagationStrategy>,
        animation: Arc<dyn AnimationDriver>,
        config: TrackingConfig,
    ) -> Self {
        Self { store, strategy, animation, config }
    }

    /// Handles one dispatched change event for a grouped window.
    ///
    /// Elects a leader if the group has none, propagates the leader's delta
    /// to every follower when this window is the leader, and commits the
    /// transaction (clearing the leader, broadcasting end-of-transaction)
    /// when the leader's terminal event arrives.
    ///
    /// # Errors
    ///
    /// Returns an error when follower application fails at the toolkit
    /// layer.
    pub fn handle_dispatch(
        &self,
        identity: &WindowIdentity,
        group: GroupId,
        cached: &Bounds,
        current: &Bounds,
        change_type: ChangeType,
        user_drag_active: bool,
        terminal: bool,
    ) -> Result<()> {
        if !self.config.frame_groups_enabled {
            return Ok(());
        }

        let leader = match self.store.leader(group) {
            Some(leader) => leader,
            None => {
                let kind = if user_drag_active {
                    LeaderKind::User
                } else if self.animation.has_window(identity.uuid) {
                    LeaderKind::Animation
                } else {
                    LeaderKind::Api
                };
                let leader = GroupLeader {
                    uuid: identity.uuid,
                    name: identity.name.clone(),
                    kind,
                };
                self.store.set_leader(group, leader.clone());
                leader
            }
        };

        // Followers never move the group.
        if leader.uuid == identity.uuid {
            if self.propagation_permitted(change_type, leader.kind) {
                self.propagate(identity, group, cached, current, change_type)?;
            }

            if terminal {
                // Api leaders already notify followers individually via
                // their forced terminal pass, so the transaction closes
                // immediately. Otherwise the leader stays installed until
                // the embedding layer routes the end-of-transaction
                // broadcast and clears the group, so follower commits still
                // resolve against it.
                if leader.kind == LeaderKind::Api {
                    self.store.clear_group(group);
                } else {
                    self.store.notify_end_transaction(group);
                }
                tracing::debug!(group = %group.0, leader = %identity.name, "group transaction committed");
            }
        }

        Ok(())
    }

    /// Whether the configured behavior toggles permit this propagation.
    fn propagation_permitted(&self, change_type: ChangeType, kind: LeaderKind) -> bool {
        if change_type == ChangeType::Size && self.config.is_disabled(GroupBehavior::Resize) {
            tracing::trace!("grouped resize propagation disabled");
            return false;
        }
        if kind == LeaderKind::Api && self.config.is_disabled(GroupBehavior::Api) {
            tracing::trace!("api group propagation disabled");
            return false;
        }
        true
    }

    fn propagate(
        &self,
        identity: &WindowIdentity,
        group: GroupId,
        cached: &Bounds,
        current: &Bounds,
        change_type: ChangeType,
    ) -> Result<()> {
        let delta = geometry::delta(current, cached);
        if delta.is_zero() {
            return Ok(());
        }

        let mut moves: Vec<PlannedMove> = Vec::new();
        for member in self.store.members(group) {
            if member.identity.uuid == identity.uuid {
                continue;
            }
            // A vanished follower is a benign no-op, not a failure.
            let Ok(live) = member.handle.bounds() else {
                tracing::warn!(
                    follower = %member.identity.name,
                    "could not read follower bounds, skipping"
                );
                continue;
            };
            let work_area = member.handle.visible_work_area();
            let bounds = follower_bounds(change_type, cached, &delta, &live, &work_area);
            moves.push(PlannedMove { member, bounds });
        }

        self.strategy.apply(&moves, change_type.includes_size())
    }
}

// ============================================================================
// Tests
// ============================================================================
