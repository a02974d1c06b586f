//! Bounds-change tracking and grouped-move coordination for managed windows.
//!
//! The crate sits between a native windowing toolkit and a higher event
//! layer. It turns the toolkit's noisy geometry notifications into clean
//! semantic events (moved, resized, or both, and why), defers events while a
//! window cannot meaningfully receive them, and keeps docked window groups
//! moving as one unit behind an elected per-transaction leader.
//!
//! # How It Works
//!
//! - [`tracker::BoundsChangeTracker`] consumes normalized
//!   [`tracker::NativeEvent`]s for one window and publishes
//!   [`events::BoundsChangePayload`]s to the injected [`events::EventBus`].
//! - [`detector`] classifies each pass against the cached snapshot, with
//!   sticky per-transaction flags and anchored-resize disambiguation.
//! - [`group::GroupStore`] holds group membership and transaction leaders;
//!   [`propagation::GroupedMovePropagator`] mirrors the leader's movement
//!   onto every follower through a platform-selected
//!   [`propagation::PropagationStrategy`].
//! - [`deferred::DeferredEventQueue`] buffers events for hidden, minimized,
//!   or maximized windows and coalesces them on flush.
//!
//! Everything runs single-threaded with run-to-completion handlers; the
//! toolkit, animation subsystem, and event bus are reached only through the
//! traits in [`toolkit`] and [`events`].

pub mod config;
pub mod constants;
pub mod deferred;
pub mod detector;
pub mod error;
pub mod events;
pub mod geometry;
pub mod group;
pub mod propagation;
pub mod toolkit;
pub mod tracker;

pub use config::{GroupBehavior, TrackingConfig};
pub use error::{FrameGroupError, Result};
pub use events::{BoundsChangePayload, BoundsEventKind, EventBus, TransitionPayload};
pub use geometry::{Bounds, BoundsSnapshot, ChangeReason, ChangeType, WindowState};
pub use group::{GroupId, GroupLeader, GroupMember, GroupStore, LeaderKind, WindowIdentity};
pub use propagation::{
    BatchedStrategy, GroupedMovePropagator, PropagationStrategy, SequentialStrategy,
};
pub use toolkit::{
    AnimationDriver, DeferredMoveLedger, MoveCompletion, MoveFlags, MoveTransaction,
    TransactionFactory, WindowHandle,
};
pub use tracker::{BoundsChangeTracker, NativeEvent};
