//! End-to-end scenarios across trackers, the group store, and propagation.
//!
//! These tests play the role of the embedding layer: they route native
//! notifications to the right tracker, drain end-of-transaction broadcasts,
//! and forward recorded moves, the way the host application wires the crate.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use framegroup::{
    AnimationDriver, BatchedStrategy, Bounds, BoundsChangeTracker, DeferredMoveLedger, EventBus,
    GroupId, GroupMember, GroupStore, GroupedMovePropagator, MoveCompletion, MoveFlags,
    MoveTransaction, NativeEvent, PropagationStrategy, Result, SequentialStrategy,
    TrackingConfig, TransactionFactory, WindowHandle, WindowIdentity,
};

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// Test Doubles
// ============================================================================

struct MockWindow {
    bounds: Mutex<Bounds>,
    minimized: Mutex<bool>,
    maximized: Mutex<bool>,
}

impl MockWindow {
    fn new(bounds: Bounds) -> Arc<Self> {
        Arc::new(Self {
            bounds: Mutex::new(bounds),
            minimized: Mutex::new(false),
            maximized: Mutex::new(false),
        })
    }
}

impl WindowHandle for MockWindow {
    fn bounds(&self) -> Result<Bounds> { Ok(*self.bounds.lock()) }
    fn is_minimized(&self) -> bool { *self.minimized.lock() }
    fn is_maximized(&self) -> bool { *self.maximized.lock() }
    fn is_fullscreen(&self) -> bool { false }
    fn has_frame(&self) -> bool { true }
    fn set_bounds(&self, bounds: Bounds) -> Result<()> {
        *self.bounds.lock() = bounds;
        Ok(())
    }
    fn unmaximize(&self) -> Result<()> {
        *self.maximized.lock() = false;
        Ok(())
    }
    fn bring_to_front(&self) {}
    fn visible_work_area(&self) -> Bounds { Bounds::new(0, 0, 1920, 1080) }
    fn normalize_restored_bounds(&self) -> Result<Bounds> { Ok(*self.bounds.lock()) }
}

#[derive(Default)]
struct MockBus {
    published: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MockBus {
    fn changes_for(&self, uuid: Uuid) -> Vec<serde_json::Value> {
        self.published
            .lock()
            .iter()
            .filter(|(name, payload)| {
                name == "synth-bounds-change" && payload["uuid"] == uuid.to_string()
            })
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl EventBus for MockBus {
    fn publish(&self, event: &str, payload: serde_json::Value) {
        self.published.lock().push((event.to_string(), payload));
    }
}

#[derive(Default)]
struct MockAnimation {
    animating: Mutex<Vec<Uuid>>,
}

impl AnimationDriver for MockAnimation {
    fn has_window(&self, uuid: Uuid) -> bool {
        self.animating.lock().contains(&uuid)
    }
}

#[derive(Default)]
struct RecordingLedger {
    moves: Mutex<Vec<(Uuid, Bounds)>>,
}

impl DeferredMoveLedger for RecordingLedger {
    fn handle_move(&self, uuid: Uuid, bounds: Bounds) {
        self.moves.lock().push((uuid, bounds));
    }
}

/// Transaction that applies placements to the mock windows on commit, the
/// way the real window server applies a batch.
struct ApplyingTransaction {
    windows: Arc<Mutex<HashMap<Uuid, Arc<MockWindow>>>>,
    placements: Vec<(Uuid, Bounds)>,
}

impl MoveTransaction for ApplyingTransaction {
    fn set_window_pos(&mut self, uuid: Uuid, bounds: Bounds, _flags: MoveFlags) -> Result<()> {
        self.placements.push((uuid, bounds));
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<Vec<MoveCompletion>> {
        let windows = self.windows.lock();
        let mut completions = Vec::new();
        for (uuid, bounds) in self.placements {
            if let Some(window) = windows.get(&uuid) {
                *window.bounds.lock() = bounds;
            }
            completions.push(MoveCompletion { uuid, bounds });
        }
        Ok(completions)
    }
}

struct ApplyingFactory {
    windows: Arc<Mutex<HashMap<Uuid, Arc<MockWindow>>>>,
}

impl TransactionFactory for ApplyingFactory {
    fn begin(&self) -> Result<Box<dyn MoveTransaction>> {
        Ok(Box::new(ApplyingTransaction {
            windows: Arc::clone(&self.windows),
            placements: Vec::new(),
        }))
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    bus: Arc<MockBus>,
    animation: Arc<MockAnimation>,
    store: Arc<GroupStore>,
    ledger: Arc<RecordingLedger>,
    propagator: Arc<GroupedMovePropagator>,
    windows: Arc<Mutex<HashMap<Uuid, Arc<MockWindow>>>>,
}

impl Harness {
    fn sequential() -> Self {
        Self::with_strategy(|_, _| Arc::new(SequentialStrategy::new()))
    }

    fn batched() -> Self {
        Self::with_strategy(|windows, ledger| {
            Arc::new(BatchedStrategy::new(
                Arc::new(ApplyingFactory { windows }),
                ledger,
            ))
        })
    }

    fn with_strategy(
        make: impl FnOnce(
            Arc<Mutex<HashMap<Uuid, Arc<MockWindow>>>>,
            Arc<dyn DeferredMoveLedger>,
        ) -> Arc<dyn PropagationStrategy>,
    ) -> Self {
        init_tracing();
        let bus = Arc::new(MockBus::default());
        let animation = Arc::new(MockAnimation::default());
        let store = Arc::new(GroupStore::new());
        let ledger = Arc::new(RecordingLedger::default());
        let windows = Arc::new(Mutex::new(HashMap::new()));
        let strategy = make(Arc::clone(&windows), Arc::clone(&ledger) as _);
        let propagator = Arc::new(GroupedMovePropagator::new(
            Arc::clone(&store),
            strategy,
            Arc::clone(&animation) as _,
            TrackingConfig::default(),
        ));
        Self { bus, animation, store, ledger, propagator, windows }
    }

    fn add_window(&self, name: &str, bounds: Bounds) -> (Arc<MockWindow>, BoundsChangeTracker) {
        let window = MockWindow::new(bounds);
        let identity = WindowIdentity::new(Uuid::now_v7(), name);
        self.windows.lock().insert(identity.uuid, Arc::clone(&window));
        let tracker = BoundsChangeTracker::new(
            identity,
            Arc::clone(&window) as _,
            Arc::clone(&self.bus) as _,
            Arc::clone(&self.animation) as _,
            Arc::clone(&self.store),
            Arc::clone(&self.propagator),
            Arc::clone(&self.ledger) as _,
        )
        .unwrap();
        (window, tracker)
    }

    fn join(&self, group: GroupId, tracker: &BoundsChangeTracker) {
        let uuid = tracker.identity().uuid;
        let window = Arc::clone(self.windows.lock().get(&uuid).unwrap());
        self.store.join_group(group, GroupMember {
            identity: tracker.identity().clone(),
            handle: window as _,
        });
    }

    /// What the embedding layer does after each handler: route broadcasts to
    /// follower trackers and close the transaction.
    fn route_end_transactions(&self, followers: &mut [&mut BoundsChangeTracker]) {
        for group in self.store.take_end_transactions() {
            for follower in followers.iter_mut() {
                follower.dispatch(NativeEvent::EndGroupTransaction).unwrap();
            }
            self.store.clear_group(group);
        }
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_grouped_user_drag_moves_follower() {
    let h = Harness::sequential();
    let group = GroupId(Uuid::now_v7());
    let (leader_win, mut leader) = h.add_window("leader", Bounds::new(0, 0, 100, 100));
    let (follower_win, mut follower) = h.add_window("follower", Bounds::new(200, 50, 80, 80));
    h.join(group, &leader);
    h.join(group, &follower);

    leader.dispatch(NativeEvent::BeginUserBoundsChange).unwrap();
    *leader_win.bounds.lock() = Bounds::new(20, 0, 100, 100);
    leader
        .dispatch(NativeEvent::BoundsChanging(Bounds::new(20, 0, 100, 100)))
        .unwrap();

    // Intermediate propagation already moved the follower.
    assert_eq!(*follower_win.bounds.lock(), Bounds::new(220, 50, 80, 80));

    // The follower's own native notification arrives while the leader is
    // still installed, so its event carries the group reason.
    follower.dispatch(NativeEvent::BoundsChanged).unwrap();
    let follower_changes = h.bus.changes_for(follower.identity().uuid);
    assert!(!follower_changes.is_empty());
    assert_eq!(follower_changes[0]["reason"], "group");

    leader.dispatch(NativeEvent::EndUserBoundsChange).unwrap();
    h.route_end_transactions(&mut [&mut follower]);

    assert!(h.store.leader(group).is_none());
    let leader_changes = h.bus.changes_for(leader.identity().uuid);
    assert_eq!(leader_changes.last().unwrap()["type"], "bounds-changed");
    assert_eq!(leader_changes.last().unwrap()["reason"], "self");
}

#[test]
fn test_grouped_resize_follows_shared_edges_only() {
    let h = Harness::sequential();
    let group = GroupId(Uuid::now_v7());
    let (leader_win, mut leader) = h.add_window("leader", Bounds::new(0, 0, 100, 100));
    // Docked to the leader's right edge.
    let (docked_win, docked) = h.add_window("docked", Bounds::new(100, 0, 80, 100));
    // In the group but sharing no edge.
    let (floating_win, floating) = h.add_window("floating", Bounds::new(600, 600, 80, 80));
    h.join(group, &leader);
    h.join(group, &docked);
    h.join(group, &floating);

    leader.dispatch(NativeEvent::BeginUserBoundsChange).unwrap();
    *leader_win.bounds.lock() = Bounds::new(0, 0, 140, 100);
    leader
        .dispatch(NativeEvent::BoundsChanging(Bounds::new(0, 0, 140, 100)))
        .unwrap();
    leader.dispatch(NativeEvent::EndUserBoundsChange).unwrap();

    // The docked follower's attached left edge tracked the leader's right
    // edge; the floating member did not move.
    assert_eq!(*docked_win.bounds.lock(), Bounds::new(140, 0, 40, 100));
    assert_eq!(*floating_win.bounds.lock(), Bounds::new(600, 600, 80, 80));

    let leader_changes = h.bus.changes_for(leader.identity().uuid);
    assert_eq!(leader_changes.last().unwrap()["changeType"], "size");
}

#[test]
fn test_api_move_propagates_batched_and_closes_without_broadcast() {
    let h = Harness::batched();
    let group = GroupId(Uuid::now_v7());
    let (leader_win, mut leader) = h.add_window("leader", Bounds::new(0, 0, 100, 100));
    let (follower_win, follower) = h.add_window("follower", Bounds::new(200, 0, 80, 80));
    h.join(group, &leader);
    h.join(group, &follower);

    // No drag, no animation: the settle notification is the whole
    // transaction and the leader is elected as api.
    *leader_win.bounds.lock() = Bounds::new(30, 10, 100, 100);
    leader.dispatch(NativeEvent::BoundsChanged).unwrap();

    // The batch applied the follower's offset geometry and the completion
    // reached the ledger.
    assert_eq!(*follower_win.bounds.lock(), Bounds::new(230, 10, 80, 80));
    assert_eq!(
        h.ledger.moves.lock().as_slice(),
        &[(follower.identity().uuid, Bounds::new(230, 10, 80, 80))]
    );

    // Api transactions close on the settle itself: leader gone, nothing to
    // broadcast, and the leader saw both the change and the commit event.
    assert!(h.store.leader(group).is_none());
    assert!(h.store.take_end_transactions().is_empty());
    let leader_changes = h.bus.changes_for(leader.identity().uuid);
    assert_eq!(leader_changes.len(), 2);
    assert!(leader_changes.iter().all(|c| c["type"] == "bounds-changed"));
}

#[test]
fn test_hidden_follower_defers_group_events_until_shown() {
    let h = Harness::sequential();
    let group = GroupId(Uuid::now_v7());
    let (leader_win, mut leader) = h.add_window("leader", Bounds::new(0, 0, 100, 100));
    let (_, mut follower) = h.add_window("follower", Bounds::new(200, 0, 80, 80));
    h.join(group, &leader);
    h.join(group, &follower);

    follower
        .dispatch(NativeEvent::VisibilityChanged { visible: false })
        .unwrap();

    leader.dispatch(NativeEvent::BeginUserBoundsChange).unwrap();
    *leader_win.bounds.lock() = Bounds::new(50, 0, 100, 100);
    leader
        .dispatch(NativeEvent::BoundsChanging(Bounds::new(50, 0, 100, 100)))
        .unwrap();
    follower.dispatch(NativeEvent::BoundsChanged).unwrap();
    leader.dispatch(NativeEvent::EndUserBoundsChange).unwrap();

    // Nothing surfaced for the hidden follower yet.
    assert!(h.bus.changes_for(follower.identity().uuid).is_empty());

    follower
        .dispatch(NativeEvent::VisibilityChanged { visible: true })
        .unwrap();
    h.route_end_transactions(&mut [&mut follower]);

    // The queued group event replays as a changing + changed pair, marked
    // deferred and still attributed to the group.
    let changes = h.bus.changes_for(follower.identity().uuid);
    assert_eq!(changes.len(), 2);
    assert_eq!(changes[0]["type"], "bounds-changing");
    assert_eq!(changes[1]["type"], "bounds-changed");
    assert_eq!(changes[1]["deferred"], true);
    assert_eq!(changes[1]["reason"], "group");
    assert_eq!(changes[1]["left"], 250);
}

#[test]
fn test_animated_leader_attributes_followers_to_group_animation() {
    let h = Harness::sequential();
    let group = GroupId(Uuid::now_v7());
    let (leader_win, mut leader) = h.add_window("leader", Bounds::new(0, 0, 100, 100));
    let (_, mut follower) = h.add_window("follower", Bounds::new(200, 0, 80, 80));
    h.join(group, &leader);
    h.join(group, &follower);

    h.animation.animating.lock().push(leader.identity().uuid);

    *leader_win.bounds.lock() = Bounds::new(40, 0, 100, 100);
    leader
        .dispatch(NativeEvent::BoundsChanging(Bounds::new(40, 0, 100, 100)))
        .unwrap();
    follower.dispatch(NativeEvent::BoundsChanged).unwrap();

    let leader_changes = h.bus.changes_for(leader.identity().uuid);
    assert_eq!(leader_changes[0]["reason"], "animation");

    let follower_changes = h.bus.changes_for(follower.identity().uuid);
    assert_eq!(follower_changes[0]["reason"], "group-animation");

    // The animation finishing commits and queues the broadcast.
    h.animation.animating.lock().clear();
    leader
        .dispatch(NativeEvent::AnimationEnd(Bounds::new(40, 0, 100, 100)))
        .unwrap();
    h.route_end_transactions(&mut [&mut follower]);
    assert!(h.store.leader(group).is_none());
}

#[test]
fn test_leaving_group_stops_following() {
    let h = Harness::sequential();
    let group = GroupId(Uuid::now_v7());
    let (leader_win, mut leader) = h.add_window("leader", Bounds::new(0, 0, 100, 100));
    let (follower_win, follower) = h.add_window("follower", Bounds::new(200, 0, 80, 80));
    h.join(group, &leader);
    h.join(group, &follower);

    h.store.leave_group(follower.identity().uuid);

    *leader_win.bounds.lock() = Bounds::new(25, 0, 100, 100);
    leader.dispatch(NativeEvent::BoundsChanged).unwrap();

    assert_eq!(*follower_win.bounds.lock(), Bounds::new(200, 0, 80, 80));
}

#[test]
fn test_disabled_frame_groups_keep_self_events_flowing() {
    let bus = Arc::new(MockBus::default());
    let animation = Arc::new(MockAnimation::default());
    let store = Arc::new(GroupStore::new());
    let config = TrackingConfig { frame_groups_enabled: false, ..TrackingConfig::default() };
    let propagator = Arc::new(GroupedMovePropagator::new(
        Arc::clone(&store),
        Arc::new(SequentialStrategy::new()),
        Arc::clone(&animation) as _,
        config,
    ));

    let window = MockWindow::new(Bounds::new(0, 0, 100, 100));
    let identity = WindowIdentity::new(Uuid::now_v7(), "solo");
    let group = GroupId(Uuid::now_v7());
    store.join_group(group, GroupMember {
        identity: identity.clone(),
        handle: Arc::clone(&window) as _,
    });

    let follower_win = MockWindow::new(Bounds::new(200, 0, 80, 80));
    store.join_group(group, GroupMember {
        identity: WindowIdentity::new(Uuid::now_v7(), "other"),
        handle: Arc::clone(&follower_win) as _,
    });

    let mut tracker = BoundsChangeTracker::new(
        identity,
        Arc::clone(&window) as _,
        Arc::clone(&bus) as _,
        Arc::clone(&animation) as _,
        Arc::clone(&store),
        propagator,
        Arc::new(RecordingLedger::default()) as _,
    )
    .unwrap();

    *window.bounds.lock() = Bounds::new(15, 0, 100, 100);
    tracker.dispatch(NativeEvent::BoundsChanged).unwrap();

    // The window's own events still publish; the group stays inert.
    assert!(!bus.changes_for(tracker.identity().uuid).is_empty());
    assert_eq!(*follower_win.bounds.lock(), Bounds::new(200, 0, 80, 80));
}
