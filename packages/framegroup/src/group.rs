//! Group membership registry and transaction coordinator store.
//!
//! Docked windows form a group; one group member at a time may lead a move
//! transaction. This module owns both tables: ordered group membership and
//! the per-group leader. The store is an explicitly-owned object passed to
//! tracker constructors, not a module-level singleton; the `RwLock` inside
//! provides interior mutability only, never cross-thread contention - the
//! whole core runs single-threaded with run-to-completion handlers, so
//! last-writer-wins is the store's entire consistency model.
//!
//! End-of-transaction notifications are queued here and drained by the
//! embedding layer, which routes them to member trackers as
//! [`NativeEvent::EndGroupTransaction`](crate::tracker::NativeEvent).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::toolkit::WindowHandle;

// ============================================================================
// Identity Types
// ============================================================================

/// Stable identity of a tracked window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowIdentity {
    /// Process-unique window uuid.
    pub uuid: Uuid,
    /// Human-readable window name.
    pub name: String,
}

impl WindowIdentity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(uuid: Uuid, name: &str) -> Self {
        Self { uuid, name: name.to_string() }
    }
}

/// Identifier of a docking group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub Uuid);

/// What kind of actor initiated a group transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderKind {
    /// A user drag drives the leader.
    User,
    /// The animation subsystem drives the leader.
    Animation,
    /// A programmatic bounds change drives the leader.
    Api,
}

/// The elected leader of a group transaction.
///
/// At most one leader exists per group at any time; it is cleared when the
/// leader window's terminal event commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLeader {
    /// Leader window uuid.
    pub uuid: Uuid,
    /// Leader window name.
    pub name: String,
    /// How the transaction was initiated.
    pub kind: LeaderKind,
}

/// A group member as seen by the propagation algorithm: identity plus a live
/// toolkit handle.
#[derive(Clone)]
pub struct GroupMember {
    /// The member's identity.
    pub identity: WindowIdentity,
    /// Toolkit handle for reading and applying geometry.
    pub handle: Arc<dyn WindowHandle>,
}

impl std::fmt::Debug for GroupMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupMember").field("identity", &self.identity).finish()
    }
}

// ============================================================================
// Group Store
// ============================================================================

#[derive(Default)]
struct GroupStoreInner {
    /// Ordered membership per group.
    members: HashMap<GroupId, Vec<GroupMember>>,
    /// Reverse index: window uuid to group.
    window_groups: HashMap<Uuid, GroupId>,
    /// Current transaction leader per group.
    leaders: HashMap<GroupId, GroupLeader>,
    /// Groups with a pending end-of-transaction broadcast.
    pending_end_transactions: Vec<GroupId>,
}

/// Shared store for group membership and transaction leadership.
#[derive(Default)]
pub struct GroupStore {
    inner: RwLock<GroupStoreInner>,
}

impl GroupStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    // ========================================================================
    // Membership
    // ========================================================================

    /// Adds a window to a group, preserving registration order.
    ///
    /// A window belongs to at most one group; joining a new group leaves the
    /// previous one.
    pub fn join_group(&self, group: GroupId, member: GroupMember) {
        let mut inner = self.inner.write();
        let uuid = member.identity.uuid;
        if let Some(previous) = inner.window_groups.insert(uuid, group) {
            if previous != group {
                if let Some(list) = inner.members.get_mut(&previous) {
                    list.retain(|m| m.identity.uuid != uuid);
                }
            }
        }
        let list = inner.members.entry(group).or_default();
        if !list.iter().any(|m| m.identity.uuid == uuid) {
            list.push(member);
        }
    }

    /// Removes a window from its group, if any.
    pub fn leave_group(&self, uuid: Uuid) {
        let mut inner = self.inner.write();
        if let Some(group) = inner.window_groups.remove(&uuid) {
            if let Some(list) = inner.members.get_mut(&group) {
                list.retain(|m| m.identity.uuid != uuid);
            }
        }
    }

    /// The group a window belongs to, if any.
    #[must_use]
    pub fn group_of(&self, uuid: Uuid) -> Option<GroupId> {
        self.inner.read().window_groups.get(&uuid).copied()
    }

    /// The ordered members of a group. Empty when the group is unknown.
    #[must_use]
    pub fn members(&self, group: GroupId) -> Vec<GroupMember> {
        self.inner.read().members.get(&group).cloned().unwrap_or_default()
    }

    // ========================================================================
    // Leader Election
    // ========================================================================

    /// The current leader of a group, if a transaction is open.
    #[must_use]
    pub fn leader(&self, group: GroupId) -> Option<GroupLeader> {
        self.inner.read().leaders.get(&group).cloned()
    }

    /// Installs a transaction leader for a group. Last writer wins.
    pub fn set_leader(&self, group: GroupId, leader: GroupLeader) {
        tracing::debug!(
            group = %group.0,
            leader = %leader.name,
            kind = ?leader.kind,
            "group leader elected"
        );
        self.inner.write().leaders.insert(group, leader);
    }

    /// Clears a group's leader, ending its transaction.
    pub fn clear_group(&self, group: GroupId) {
        self.inner.write().leaders.remove(&group);
    }

    /// Queues an end-of-transaction broadcast for a group.
    pub fn notify_end_transaction(&self, group: GroupId) {
        self.inner.write().pending_end_transactions.push(group);
    }

    /// Drains queued end-of-transaction broadcasts.
    ///
    /// The embedding layer calls this after each handler runs to completion,
    /// delivers the notification to every member tracker, and then closes
    /// the transaction with [`clear_group`](Self::clear_group).
    #[must_use]
    pub fn take_end_transactions(&self) -> Vec<GroupId> {
        std::mem::take(&mut self.inner.write().pending_end_transactions)
    }
}

// ============================================================================
// Tests
// ============================================================================
