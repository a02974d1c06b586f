//! Configuration surface for group tracking.
//!
//! A process-wide [`TrackingConfig`] controls whether frame-group handling is
//! active at all and which per-leader-type propagation behaviors are
//! suppressed. The config is plain data, deserializable from the embedding
//! application's settings file.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Group-tracking behaviors that can be disabled individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBehavior {
    /// Suppress grouped-resize propagation (shared-edge follower resizing).
    Resize,
    /// Suppress propagation for api-initiated group leaders.
    Api,
}

/// Process-wide tracking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackingConfig {
    /// Whether frame-group handling is enabled at all. When `false`, grouped
    /// windows still dispatch their own events but never move one another.
    pub frame_groups_enabled: bool,
    /// Behaviors excluded from group propagation.
    pub disabled_behaviors: HashSet<GroupBehavior>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            frame_groups_enabled: true,
            disabled_behaviors: HashSet::new(),
        }
    }
}

impl TrackingConfig {
    /// Whether a behavior is disabled.
    #[must_use]
    pub fn is_disabled(&self, behavior: GroupBehavior) -> bool {
        self.disabled_behaviors.contains(&behavior)
    }
}
