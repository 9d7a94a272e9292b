//! Persistence contracts for channel-owned records.
//!
//! The engine only needs simple get/set access to destinations and
//! channel profiles; real deployments back these traits with the
//! platform's storage, tests and local runs use the in-memory
//! implementations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::compose::TransitionKind;
use crate::destination::Destination;
use crate::id::{ChannelId, DestinationId};

/// Channel-level studio settings that outlive a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    /// Transition used when switching scenes.
    pub default_transition: TransitionKind,

    /// Duration of non-cut transitions in milliseconds.
    pub transition_duration_ms: u64,

    /// Start fan-out automatically once the room is published.
    pub auto_fanout: bool,
}

impl Default for ChannelProfile {
    fn default() -> Self {
        Self {
            default_transition: TransitionKind::Fade,
            transition_duration_ms: 300,
            auto_fanout: true,
        }
    }
}

/// Read/write access to a channel's destinations.
pub trait DestinationStore: Send + Sync {
    /// All destinations owned by the channel.
    fn destinations(&self, channel: &ChannelId) -> Vec<Destination>;

    /// Look up one destination.
    fn get(&self, id: &DestinationId) -> Option<Destination>;

    /// Insert or replace a destination.
    fn upsert(&self, destination: Destination);

    /// Flip the enabled flag. Returns false if the destination is unknown.
    fn set_enabled(&self, id: &DestinationId, enabled: bool) -> bool;

    /// Record a confirmed egress: connected now, streamed at `at`.
    fn mark_connected(&self, id: &DestinationId, at: DateTime<Utc>) -> bool;

    /// Clear the connected flag after egress stops.
    fn mark_disconnected(&self, id: &DestinationId) -> bool;

    /// Destinations that participate in fan-out.
    fn enabled_destinations(&self, channel: &ChannelId) -> Vec<Destination> {
        self.destinations(channel)
            .into_iter()
            .filter(|d| d.enabled)
            .collect()
    }
}

/// Read/write access to channel profiles.
pub trait ProfileStore: Send + Sync {
    /// The channel's profile, or the defaults when none is stored.
    fn profile(&self, channel: &ChannelId) -> ChannelProfile;

    /// Store the channel's profile.
    fn set_profile(&self, channel: &ChannelId, profile: ChannelProfile);
}

/// In-memory destination store.
#[derive(Default)]
pub struct InMemoryDestinationStore {
    inner: RwLock<HashMap<DestinationId, Destination>>,
}

impl InMemoryDestinationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DestinationStore for InMemoryDestinationStore {
    fn destinations(&self, channel: &ChannelId) -> Vec<Destination> {
        let mut list: Vec<Destination> = self
            .inner
            .read()
            .values()
            .filter(|d| &d.channel == channel)
            .cloned()
            .collect();
        // Stable listing order for UI and tests.
        list.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        list
    }

    fn get(&self, id: &DestinationId) -> Option<Destination> {
        self.inner.read().get(id).cloned()
    }

    fn upsert(&self, destination: Destination) {
        self.inner
            .write()
            .insert(destination.id.clone(), destination);
    }

    fn set_enabled(&self, id: &DestinationId, enabled: bool) -> bool {
        match self.inner.write().get_mut(id) {
            Some(destination) => {
                destination.enabled = enabled;
                true
            }
            None => false,
        }
    }

    fn mark_connected(&self, id: &DestinationId, at: DateTime<Utc>) -> bool {
        match self.inner.write().get_mut(id) {
            Some(destination) => {
                destination.is_connected = true;
                destination.last_stream_at = Some(at);
                true
            }
            None => false,
        }
    }

    fn mark_disconnected(&self, id: &DestinationId) -> bool {
        match self.inner.write().get_mut(id) {
            Some(destination) => {
                destination.is_connected = false;
                true
            }
            None => false,
        }
    }
}

/// In-memory profile store.
#[derive(Default)]
pub struct InMemoryProfileStore {
    inner: RwLock<HashMap<ChannelId, ChannelProfile>>,
}

impl InMemoryProfileStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn profile(&self, channel: &ChannelId) -> ChannelProfile {
        self.inner.read().get(channel).cloned().unwrap_or_default()
    }

    fn set_profile(&self, channel: &ChannelId, profile: ChannelProfile) {
        self.inner.write().insert(channel.clone(), profile);
    }
}
