//! Destination records and fan-out reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ChannelId, DestinationId};

/// An outbound streaming target owned by a channel.
///
/// Destinations outlive any single session; `is_connected` and
/// `last_stream_at` reflect the most recent egress confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    /// Unique identifier.
    pub id: DestinationId,

    /// Owning channel.
    pub channel: ChannelId,

    /// Platform label shown in the UI (e.g. "twitch").
    pub platform: String,

    /// Ingest URL (rtmp or rtmps).
    pub url: String,

    /// Stream key appended at egress time.
    pub stream_key: String,

    /// Whether fan-out includes this destination.
    pub enabled: bool,

    /// Whether the latest egress to this destination confirmed success.
    pub is_connected: bool,

    /// When this destination last carried a stream.
    pub last_stream_at: Option<DateTime<Utc>>,
}

impl Destination {
    /// A new enabled destination for the channel.
    pub fn new(
        channel: ChannelId,
        platform: impl Into<String>,
        url: impl Into<String>,
        stream_key: impl Into<String>,
    ) -> Self {
        Self {
            id: DestinationId::new(),
            channel,
            platform: platform.into(),
            url: url.into(),
            stream_key: stream_key.into(),
            enabled: true,
            is_connected: false,
            last_stream_at: None,
        }
    }
}

/// One destination that failed to start during fan-out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanoutFailure {
    /// Destination that failed.
    pub destination: DestinationId,

    /// Failure description from the relay service.
    pub reason: String,
}

/// Aggregate result of a fan-out start.
///
/// Failures are recorded per destination and never abort the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FanoutReport {
    /// Destinations whose egress jobs confirmed start.
    pub started: Vec<DestinationId>,

    /// Destinations whose egress jobs failed to start.
    pub failed: Vec<FanoutFailure>,
}

impl FanoutReport {
    /// True when every enabled destination started.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
