//! Studio configuration.

use serde::{Deserialize, Serialize};

use crate::compose::TransitionKind;

/// Configuration for a studio session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagecastConfig {
    /// Hard timeout for device acquisition in milliseconds (default: 5000).
    pub acquire_timeout_ms: u64,

    /// How long a control request stays pending before it expires.
    pub request_expiry_ms: u64,

    /// Cadence for meter snapshot events in milliseconds.
    pub meter_interval_ms: u64,

    /// Transition used when none is configured per switch.
    pub default_transition: TransitionKind,

    /// Duration of non-cut transitions in milliseconds.
    pub transition_duration_ms: u64,

    /// Fader multiplier applied to other strips while a ducking pad plays.
    pub duck_attenuation: f32,

    /// Start fan-out automatically once the room is published.
    pub auto_fanout: bool,
}

impl Default for StagecastConfig {
    fn default() -> Self {
        Self {
            acquire_timeout_ms: 5000,
            request_expiry_ms: 30_000,
            meter_interval_ms: 100,
            default_transition: TransitionKind::Fade,
            transition_duration_ms: 300,
            duck_attenuation: 0.2,
            auto_fanout: true,
        }
    }
}
