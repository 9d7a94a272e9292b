//! Stream lifecycle state machine types.

use serde::{Deserialize, Serialize};

/// The current state of the stream lifecycle controller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum LifecycleState {
    /// No devices held, nothing on air.
    #[default]
    Idle,

    /// Local devices acquired, preview running, not published.
    Previewing,

    /// Publish to the room is in flight.
    Connecting,

    /// Room published, program output on air.
    Live,

    /// Device or acquisition failure; requires an explicit reset.
    Error {
        /// Failure description.
        message: String,
    },
}

impl LifecycleState {
    /// Returns true if the controller is idle.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns true if a local preview is running.
    pub fn is_previewing(&self) -> bool {
        matches!(self, Self::Previewing)
    }

    /// Returns true if a publish is in flight.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Returns true if the session is live.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Returns true if the controller is in the error state.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Returns true if the controller holds a local stream in this state.
    pub fn holds_stream(&self) -> bool {
        matches!(self, Self::Previewing | Self::Connecting | Self::Live)
    }

    /// Returns a simple string representation of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Previewing => "Previewing",
            Self::Connecting => "Connecting",
            Self::Live => "Live",
            Self::Error { .. } => "Error",
        }
    }
}
