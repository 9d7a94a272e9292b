use chrono::{DateTime, Utc};
use stagecast_core::{DestinationId, EgressId};

/// State of one destination's egress job.
#[derive(Debug, Clone, PartialEq)]
pub enum EgressJobState {
    /// Start requested, not yet confirmed.
    Starting,

    /// The relay confirmed the push is running.
    Live,

    /// The start failed; the reason comes from the relay.
    Failed { reason: String },

    /// Stopped on request.
    Stopped,
}

impl EgressJobState {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// One destination's egress for the current live session.
#[derive(Debug, Clone)]
pub struct EgressJob {
    /// Destination being pushed to.
    pub destination: DestinationId,

    /// Relay-side egress id, present once the start was accepted.
    pub egress: Option<EgressId>,

    /// Current state.
    pub state: EgressJobState,

    /// When the start was requested.
    pub requested_at: DateTime<Utc>,
}

impl EgressJob {
    pub fn starting(destination: DestinationId) -> Self {
        Self {
            destination,
            egress: None,
            state: EgressJobState::Starting,
            requested_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_predicates() {
        assert!(EgressJobState::Live.is_live());
        assert!(!EgressJobState::Starting.is_live());
        assert!(EgressJobState::Failed {
            reason: "refused".into()
        }
        .is_failed());
        assert!(!EgressJobState::Stopped.is_failed());
    }

    #[test]
    fn test_new_job_is_starting() {
        let job = EgressJob::starting(DestinationId::new());
        assert_eq!(job.state, EgressJobState::Starting);
        assert!(job.egress.is_none());
    }
}
