use stagecast_core::{Capability, ParticipantId, RequestId};
use thiserror::Error;

/// Errors that can occur inside a collaborative session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The participant id is not part of this session
    #[error("unknown participant: {0}")]
    UnknownParticipant(ParticipantId),

    /// The request id does not match any control request
    #[error("unknown control request: {0}")]
    UnknownRequest(RequestId),

    /// The control request was already granted or denied
    #[error("control request already resolved: {0}")]
    AlreadyResolved(RequestId),

    /// The control request sat unresolved past its expiry window
    #[error("control request expired: {0}")]
    RequestExpired(RequestId),

    /// The requester already holds the capability
    #[error("participant {participant} already holds {capability}")]
    CapabilityAlreadyHeld {
        participant: ParticipantId,
        capability: Capability,
    },

    /// The acting participant's role does not outrank the other party
    #[error("{actor} does not outrank {subject}")]
    InsufficientRole {
        actor: ParticipantId,
        subject: ParticipantId,
    },

    /// The capability is tied to a role and cannot change hands
    #[error("capability {0} is not transferable")]
    NotTransferable(Capability),

    /// The participant does not currently hold the capability
    #[error("participant {participant} is not authorized for {capability}")]
    NotAuthorized {
        participant: ParticipantId,
        capability: Capability,
    },

    /// The host cannot be demoted, kicked, or removed
    #[error("the host cannot be removed or demoted")]
    HostImmutable,
}
