//! Wire types for participants and cues.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::capability::Role;
use crate::id::ParticipantId;

/// Participant summary carried in events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantInfo {
    /// Unique identifier.
    pub id: ParticipantId,

    /// Display identity (user name or device label).
    pub identity: String,

    /// Current role.
    pub role: Role,

    /// Whether the participant is currently connected.
    pub connected: bool,
}

/// A directive broadcast to session participants.
///
/// Cues are ordered by `seq` within a session and never retracted
/// once appended to the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueMessage {
    /// Position in the session's cue log; the first cue is 1.
    pub seq: u64,

    /// Sender.
    pub from: ParticipantId,

    /// Directive text (e.g. "go to camera 2").
    pub text: String,

    /// Wall-clock send time.
    pub sent_at: DateTime<Utc>,
}
