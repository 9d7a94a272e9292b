//! Collaborative session state for a live studio.
//!
//! A session has one immutable host, a set of joined participants with
//! ranked roles, a ledger of exclusive capabilities that can be handed
//! between participants through request/grant, and an append-only cue log
//! fanned out to per-participant mailboxes.

mod control;
mod cue;
mod error;
mod participant;
mod session;

pub use control::{ControlLedger, ControlRequest, RequestState, ResolvedControl};
pub use cue::CueLog;
pub use error::SessionError;
pub use participant::Participant;
pub use session::{CollabSession, SessionExit};

/// Bounded capacity of each participant's cue mailbox.
pub const CUE_MAILBOX_CAPACITY: usize = 64;

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
