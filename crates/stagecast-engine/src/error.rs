//! Error types for the lifecycle controller.

use thiserror::Error;

/// Errors the controller rejects synchronously.
///
/// Invalid transitions never change state; they are programmer errors
/// at the call site, surfaced to the operator as recoverable.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The operation is not defined from the current state.
    #[error("{operation} is not valid from the {state} state")]
    InvalidTransition {
        /// Operation that was attempted.
        operation: &'static str,

        /// State the controller was in.
        state: &'static str,
    },

    /// A device acquisition is still in flight.
    #[error("device acquisition already in flight")]
    AcquireInFlight,

    /// Fan-out was requested without a published room.
    #[error("no published room to fan out from")]
    NoPublishedRoom,

    /// The async runtime could not be built.
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
