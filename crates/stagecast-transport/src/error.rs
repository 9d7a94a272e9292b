//! Error types for media cloud access.

use stagecast_core::EgressId;
use thiserror::Error;

/// Errors that can occur talking to the media cloud.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransportError {
    /// The token is unknown to this service or malformed.
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// The token's lifetime has passed.
    #[error("Access token expired")]
    TokenExpired,

    /// The token does not allow the attempted operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// This identity is already publishing to the room.
    #[error("Already connected")]
    AlreadyConnected,

    /// No such connection.
    #[error("Not connected")]
    NotConnected,

    /// The ingest URL is not a usable RTMP(S) endpoint.
    #[error("Invalid RTMP URL: {0}")]
    InvalidUrl(String),

    /// No egress with this id is running.
    #[error("Unknown egress: {0}")]
    UnknownEgress(EgressId),

    /// The service refused or dropped the request.
    #[error("Service unavailable: {0}")]
    Unavailable(String),
}
