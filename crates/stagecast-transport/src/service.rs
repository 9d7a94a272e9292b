//! Service traits the studio talks to.
//!
//! A production deployment backs these with a real media cloud; tests and
//! local development use [`crate::LocalMediaCloud`]. The traits are async
//! because real implementations cross the network.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stagecast_core::{EgressId, RoomName};
use url::Url;

use crate::{TransportError, TransportResult};

/// What a minted token is allowed to do, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenScope {
    /// Room the token is bound to.
    pub room: RoomName,

    /// Participant identity the token names.
    pub identity: String,

    /// Whether the holder may publish media into the room.
    pub can_publish: bool,
}

impl TokenScope {
    /// A publish-capable scope for one room and identity.
    pub fn publisher(room: RoomName, identity: impl Into<String>) -> Self {
        Self {
            room,
            identity: identity.into(),
            can_publish: true,
        }
    }

    /// A subscribe-only scope.
    pub fn viewer(room: RoomName, identity: impl Into<String>) -> Self {
        Self {
            room,
            identity: identity.into(),
            can_publish: false,
        }
    }
}

/// A minted access token plus its validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    /// Opaque token string presented back to the service.
    pub token: String,

    /// What the token allows.
    pub scope: TokenScope,

    /// When the token was minted.
    pub issued_at: DateTime<Utc>,

    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Mints and verifies room-scoped access tokens.
#[async_trait]
pub trait AccessTokenService: Send + Sync {
    /// Mints a short-lived token for the scope.
    async fn issue(&self, scope: TokenScope) -> TransportResult<AccessToken>;

    /// Verifies a token string, returning the scope it grants.
    ///
    /// Tokens minted by a different service instance are rejected, as are
    /// expired ones.
    async fn verify(&self, token: &str) -> TransportResult<TokenScope>;
}

/// A live publish connection into a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomHandle {
    /// Connection id, unique per publish.
    pub id: String,

    /// Room being published into.
    pub room: RoomName,

    /// Identity the connection was opened under.
    pub identity: String,
}

/// Publishes local media into a room.
#[async_trait]
pub trait PublishService: Send + Sync {
    /// Opens a publish connection using a token from
    /// [`AccessTokenService::issue`].
    async fn publish(&self, token: &str) -> TransportResult<RoomHandle>;

    /// Closes the connection.
    async fn disconnect(&self, handle: &RoomHandle) -> TransportResult<()>;
}

/// Server-side restream of a room to an external RTMP(S) ingest.
#[async_trait]
pub trait EgressService: Send + Sync {
    /// Starts pushing the room's program output to the ingest URL.
    async fn start_egress(
        &self,
        room: &RoomName,
        url: &str,
        stream_key: &str,
    ) -> TransportResult<EgressId>;

    /// Stops a running egress.
    async fn stop_egress(&self, egress: &EgressId) -> TransportResult<()>;
}

/// Checks that a destination ingest URL is something an egress can push to.
pub fn validate_ingest_url(raw: &str) -> TransportResult<Url> {
    let url = Url::parse(raw).map_err(|e| TransportError::InvalidUrl(e.to_string()))?;
    match url.scheme() {
        "rtmp" | "rtmps" => {}
        other => {
            return Err(TransportError::InvalidUrl(format!(
                "unsupported scheme: {other}"
            )))
        }
    }
    if url.host_str().is_none() {
        return Err(TransportError::InvalidUrl("missing host".into()));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ingest_url_accepts_rtmp_and_rtmps() {
        assert!(validate_ingest_url("rtmp://live.example.com/app").is_ok());
        assert!(validate_ingest_url("rtmps://live.example.com:443/app").is_ok());
    }

    #[test]
    fn test_validate_ingest_url_rejects_other_schemes() {
        assert!(matches!(
            validate_ingest_url("https://example.com/live"),
            Err(TransportError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_ingest_url("not a url"),
            Err(TransportError::InvalidUrl(_))
        ));
    }
}
