//! In-process media cloud.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use nanoid::nanoid;
use parking_lot::Mutex;
use stagecast_core::{EgressId, RoomName};
use tracing::{debug, info};

use crate::service::{
    validate_ingest_url, AccessToken, AccessTokenService, EgressService, PublishService,
    RoomHandle, TokenScope,
};
use crate::{TransportError, TransportResult, TOKEN_TTL_SECS};

struct IssuedToken {
    scope: TokenScope,
    expires_at: DateTime<Utc>,
}

struct EgressRecord {
    room: RoomName,
    url: String,
}

/// Media cloud that lives entirely in this process.
///
/// Tokens, publish connections, and egress jobs are plain maps, so the
/// whole studio can run without network access. The failure switches let
/// tests drive the error paths a real deployment would hit.
pub struct LocalMediaCloud {
    tokens: Mutex<HashMap<String, IssuedToken>>,
    connections: Mutex<HashMap<String, RoomHandle>>,
    egresses: Mutex<HashMap<EgressId, EgressRecord>>,
    fail_publish: Mutex<Option<String>>,
    fail_egress_matching: Mutex<Vec<String>>,
    token_ttl: ChronoDuration,
}

impl LocalMediaCloud {
    pub fn new() -> Self {
        Self::with_token_ttl(TOKEN_TTL_SECS)
    }

    /// A cloud whose tokens live for the given number of seconds.
    /// Negative values mint already-expired tokens, which tests use.
    pub fn with_token_ttl(ttl_secs: i64) -> Self {
        Self {
            tokens: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            egresses: Mutex::new(HashMap::new()),
            fail_publish: Mutex::new(None),
            fail_egress_matching: Mutex::new(Vec::new()),
            token_ttl: ChronoDuration::seconds(ttl_secs),
        }
    }

    /// Makes every publish attempt fail with the reason until cleared.
    pub fn set_fail_publish(&self, reason: Option<&str>) {
        *self.fail_publish.lock() = reason.map(String::from);
    }

    /// Makes egress starts fail for any ingest URL containing the pattern.
    pub fn fail_egress_containing(&self, pattern: impl Into<String>) {
        self.fail_egress_matching.lock().push(pattern.into());
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn egress_count(&self) -> usize {
        self.egresses.lock().len()
    }

    pub fn is_egress_running(&self, egress: &EgressId) -> bool {
        self.egresses.lock().contains_key(egress)
    }

    /// Rooms currently being egressed, for assertions in tests.
    pub fn egress_rooms(&self) -> Vec<RoomName> {
        self.egresses
            .lock()
            .values()
            .map(|record| record.room.clone())
            .collect()
    }
}

impl Default for LocalMediaCloud {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccessTokenService for LocalMediaCloud {
    async fn issue(&self, scope: TokenScope) -> TransportResult<AccessToken> {
        let now = Utc::now();
        let token = format!("tok_{}", nanoid!(32));
        self.tokens.lock().insert(
            token.clone(),
            IssuedToken {
                scope: scope.clone(),
                expires_at: now + self.token_ttl,
            },
        );
        debug!(room = %scope.room, identity = %scope.identity, "token minted");
        Ok(AccessToken {
            token,
            scope,
            issued_at: now,
            expires_at: now + self.token_ttl,
        })
    }

    async fn verify(&self, token: &str) -> TransportResult<TokenScope> {
        let mut tokens = self.tokens.lock();
        let issued = tokens
            .get(token)
            .ok_or_else(|| TransportError::InvalidToken("unknown token".into()))?;
        if issued.expires_at <= Utc::now() {
            tokens.remove(token);
            return Err(TransportError::TokenExpired);
        }
        Ok(issued.scope.clone())
    }
}

#[async_trait]
impl PublishService for LocalMediaCloud {
    async fn publish(&self, token: &str) -> TransportResult<RoomHandle> {
        let scope = self.verify(token).await?;
        if !scope.can_publish {
            return Err(TransportError::PermissionDenied(format!(
                "token for {} is subscribe-only",
                scope.identity
            )));
        }
        if let Some(reason) = self.fail_publish.lock().clone() {
            return Err(TransportError::Unavailable(reason));
        }

        let mut connections = self.connections.lock();
        let duplicate = connections
            .values()
            .any(|h| h.room == scope.room && h.identity == scope.identity);
        if duplicate {
            return Err(TransportError::AlreadyConnected);
        }

        let handle = RoomHandle {
            id: nanoid!(12),
            room: scope.room.clone(),
            identity: scope.identity.clone(),
        };
        connections.insert(handle.id.clone(), handle.clone());
        info!(room = %handle.room, identity = %handle.identity, "publish connected");
        Ok(handle)
    }

    async fn disconnect(&self, handle: &RoomHandle) -> TransportResult<()> {
        if self.connections.lock().remove(&handle.id).is_none() {
            return Err(TransportError::NotConnected);
        }
        info!(room = %handle.room, "publish disconnected");
        Ok(())
    }
}

#[async_trait]
impl EgressService for LocalMediaCloud {
    async fn start_egress(
        &self,
        room: &RoomName,
        url: &str,
        _stream_key: &str,
    ) -> TransportResult<EgressId> {
        validate_ingest_url(url)?;
        let refused = self
            .fail_egress_matching
            .lock()
            .iter()
            .any(|pattern| url.contains(pattern.as_str()));
        if refused {
            return Err(TransportError::Unavailable(format!(
                "egress refused for {url}"
            )));
        }

        let id = EgressId::new();
        self.egresses.lock().insert(
            id.clone(),
            EgressRecord {
                room: room.clone(),
                url: url.to_string(),
            },
        );
        info!(egress = %id, room = %room, url, "egress started");
        Ok(id)
    }

    async fn stop_egress(&self, egress: &EgressId) -> TransportResult<()> {
        if self.egresses.lock().remove(egress).is_none() {
            return Err(TransportError::UnknownEgress(egress.clone()));
        }
        info!(egress = %egress, "egress stopped");
        Ok(())
    }
}
