//! Media cloud access for the studio.
//!
//! Three seams cover everything the studio needs from the outside world:
//! access tokens, publish connections into a room, and server-side egress
//! to external RTMP ingests. [`LocalMediaCloud`] implements all three
//! in-process.

mod error;
mod local;
mod service;

pub use error::TransportError;
pub use local::LocalMediaCloud;
pub use service::{
    validate_ingest_url, AccessToken, AccessTokenService, EgressService, PublishService,
    RoomHandle, TokenScope,
};

/// Default token lifetime in seconds.
pub const TOKEN_TTL_SECS: i64 = 600;

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;
