//! Entity id newtypes.
//!
//! Every entity in the studio is addressed by a 12-character nanoid
//! wrapped in its own type so ids of different entities cannot be
//! swapped by accident.

use nanoid::nanoid;
use serde::{Deserialize, Serialize};

/// Generate a 12-character nanoid for entity ids.
pub fn generate_id() -> String {
    nanoid!(12)
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new random id.
            pub fn new() -> Self {
                Self(generate_id())
            }

            /// Borrow the id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

entity_id!(
    /// One production session, created on studio open.
    SessionId
);

entity_id!(
    /// The channel that owns destinations and profile settings.
    ChannelId
);

entity_id!(
    /// An operator in a collaborative session.
    ParticipantId
);

entity_id!(
    /// A capture or media input composited into scenes.
    SourceId
);

entity_id!(
    /// A named arrangement of sources.
    SceneId
);

entity_id!(
    /// A positioned visual element rendered over the program output.
    OverlayId
);

entity_id!(
    /// A triggerable soundboard clip.
    PadId
);

entity_id!(
    /// An outbound streaming target owned by the channel.
    DestinationId
);

entity_id!(
    /// A pending control handoff request.
    RequestId
);

entity_id!(
    /// One active relay job for a destination.
    EgressId
);

entity_id!(
    /// A single media track inside a local stream.
    TrackId
);

entity_id!(
    /// The name of a published room on the transport service.
    RoomName
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = SourceId::new();
        let b = SourceId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 12);
    }

    #[test]
    fn test_id_roundtrips_through_string() {
        let id = SceneId::from("scene-main");
        assert_eq!(id.to_string(), "scene-main");
        assert_eq!(SceneId::from(id.to_string()), id);
    }
}
