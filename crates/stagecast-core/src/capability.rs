//! Roles and capability bits for collaborative control.
//!
//! Each role carries a fixed capability table; the tables form a strict
//! hierarchy (host over producer over co-host over guest). Exclusive
//! capabilities additionally have a single owner at session level, which
//! can be handed off via control requests.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single controllable capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    /// Move the program cursor between scenes.
    SwitchScene,

    /// Change faders, mutes, and strip processing.
    ControlAudio,

    /// Send cue messages to participants.
    SendCue,

    /// Resolve control requests from lower-ranked participants.
    GrantControl,

    /// Start and stop the published room.
    Publish,
}

impl Capability {
    /// The bitmask bit for this capability.
    pub const fn bit(self) -> u64 {
        match self {
            Self::SwitchScene => CapabilitySet::SWITCH_SCENE,
            Self::ControlAudio => CapabilitySet::CONTROL_AUDIO,
            Self::SendCue => CapabilitySet::SEND_CUE,
            Self::GrantControl => CapabilitySet::GRANT_CONTROL,
            Self::Publish => CapabilitySet::PUBLISH,
        }
    }

    /// Whether this capability has a single session-level owner.
    ///
    /// Exclusive capabilities are transferable via control requests;
    /// the others are ambient to the holder's role.
    pub const fn is_exclusive(self) -> bool {
        matches!(self, Self::SwitchScene | Self::ControlAudio | Self::Publish)
    }

    /// Display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SwitchScene => "switch-scene",
            Self::ControlAudio => "control-audio",
            Self::SendCue => "send-cue",
            Self::GrantControl => "grant-control",
            Self::Publish => "publish",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// 64-bit capability bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(pub u64);

impl CapabilitySet {
    /// Move the program cursor between scenes.
    pub const SWITCH_SCENE: u64 = 1 << 0;

    /// Change faders, mutes, and strip processing.
    pub const CONTROL_AUDIO: u64 = 1 << 1;

    /// Send cue messages.
    pub const SEND_CUE: u64 = 1 << 2;

    /// Resolve control requests.
    pub const GRANT_CONTROL: u64 = 1 << 3;

    /// Start and stop the published room.
    pub const PUBLISH: u64 = 1 << 4;

    /// No capabilities.
    pub const NONE: u64 = 0;

    /// Every capability (host table).
    pub const ALL: u64 = Self::SWITCH_SCENE
        | Self::CONTROL_AUDIO
        | Self::SEND_CUE
        | Self::GRANT_CONTROL
        | Self::PUBLISH;

    /// Producer table: everything except publish.
    pub const PRODUCER: u64 =
        Self::SWITCH_SCENE | Self::CONTROL_AUDIO | Self::SEND_CUE | Self::GRANT_CONTROL;

    /// Co-host table: on-air control without granting rights.
    pub const CO_HOST: u64 = Self::SWITCH_SCENE | Self::CONTROL_AUDIO | Self::SEND_CUE;

    /// Guest table: no ambient capabilities.
    pub const GUEST: u64 = Self::NONE;

    /// Create a set from raw bits.
    pub const fn new(bits: u64) -> Self {
        Self(bits)
    }

    /// The empty set.
    pub const fn empty() -> Self {
        Self(Self::NONE)
    }

    /// Check for a specific capability bit.
    pub const fn has(&self, capability: u64) -> bool {
        (self.0 & capability) != 0
    }

    /// Check that every bit in `capabilities` is present.
    pub const fn has_all(&self, capabilities: u64) -> bool {
        (self.0 & capabilities) == capabilities
    }

    /// Add capability bits.
    pub fn grant(&mut self, capability: u64) {
        self.0 |= capability;
    }

    /// Remove capability bits.
    pub fn revoke(&mut self, capability: u64) {
        self.0 &= !capability;
    }
}

impl Default for CapabilitySet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Participant role in a collaborative session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// Session owner; holds every capability and is never revocable.
    Host,

    /// Runs the show on the host's behalf.
    Producer,

    /// On-air operator with scene and audio control.
    CoHost,

    /// Invited talent with no ambient capabilities.
    Guest,
}

impl Role {
    /// Fixed capability table for this role.
    pub const fn capabilities(self) -> CapabilitySet {
        match self {
            Self::Host => CapabilitySet(CapabilitySet::ALL),
            Self::Producer => CapabilitySet(CapabilitySet::PRODUCER),
            Self::CoHost => CapabilitySet(CapabilitySet::CO_HOST),
            Self::Guest => CapabilitySet(CapabilitySet::GUEST),
        }
    }

    /// Position in the role hierarchy; higher outranks lower.
    pub const fn rank(self) -> u8 {
        match self {
            Self::Host => 3,
            Self::Producer => 2,
            Self::CoHost => 1,
            Self::Guest => 0,
        }
    }

    /// Strictly outranks the other role.
    pub const fn out_ranks(self, other: Role) -> bool {
        self.rank() > other.rank()
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" => Ok(Self::Host),
            "producer" => Ok(Self::Producer),
            "co-host" | "cohost" => Ok(Self::CoHost),
            "guest" => Ok(Self::Guest),
            _ => Err(format!("Unknown role: {s}")),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Host => write!(f, "host"),
            Self::Producer => write!(f, "producer"),
            Self::CoHost => write!(f, "co-host"),
            Self::Guest => write!(f, "guest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_has() {
        let set = CapabilitySet(CapabilitySet::SWITCH_SCENE);
        assert!(set.has(CapabilitySet::SWITCH_SCENE));
        assert!(!set.has(CapabilitySet::PUBLISH));
    }

    #[test]
    fn test_capability_grant_revoke() {
        let mut set = CapabilitySet::empty();
        set.grant(CapabilitySet::SEND_CUE);
        set.grant(CapabilitySet::CONTROL_AUDIO);

        assert!(set.has(CapabilitySet::SEND_CUE));
        assert!(set.has(CapabilitySet::CONTROL_AUDIO));

        set.revoke(CapabilitySet::SEND_CUE);
        assert!(!set.has(CapabilitySet::SEND_CUE));
        assert!(set.has(CapabilitySet::CONTROL_AUDIO));
    }

    #[test]
    fn test_role_tables_form_a_hierarchy() {
        let host = Role::Host.capabilities();
        let producer = Role::Producer.capabilities();
        let co_host = Role::CoHost.capabilities();
        let guest = Role::Guest.capabilities();

        assert!(host.has_all(producer.0));
        assert!(producer.has_all(co_host.0));
        assert!(co_host.has_all(guest.0));

        assert!(host.has(CapabilitySet::PUBLISH));
        assert!(!producer.has(CapabilitySet::PUBLISH));
        assert!(!co_host.has(CapabilitySet::GRANT_CONTROL));
        assert!(!guest.has(CapabilitySet::SEND_CUE));
    }

    #[test]
    fn test_role_ranks() {
        assert!(Role::Host.out_ranks(Role::Producer));
        assert!(Role::Producer.out_ranks(Role::CoHost));
        assert!(Role::CoHost.out_ranks(Role::Guest));
        assert!(!Role::Guest.out_ranks(Role::Guest));
        assert!(!Role::Guest.out_ranks(Role::Host));
    }

    #[test]
    fn test_exclusive_capabilities() {
        assert!(Capability::SwitchScene.is_exclusive());
        assert!(Capability::ControlAudio.is_exclusive());
        assert!(Capability::Publish.is_exclusive());
        assert!(!Capability::SendCue.is_exclusive());
        assert!(!Capability::GrantControl.is_exclusive());
    }
}
