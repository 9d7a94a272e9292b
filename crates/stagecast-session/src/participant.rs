use stagecast_core::{ParticipantId, ParticipantInfo, Role};

/// A connected member of the session.
///
/// Participants are keyed by id; the identity string is the display name
/// supplied at join time and is never used for authorization.
#[derive(Debug, Clone)]
pub struct Participant {
    id: ParticipantId,
    identity: String,
    role: Role,
    connected: bool,
}

impl Participant {
    pub fn new(identity: impl Into<String>, role: Role) -> Self {
        Self {
            id: ParticipantId::new(),
            identity: identity.into(),
            role,
            connected: true,
        }
    }

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }

    pub fn to_info(&self) -> ParticipantInfo {
        ParticipantInfo {
            id: self.id.clone(),
            identity: self.identity.clone(),
            role: self.role,
            connected: self.connected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_participant_is_connected() {
        let p = Participant::new("alice", Role::Producer);
        assert!(p.is_connected());
        assert_eq!(p.role(), Role::Producer);
        assert_eq!(p.identity(), "alice");
    }

    #[test]
    fn test_info_mirrors_participant() {
        let p = Participant::new("bob", Role::Guest);
        let info = p.to_info();
        assert_eq!(&info.id, p.id());
        assert_eq!(info.role, Role::Guest);
        assert!(info.connected);
    }
}
