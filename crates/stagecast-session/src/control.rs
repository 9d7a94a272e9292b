use std::collections::HashMap;
use std::time::{Duration, Instant};

use stagecast_core::{Capability, ParticipantId, RequestId, Role};
use tracing::debug;

use crate::error::SessionError;
use crate::SessionResult;

/// Capabilities that have a single owner and move between participants.
const EXCLUSIVE_CAPABILITIES: [Capability; 3] = [
    Capability::SwitchScene,
    Capability::ControlAudio,
    Capability::Publish,
];

/// Lifecycle of a control request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    Granted,
    Denied,
    Expired,
}

/// A participant asking for an exclusive capability.
#[derive(Debug, Clone)]
pub struct ControlRequest {
    pub id: RequestId,
    pub participant: ParticipantId,
    pub capability: Capability,
    pub state: RequestState,
    pub requested_at: Instant,
}

impl ControlRequest {
    fn expired(&self, expiry: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.requested_at) >= expiry
    }
}

/// Outcome of resolving a control request.
///
/// `holder` is the owner of the capability after resolution: the requester
/// when granted, the unchanged previous owner when denied.
#[derive(Debug, Clone)]
pub struct ResolvedControl {
    pub request: RequestId,
    pub participant: ParticipantId,
    pub capability: Capability,
    pub granted: bool,
    pub holder: Option<ParticipantId>,
}

/// Tracks who owns each exclusive capability and the open requests for them.
///
/// Ambient capabilities never appear in the owner map; they are answered
/// straight from the role tables. All mutation happens through `&mut self`,
/// so a grant and the matching ownership transfer are a single step.
pub struct ControlLedger {
    owners: HashMap<Capability, ParticipantId>,
    requests: Vec<ControlRequest>,
    expiry: Duration,
}

impl ControlLedger {
    /// Creates a ledger with every exclusive capability owned by the host.
    pub fn new(host: &ParticipantId, expiry: Duration) -> Self {
        let mut owners = HashMap::new();
        for capability in EXCLUSIVE_CAPABILITIES {
            owners.insert(capability, host.clone());
        }
        Self {
            owners,
            requests: Vec::new(),
            expiry,
        }
    }

    /// Current owner of an exclusive capability.
    pub fn owner(&self, capability: Capability) -> Option<&ParticipantId> {
        self.owners.get(&capability)
    }

    /// Exclusive capabilities currently owned by the participant.
    pub fn owned_by(&self, participant: &ParticipantId) -> Vec<Capability> {
        EXCLUSIVE_CAPABILITIES
            .into_iter()
            .filter(|capability| self.owners.get(capability) == Some(participant))
            .collect()
    }

    /// Whether the participant effectively holds the capability right now.
    ///
    /// Exclusive capabilities follow the owner map; everything else follows
    /// the participant's role table.
    pub fn holds(&self, participant: &ParticipantId, role: Role, capability: Capability) -> bool {
        if capability.is_exclusive() {
            self.owners.get(&capability) == Some(participant)
        } else {
            role.capabilities().has(capability.bit())
        }
    }

    pub fn get(&self, request: &RequestId) -> Option<&ControlRequest> {
        self.requests.iter().find(|r| &r.id == request)
    }

    /// Confirms a request is still pending, marking it expired if the
    /// window has lapsed. Returns the requester and capability so callers
    /// can run authority checks before resolving.
    pub fn peek_pending(
        &mut self,
        request: &RequestId,
        now: Instant,
    ) -> SessionResult<(ParticipantId, Capability)> {
        let expiry = self.expiry;
        let entry = self
            .requests
            .iter_mut()
            .find(|r| &r.id == request)
            .ok_or_else(|| SessionError::UnknownRequest(request.clone()))?;
        match entry.state {
            RequestState::Pending => {}
            RequestState::Expired => return Err(SessionError::RequestExpired(request.clone())),
            _ => return Err(SessionError::AlreadyResolved(request.clone())),
        }
        if entry.expired(expiry, now) {
            entry.state = RequestState::Expired;
            return Err(SessionError::RequestExpired(request.clone()));
        }
        Ok((entry.participant.clone(), entry.capability))
    }

    /// Opens a request for an exclusive capability.
    ///
    /// Returns the request id and whether a new request was created. Asking
    /// again while an earlier request is still pending hands back the
    /// existing id instead of queueing a duplicate.
    pub fn request(
        &mut self,
        participant: &ParticipantId,
        role: Role,
        capability: Capability,
        now: Instant,
    ) -> SessionResult<(RequestId, bool)> {
        if !capability.is_exclusive() {
            return Err(SessionError::NotTransferable(capability));
        }
        if self.holds(participant, role, capability) {
            return Err(SessionError::CapabilityAlreadyHeld {
                participant: participant.clone(),
                capability,
            });
        }
        if let Some(existing) = self.requests.iter().find(|r| {
            r.state == RequestState::Pending
                && !r.expired(self.expiry, now)
                && &r.participant == participant
                && r.capability == capability
        }) {
            debug!(request = %existing.id, "reusing pending control request");
            return Ok((existing.id.clone(), false));
        }

        let request = ControlRequest {
            id: RequestId::new(),
            participant: participant.clone(),
            capability,
            state: RequestState::Pending,
            requested_at: now,
        };
        let id = request.id.clone();
        self.requests.push(request);
        Ok((id, true))
    }

    /// Grants or denies a pending request.
    ///
    /// A grant rewrites the owner map in the same call, so the previous
    /// holder loses the capability the moment the requester gains it. Role
    /// checks are the caller's job; the ledger only enforces request state
    /// and expiry.
    pub fn resolve(
        &mut self,
        request: &RequestId,
        granted: bool,
        now: Instant,
    ) -> SessionResult<ResolvedControl> {
        let expiry = self.expiry;
        let entry = self
            .requests
            .iter_mut()
            .find(|r| &r.id == request)
            .ok_or_else(|| SessionError::UnknownRequest(request.clone()))?;

        match entry.state {
            RequestState::Pending => {}
            RequestState::Expired => return Err(SessionError::RequestExpired(request.clone())),
            _ => return Err(SessionError::AlreadyResolved(request.clone())),
        }
        if entry.expired(expiry, now) {
            entry.state = RequestState::Expired;
            return Err(SessionError::RequestExpired(request.clone()));
        }

        entry.state = if granted {
            RequestState::Granted
        } else {
            RequestState::Denied
        };
        let participant = entry.participant.clone();
        let capability = entry.capability;

        if granted {
            self.owners.insert(capability, participant.clone());
        }

        Ok(ResolvedControl {
            request: request.clone(),
            participant,
            capability,
            granted,
            holder: self.owners.get(&capability).cloned(),
        })
    }

    /// Marks pending requests past the expiry window and returns their ids.
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<RequestId> {
        let expiry = self.expiry;
        let mut expired = Vec::new();
        for request in &mut self.requests {
            if request.state == RequestState::Pending && request.expired(expiry, now) {
                request.state = RequestState::Expired;
                expired.push(request.id.clone());
            }
        }
        expired
    }

    /// Removes a departing participant from the ledger.
    ///
    /// Their exclusive capabilities revert to the host and their pending
    /// requests expire. Returns the reverted capabilities and the ids of
    /// the requests that were closed.
    pub fn forget_participant(
        &mut self,
        participant: &ParticipantId,
        host: &ParticipantId,
    ) -> (Vec<Capability>, Vec<RequestId>) {
        let mut reverted = Vec::new();
        for capability in EXCLUSIVE_CAPABILITIES {
            if self.owners.get(&capability) == Some(participant) {
                self.owners.insert(capability, host.clone());
                reverted.push(capability);
            }
        }

        let mut closed = Vec::new();
        for request in &mut self.requests {
            if request.state == RequestState::Pending && &request.participant == participant {
                request.state = RequestState::Expired;
                closed.push(request.id.clone());
            }
        }
        (reverted, closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY: Duration = Duration::from_millis(50);

    fn ledger_with_host() -> (ControlLedger, ParticipantId) {
        let host = ParticipantId::new();
        let ledger = ControlLedger::new(&host, EXPIRY);
        (ledger, host)
    }

    #[test]
    fn test_host_owns_exclusive_capabilities_initially() {
        let (ledger, host) = ledger_with_host();
        for capability in EXCLUSIVE_CAPABILITIES {
            assert_eq!(ledger.owner(capability), Some(&host));
        }
        assert!(ledger.holds(&host, Role::Host, Capability::Publish));
    }

    #[test]
    fn test_ambient_capability_is_not_transferable() {
        let (mut ledger, _host) = ledger_with_host();
        let guest = ParticipantId::new();
        let err = ledger
            .request(&guest, Role::Guest, Capability::SendCue, Instant::now())
            .unwrap_err();
        assert_eq!(err, SessionError::NotTransferable(Capability::SendCue));
    }

    #[test]
    fn test_request_while_holding_is_rejected() {
        let (mut ledger, host) = ledger_with_host();
        let err = ledger
            .request(&host, Role::Host, Capability::SwitchScene, Instant::now())
            .unwrap_err();
        assert!(matches!(err, SessionError::CapabilityAlreadyHeld { .. }));
    }

    #[test]
    fn test_duplicate_request_returns_existing_id() {
        let (mut ledger, _host) = ledger_with_host();
        let guest = ParticipantId::new();
        let now = Instant::now();
        let (first, created) = ledger
            .request(&guest, Role::Guest, Capability::SwitchScene, now)
            .unwrap();
        assert!(created);
        let (second, created) = ledger
            .request(&guest, Role::Guest, Capability::SwitchScene, now)
            .unwrap();
        assert!(!created);
        assert_eq!(first, second);
    }

    #[test]
    fn test_grant_moves_ownership_to_requester() {
        let (mut ledger, host) = ledger_with_host();
        let guest = ParticipantId::new();
        let now = Instant::now();
        let (id, _) = ledger
            .request(&guest, Role::Guest, Capability::SwitchScene, now)
            .unwrap();

        let resolved = ledger.resolve(&id, true, now).unwrap();
        assert!(resolved.granted);
        assert_eq!(resolved.holder.as_ref(), Some(&guest));
        assert!(ledger.holds(&guest, Role::Guest, Capability::SwitchScene));
        assert!(!ledger.holds(&host, Role::Host, Capability::SwitchScene));
        // audio was never requested and stays with the host
        assert_eq!(ledger.owner(Capability::ControlAudio), Some(&host));
    }

    #[test]
    fn test_deny_leaves_owner_in_place() {
        let (mut ledger, host) = ledger_with_host();
        let guest = ParticipantId::new();
        let now = Instant::now();
        let (id, _) = ledger
            .request(&guest, Role::Guest, Capability::ControlAudio, now)
            .unwrap();

        let resolved = ledger.resolve(&id, false, now).unwrap();
        assert!(!resolved.granted);
        assert_eq!(resolved.holder.as_ref(), Some(&host));
        assert!(!ledger.holds(&guest, Role::Guest, Capability::ControlAudio));
    }

    #[test]
    fn test_expired_request_cannot_be_granted() {
        let (mut ledger, host) = ledger_with_host();
        let guest = ParticipantId::new();
        let start = Instant::now();
        let (id, _) = ledger
            .request(&guest, Role::Guest, Capability::SwitchScene, start)
            .unwrap();

        let err = ledger.resolve(&id, true, start + EXPIRY).unwrap_err();
        assert_eq!(err, SessionError::RequestExpired(id.clone()));
        assert_eq!(ledger.owner(Capability::SwitchScene), Some(&host));
        assert_eq!(ledger.get(&id).unwrap().state, RequestState::Expired);
    }

    #[test]
    fn test_resolving_twice_is_rejected() {
        let (mut ledger, _host) = ledger_with_host();
        let guest = ParticipantId::new();
        let now = Instant::now();
        let (id, _) = ledger
            .request(&guest, Role::Guest, Capability::SwitchScene, now)
            .unwrap();
        ledger.resolve(&id, true, now).unwrap();
        let err = ledger.resolve(&id, false, now).unwrap_err();
        assert_eq!(err, SessionError::AlreadyResolved(id));
    }

    #[test]
    fn test_sweep_marks_pending_requests() {
        let (mut ledger, _host) = ledger_with_host();
        let guest = ParticipantId::new();
        let start = Instant::now();
        let (id, _) = ledger
            .request(&guest, Role::Guest, Capability::Publish, start)
            .unwrap();

        assert!(ledger.sweep_expired(start).is_empty());
        let expired = ledger.sweep_expired(start + EXPIRY);
        assert_eq!(expired, vec![id]);
    }

    #[test]
    fn test_departing_participant_reverts_to_host() {
        let (mut ledger, host) = ledger_with_host();
        let guest = ParticipantId::new();
        let now = Instant::now();
        let (switch, _) = ledger
            .request(&guest, Role::Guest, Capability::SwitchScene, now)
            .unwrap();
        ledger.resolve(&switch, true, now).unwrap();
        let (pending, _) = ledger
            .request(&guest, Role::Guest, Capability::Publish, now)
            .unwrap();

        let (reverted, closed) = ledger.forget_participant(&guest, &host);
        assert_eq!(reverted, vec![Capability::SwitchScene]);
        assert_eq!(closed, vec![pending]);
        assert_eq!(ledger.owner(Capability::SwitchScene), Some(&host));
    }
}
