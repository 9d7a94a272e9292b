use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossbeam_channel::{bounded, Receiver, Sender};
use stagecast_core::{Capability, CueMessage, ParticipantId, ParticipantInfo, RequestId, Role};
use tracing::{debug, instrument, warn};

use crate::control::{ControlLedger, ResolvedControl};
use crate::cue::CueLog;
use crate::error::SessionError;
use crate::participant::Participant;
use crate::{SessionResult, CUE_MAILBOX_CAPACITY};

/// What fell out of a participant leaving or being kicked.
#[derive(Debug, Clone)]
pub struct SessionExit {
    pub participant: ParticipantInfo,
    pub reverted: Vec<Capability>,
    pub expired_requests: Vec<RequestId>,
}

/// One collaborative session: the host, everyone who joined, the control
/// ledger, and the cue log.
///
/// All methods take `&mut self`; the owner serializes access, so a control
/// grant and the matching ownership change can never interleave with a
/// competing check.
pub struct CollabSession {
    host: ParticipantId,
    participants: HashMap<ParticipantId, Participant>,
    order: Vec<ParticipantId>,
    mailboxes: HashMap<ParticipantId, (Sender<CueMessage>, Receiver<CueMessage>)>,
    ledger: ControlLedger,
    cues: CueLog,
}

impl CollabSession {
    /// Starts a session with the given identity as host.
    ///
    /// The host owns every exclusive capability until a grant moves one.
    pub fn new(host_identity: impl Into<String>, request_expiry: Duration) -> Self {
        let host = Participant::new(host_identity, Role::Host);
        let host_id = host.id().clone();
        let ledger = ControlLedger::new(&host_id, request_expiry);

        let mut session = Self {
            host: host_id.clone(),
            participants: HashMap::new(),
            order: Vec::new(),
            mailboxes: HashMap::new(),
            ledger,
            cues: CueLog::new(),
        };
        session.mailboxes.insert(host_id.clone(), bounded(CUE_MAILBOX_CAPACITY));
        session.order.push(host_id.clone());
        session.participants.insert(host_id, host);
        session
    }

    pub fn host_id(&self) -> &ParticipantId {
        &self.host
    }

    pub fn host_info(&self) -> ParticipantInfo {
        self.participants[&self.host].to_info()
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Participants in join order, host first.
    pub fn participants(&self) -> Vec<ParticipantInfo> {
        self.order
            .iter()
            .filter_map(|id| self.participants.get(id).map(Participant::to_info))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Adds a participant. Only one host exists per session.
    #[instrument(name = "session_join", skip(self, identity))]
    pub fn join(&mut self, identity: impl Into<String>, role: Role) -> SessionResult<ParticipantInfo> {
        if role == Role::Host {
            return Err(SessionError::HostImmutable);
        }
        let participant = Participant::new(identity, role);
        let id = participant.id().clone();
        let info = participant.to_info();
        debug!(participant = %id, role = %role, "participant joined");

        self.mailboxes.insert(id.clone(), bounded(CUE_MAILBOX_CAPACITY));
        self.order.push(id.clone());
        self.participants.insert(id, participant);
        Ok(info)
    }

    /// Removes a participant at their own initiative.
    pub fn leave(&mut self, participant: &ParticipantId) -> SessionResult<SessionExit> {
        if participant == &self.host {
            return Err(SessionError::HostImmutable);
        }
        self.remove(participant)
    }

    /// Removes a participant on someone else's authority.
    ///
    /// The actor must strictly outrank the target, and the host can never
    /// be the target.
    #[instrument(name = "session_kick", skip(self))]
    pub fn kick(
        &mut self,
        actor: &ParticipantId,
        target: &ParticipantId,
    ) -> SessionResult<SessionExit> {
        if target == &self.host {
            return Err(SessionError::HostImmutable);
        }
        let actor_role = self.role_of(actor)?;
        let target_role = self.role_of(target)?;
        if !actor_role.out_ranks(target_role) {
            return Err(SessionError::InsufficientRole {
                actor: actor.clone(),
                subject: target.clone(),
            });
        }
        self.remove(target)
    }

    fn remove(&mut self, participant: &ParticipantId) -> SessionResult<SessionExit> {
        let mut removed = self
            .participants
            .remove(participant)
            .ok_or_else(|| SessionError::UnknownParticipant(participant.clone()))?;
        removed.mark_disconnected();
        self.order.retain(|id| id != participant);
        self.mailboxes.remove(participant);

        let (reverted, expired_requests) = self.ledger.forget_participant(participant, &self.host);
        if !reverted.is_empty() {
            debug!(participant = %participant, ?reverted, "capabilities reverted to host");
        }
        Ok(SessionExit {
            participant: removed.to_info(),
            reverted,
            expired_requests,
        })
    }

    fn role_of(&self, participant: &ParticipantId) -> SessionResult<Role> {
        self.participants
            .get(participant)
            .map(Participant::role)
            .ok_or_else(|| SessionError::UnknownParticipant(participant.clone()))
    }

    /// Whether the participant effectively holds the capability.
    pub fn holds(&self, participant: &ParticipantId, capability: Capability) -> bool {
        match self.role_of(participant) {
            Ok(role) => self.ledger.holds(participant, role, capability),
            Err(_) => false,
        }
    }

    /// Checks a privileged action against the current holder.
    pub fn authorize(
        &self,
        participant: &ParticipantId,
        capability: Capability,
    ) -> SessionResult<()> {
        let role = self.role_of(participant)?;
        if self.ledger.holds(participant, role, capability) {
            Ok(())
        } else {
            Err(SessionError::NotAuthorized {
                participant: participant.clone(),
                capability,
            })
        }
    }

    /// Current owner of an exclusive capability.
    pub fn capability_holder(&self, capability: Capability) -> Option<&ParticipantId> {
        self.ledger.owner(capability)
    }

    /// Opens (or re-surfaces) a control request for an exclusive capability.
    pub fn request_control(
        &mut self,
        participant: &ParticipantId,
        capability: Capability,
        now: Instant,
    ) -> SessionResult<(RequestId, bool)> {
        let role = self.role_of(participant)?;
        self.ledger.request(participant, role, capability, now)
    }

    /// Grants or denies a pending request on the resolver's authority.
    ///
    /// The resolver must hold grant-control and strictly outrank the
    /// requester. Expiry is checked before any authority question, so a
    /// stale request reports as expired no matter who answers it.
    #[instrument(name = "session_resolve", skip(self))]
    pub fn resolve_request(
        &mut self,
        resolver: &ParticipantId,
        request: &RequestId,
        granted: bool,
        now: Instant,
    ) -> SessionResult<ResolvedControl> {
        let (requester, _capability) = self.ledger.peek_pending(request, now)?;
        let resolver_role = self.role_of(resolver)?;
        self.ledger
            .holds(resolver, resolver_role, Capability::GrantControl)
            .then_some(())
            .ok_or_else(|| SessionError::NotAuthorized {
                participant: resolver.clone(),
                capability: Capability::GrantControl,
            })?;
        let requester_role = self.role_of(&requester)?;
        if !resolver_role.out_ranks(requester_role) {
            return Err(SessionError::InsufficientRole {
                actor: resolver.clone(),
                subject: requester,
            });
        }
        self.ledger.resolve(request, granted, now)
    }

    /// Expires stale pending requests, returning their ids.
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<RequestId> {
        self.ledger.sweep_expired(now)
    }

    /// Appends a cue to the log and fans it out to every mailbox.
    ///
    /// Delivery order matches log order because the append and the sends
    /// happen under the same borrow. A full mailbox drops the cue for that
    /// reader only; the log itself never loses entries.
    pub fn send_cue(
        &mut self,
        from: &ParticipantId,
        text: impl Into<String>,
    ) -> SessionResult<CueMessage> {
        self.authorize(from, Capability::SendCue)?;
        let cue = self.cues.append(from, text, Utc::now());
        for id in &self.order {
            if let Some((tx, _)) = self.mailboxes.get(id) {
                if tx.try_send(cue.clone()).is_err() {
                    warn!(participant = %id, seq = cue.seq, "cue mailbox full, dropping");
                }
            }
        }
        Ok(cue)
    }

    /// Receiver half of a participant's cue mailbox.
    pub fn cue_mailbox(&self, participant: &ParticipantId) -> Option<Receiver<CueMessage>> {
        self.mailboxes.get(participant).map(|(_, rx)| rx.clone())
    }

    pub fn cue_log(&self) -> &[CueMessage] {
        self.cues.entries()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPIRY: Duration = Duration::from_secs(30);

    fn session() -> CollabSession {
        CollabSession::new("host", EXPIRY)
    }

    #[test]
    fn test_host_owns_exclusives_at_start() {
        let s = session();
        let host = s.host_id().clone();
        assert!(s.holds(&host, Capability::SwitchScene));
        assert!(s.holds(&host, Capability::ControlAudio));
        assert!(s.holds(&host, Capability::Publish));
        assert_eq!(s.participants().len(), 1);
        assert_eq!(s.host_info().role, Role::Host);
    }

    #[test]
    fn test_second_host_is_rejected() {
        let mut s = session();
        assert_eq!(s.join("usurper", Role::Host).unwrap_err(), SessionError::HostImmutable);
    }

    #[test]
    fn test_grant_scenario_transfers_switch_control() {
        let mut s = session();
        let host = s.host_id().clone();
        let guest = s.join("guest", Role::Guest).unwrap().id;
        let now = Instant::now();

        // guest cannot switch scenes on role alone
        assert!(s.authorize(&guest, Capability::SwitchScene).is_err());

        let (request, created) = s
            .request_control(&guest, Capability::SwitchScene, now)
            .unwrap();
        assert!(created);
        let resolved = s.resolve_request(&host, &request, true, now).unwrap();
        assert!(resolved.granted);
        assert_eq!(resolved.holder.as_ref(), Some(&guest));

        // exactly one holder at a time
        assert!(s.authorize(&guest, Capability::SwitchScene).is_ok());
        assert!(matches!(
            s.authorize(&host, Capability::SwitchScene),
            Err(SessionError::NotAuthorized { .. })
        ));
    }

    #[test]
    fn test_resolver_must_strictly_outrank() {
        let mut s = session();
        let producer_a = s.join("prod-a", Role::Producer).unwrap().id;
        let producer_b = s.join("prod-b", Role::Producer).unwrap().id;
        let now = Instant::now();

        let (request, _) = s
            .request_control(&producer_a, Capability::SwitchScene, now)
            .unwrap();
        let err = s
            .resolve_request(&producer_b, &request, true, now)
            .unwrap_err();
        assert!(matches!(err, SessionError::InsufficientRole { .. }));
    }

    #[test]
    fn test_resolver_needs_grant_control() {
        let mut s = session();
        let cohost = s.join("wing", Role::CoHost).unwrap().id;
        let guest = s.join("guest", Role::Guest).unwrap().id;
        let now = Instant::now();

        let (request, _) = s.request_control(&guest, Capability::Publish, now).unwrap();
        let err = s.resolve_request(&cohost, &request, true, now).unwrap_err();
        assert!(matches!(
            err,
            SessionError::NotAuthorized {
                capability: Capability::GrantControl,
                ..
            }
        ));
    }

    #[test]
    fn test_guest_cannot_send_cue() {
        let mut s = session();
        let guest = s.join("guest", Role::Guest).unwrap().id;
        assert!(matches!(
            s.send_cue(&guest, "hi"),
            Err(SessionError::NotAuthorized { .. })
        ));
        assert!(s.cue_log().is_empty());
    }

    #[test]
    fn test_cues_arrive_in_log_order_everywhere() {
        let mut s = session();
        let host = s.host_id().clone();
        let cohost = s.join("wing", Role::CoHost).unwrap().id;
        let producer = s.join("prod", Role::Producer).unwrap().id;

        s.send_cue(&host, "standby").unwrap();
        s.send_cue(&cohost, "camera two").unwrap();
        s.send_cue(&producer, "go").unwrap();

        for id in [&host, &cohost, &producer] {
            let rx = s.cue_mailbox(id).unwrap();
            let seqs: Vec<u64> = rx.try_iter().map(|c| c.seq).collect();
            assert_eq!(seqs, vec![1, 2, 3], "mailbox out of order for {id}");
        }
        assert_eq!(s.cue_log().len(), 3);
    }

    #[test]
    fn test_leave_reverts_capabilities_to_host() {
        let mut s = session();
        let host = s.host_id().clone();
        let cohost = s.join("wing", Role::CoHost).unwrap().id;
        let now = Instant::now();

        let (request, _) = s
            .request_control(&cohost, Capability::ControlAudio, now)
            .unwrap();
        s.resolve_request(&host, &request, true, now).unwrap();
        assert_eq!(s.capability_holder(Capability::ControlAudio), Some(&cohost));

        let exit = s.leave(&cohost).unwrap();
        assert_eq!(exit.reverted, vec![Capability::ControlAudio]);
        assert_eq!(s.capability_holder(Capability::ControlAudio), Some(&host));
        assert!(s.participant(&cohost).is_none());
        assert!(s.cue_mailbox(&cohost).is_none());
    }

    #[test]
    fn test_kick_requires_strictly_higher_rank() {
        let mut s = session();
        let producer = s.join("prod", Role::Producer).unwrap().id;
        let guest = s.join("guest", Role::Guest).unwrap().id;

        assert!(matches!(
            s.kick(&guest, &producer),
            Err(SessionError::InsufficientRole { .. })
        ));
        let exit = s.kick(&producer, &guest).unwrap();
        assert_eq!(exit.participant.id, guest);
        assert!(s.participant(&guest).is_none());
    }

    #[test]
    fn test_host_cannot_leave_or_be_kicked() {
        let mut s = session();
        let host = s.host_id().clone();
        let producer = s.join("prod", Role::Producer).unwrap().id;

        assert_eq!(s.leave(&host).unwrap_err(), SessionError::HostImmutable);
        assert_eq!(s.kick(&producer, &host).unwrap_err(), SessionError::HostImmutable);
    }
}
