use chrono::{DateTime, Utc};
use stagecast_core::{CueMessage, ParticipantId};

/// Append-only log of cue messages for one session.
///
/// Sequence numbers are assigned at append time and never reused, so any
/// two readers that sort by `seq` see the same history.
#[derive(Debug)]
pub struct CueLog {
    entries: Vec<CueMessage>,
    next_seq: u64,
}

impl Default for CueLog {
    fn default() -> Self {
        Self::new()
    }
}

impl CueLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 1,
        }
    }

    /// Appends a cue and returns the stamped message.
    pub fn append(
        &mut self,
        from: &ParticipantId,
        text: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> CueMessage {
        let cue = CueMessage {
            seq: self.next_seq,
            from: from.clone(),
            text: text.into(),
            sent_at,
        };
        self.next_seq += 1;
        self.entries.push(cue.clone());
        cue
    }

    pub fn entries(&self) -> &[CueMessage] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
