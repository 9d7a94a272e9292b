//! MIDI bindings.
//!
//! Messages are keyed by kind, number, and channel; the data value rides
//! along to whatever action the binding names. Learn mode captures the
//! next message seen and binds it to the armed action.

use std::collections::HashMap;

use stagecast_core::{MidiAction, MidiKind, MidiMessage};
use tracing::{debug, info};

/// Outcome of feeding one message through the map.
#[derive(Debug, Clone, PartialEq)]
pub enum MidiDispatch {
    /// The message is bound; run this action with the message value.
    Bound(MidiAction),
    /// Learn mode consumed the message and bound the armed action to it.
    Learned(MidiAction),
    /// Nothing bound and nothing armed.
    Unmapped,
}

#[derive(Default)]
pub struct MidiMap {
    bindings: HashMap<(MidiKind, u8, u8), MidiAction>,
    armed: Option<MidiAction>,
}

impl MidiMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms learn mode: the next message binds to this action.
    pub fn begin_learn(&mut self, action: MidiAction) {
        info!(?action, "midi learn armed");
        self.armed = Some(action);
    }

    /// Disarms learn mode, returning the action that was waiting.
    pub fn cancel_learn(&mut self) -> Option<MidiAction> {
        self.armed.take()
    }

    pub fn is_learning(&self) -> bool {
        self.armed.is_some()
    }

    /// Binds a message shape directly, replacing any previous binding.
    pub fn bind(&mut self, message: &MidiMessage, action: MidiAction) {
        debug!(?message, ?action, "midi binding set");
        self.bindings.insert(key(message), action);
    }

    pub fn binding(&self, message: &MidiMessage) -> Option<&MidiAction> {
        self.bindings.get(&key(message))
    }

    /// Routes one incoming message.
    pub fn handle(&mut self, message: &MidiMessage) -> MidiDispatch {
        if let Some(action) = self.armed.take() {
            info!(?message, ?action, "midi learn captured");
            self.bindings.insert(key(message), action.clone());
            return MidiDispatch::Learned(action);
        }
        match self.bindings.get(&key(message)) {
            Some(action) => MidiDispatch::Bound(action.clone()),
            None => MidiDispatch::Unmapped,
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn key(message: &MidiMessage) -> (MidiKind, u8, u8) {
    (message.kind, message.number, message.channel)
}
