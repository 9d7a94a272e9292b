//! Wire types for channel strips, metering, MIDI, and the soundboard.

use serde::{Deserialize, Serialize};

use crate::id::{PadId, SourceId};

/// Noise gate settings for a channel strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateSettings {
    /// Whether the gate is in the chain.
    pub enabled: bool,

    /// Level the input must exceed to open, in dBFS.
    pub threshold_db: f32,

    /// How long the input must stay above threshold before opening.
    pub attack_ms: f32,

    /// How long the input must stay below threshold before closing.
    pub release_ms: f32,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_db: -50.0,
            attack_ms: 5.0,
            release_ms: 100.0,
        }
    }
}

/// Compressor settings for a channel strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorSettings {
    /// Whether the compressor is in the chain.
    pub enabled: bool,

    /// Level above which gain reduction starts, in dBFS.
    pub threshold_db: f32,

    /// Compression ratio (4.0 means 4:1).
    pub ratio: f32,

    /// Envelope attack time in milliseconds.
    pub attack_ms: f32,

    /// Envelope release time in milliseconds.
    pub release_ms: f32,

    /// Gain applied after reduction, in dB.
    pub makeup_db: f32,
}

impl Default for CompressorSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold_db: -18.0,
            ratio: 4.0,
            attack_ms: 10.0,
            release_ms: 120.0,
            makeup_db: 0.0,
        }
    }
}

/// Filter shape of one EQ band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EqBandKind {
    /// Boost or cut below the corner frequency.
    LowShelf,

    /// Boost or cut around the center frequency.
    Peaking,

    /// Boost or cut above the corner frequency.
    HighShelf,
}

/// One parametric EQ band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    /// Filter shape.
    pub kind: EqBandKind,

    /// Center or corner frequency in Hz.
    pub frequency_hz: f32,

    /// Boost or cut in dB.
    pub gain_db: f32,

    /// Bandwidth control.
    pub q: f32,
}

impl EqBand {
    /// A peaking band at the given frequency.
    pub fn peaking(frequency_hz: f32, gain_db: f32) -> Self {
        Self {
            kind: EqBandKind::Peaking,
            frequency_hz,
            gain_db,
            q: 1.0,
        }
    }
}

/// Full processing configuration for one channel strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripConfig {
    /// Input gain ahead of the processing chain (linear).
    pub input_gain: f32,

    /// EQ bands applied in order.
    pub eq: Vec<EqBand>,

    /// Noise gate ahead of the EQ.
    pub gate: GateSettings,

    /// Compressor after the EQ.
    pub compressor: CompressorSettings,
}

impl Default for StripConfig {
    fn default() -> Self {
        Self {
            input_gain: 1.0,
            eq: Vec::new(),
            gate: GateSettings::default(),
            compressor: CompressorSettings::default(),
        }
    }
}

/// Peak and RMS level of one strip, published for VU meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StripMeter {
    /// Source the strip is bound to.
    pub source: SourceId,

    /// Highest absolute sample since the previous snapshot.
    pub peak: f32,

    /// Root mean square level since the previous snapshot.
    pub rms: f32,
}

/// Kind of MIDI message a mapping can bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MidiKind {
    /// Note-on message (pads, keys).
    NoteOn,

    /// Note-off message.
    NoteOff,

    /// Continuous controller message (faders, knobs).
    ControlChange,
}

/// One physical MIDI message, already parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiMessage {
    /// Message kind.
    pub kind: MidiKind,

    /// Note or controller number (0-127).
    pub number: u8,

    /// MIDI channel (0-15).
    pub channel: u8,

    /// Velocity or controller value (0-127).
    pub value: u8,
}

impl MidiMessage {
    /// A note-on on channel 0.
    pub fn note_on(number: u8, velocity: u8) -> Self {
        Self {
            kind: MidiKind::NoteOn,
            number,
            channel: 0,
            value: velocity,
        }
    }

    /// A control change on channel 0.
    pub fn control_change(number: u8, value: u8) -> Self {
        Self {
            kind: MidiKind::ControlChange,
            number,
            channel: 0,
            value,
        }
    }
}

/// Logical action a MIDI message can be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MidiAction {
    /// Trigger a soundboard pad.
    TriggerPad(PadId),

    /// Set a strip fader from the controller value.
    SetFader(SourceId),

    /// Toggle a strip mute.
    ToggleMute(SourceId),
}

/// Playback behavior of a soundboard pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadMode {
    /// One voice; a retrigger restarts the clip from zero.
    OneShot,

    /// Each trigger layers a new voice.
    Polyphonic,
}

/// Definition of a soundboard pad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PadSpec {
    /// Display label.
    pub label: String,

    /// Playback behavior.
    pub mode: PadMode,

    /// Attenuate every other strip while the pad plays.
    pub duck_others: bool,

    /// Playback gain (linear).
    pub gain: f32,

    /// Clip samples, mono at the engine sample rate.
    pub samples: Vec<f32>,
}

impl PadSpec {
    /// A one-shot pad over the given clip.
    pub fn one_shot(label: impl Into<String>, samples: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            mode: PadMode::OneShot,
            duck_others: false,
            gain: 1.0,
            samples,
        }
    }
}
