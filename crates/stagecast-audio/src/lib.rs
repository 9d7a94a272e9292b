//! Audio engine for the studio.
//!
//! Every audio source gets a channel strip (gate, EQ, compressor, fader,
//! mute) feeding one program bus. The soundboard layers sample pads onto
//! the bus and can duck the strips while a pad plays. A MIDI map binds
//! hardware controls to pad triggers and fader moves.
//!
//! Processing is block-based and driven by the studio's control thread;
//! parameter changes land on block boundaries.

mod dynamics;
mod eq;
mod error;
mod graph;
mod meter;
mod midi;
mod soundboard;
mod strip;

pub use dynamics::{Compressor, Gate};
pub use eq::Biquad;
pub use error::AudioError;
pub use graph::AudioGraph;
pub use meter::MeterProbe;
pub use midi::{MidiDispatch, MidiMap};
pub use soundboard::Soundboard;
pub use strip::{ChannelStrip, StripHandle};

/// Engine sample rate in Hz.
pub const SAMPLE_RATE: u32 = 48_000;

/// Samples per processing block (10 ms at 48 kHz).
pub const BLOCK_SIZE: usize = 480;

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
