//! Sample pads and their playing voices.

use std::collections::HashMap;

use stagecast_core::{PadId, PadMode, PadSpec};
use tracing::debug;
use uuid::Uuid;

use crate::{AudioError, AudioResult};

/// A playing instance of a pad's sample.
#[derive(Debug)]
struct Voice {
    id: Uuid,
    pad: PadId,
    position: usize,
    gain: f32,
    ducks: bool,
}

/// Pad bank plus the currently sounding voices.
///
/// One-shot pads are monophonic: triggering again cuts the running voice
/// and restarts from sample zero. Polyphonic pads stack a new voice per
/// trigger. A voice ends when it runs out of samples or its pad is
/// stopped.
#[derive(Default)]
pub struct Soundboard {
    pads: HashMap<PadId, PadSpec>,
    order: Vec<PadId>,
    voices: Vec<Voice>,
}

impl Soundboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pad(&mut self, spec: PadSpec) -> AudioResult<PadId> {
        if spec.samples.is_empty() {
            return Err(AudioError::BadSettings("pad has no samples".into()));
        }
        let id = PadId::new();
        debug!(pad = %id, label = %spec.label, "pad added");
        self.order.push(id.clone());
        self.pads.insert(id.clone(), spec);
        Ok(id)
    }

    pub fn pad(&self, id: &PadId) -> Option<&PadSpec> {
        self.pads.get(id)
    }

    pub fn pad_ids(&self) -> &[PadId] {
        &self.order
    }

    /// Starts a voice for the pad. Returns the voice id.
    pub fn trigger(&mut self, pad: &PadId) -> AudioResult<Uuid> {
        let spec = self
            .pads
            .get(pad)
            .ok_or_else(|| AudioError::UnknownPad(pad.clone()))?;
        if spec.mode == PadMode::OneShot {
            self.voices.retain(|v| &v.pad != pad);
        }
        let voice = Voice {
            id: Uuid::new_v4(),
            pad: pad.clone(),
            position: 0,
            gain: spec.gain,
            ducks: spec.duck_others,
        };
        let id = voice.id;
        self.voices.push(voice);
        Ok(id)
    }

    /// Cuts every voice of the pad. Returns how many were playing.
    pub fn stop(&mut self, pad: &PadId) -> AudioResult<usize> {
        if !self.pads.contains_key(pad) {
            return Err(AudioError::UnknownPad(pad.clone()));
        }
        let before = self.voices.len();
        self.voices.retain(|v| &v.pad != pad);
        Ok(before - self.voices.len())
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Whether any playing voice wants the rest of the mix ducked.
    pub fn ducking(&self) -> bool {
        self.voices.iter().any(|v| v.ducks)
    }

    /// Adds every playing voice into the block and retires finished ones.
    pub fn render(&mut self, output: &mut [f32]) {
        let pads = &self.pads;
        for voice in &mut self.voices {
            let Some(spec) = pads.get(&voice.pad) else {
                continue;
            };
            for out in output.iter_mut() {
                if voice.position >= spec.samples.len() {
                    break;
                }
                *out += spec.samples[voice.position] * voice.gain;
                voice.position += 1;
            }
        }
        self.voices.retain(|v| {
            pads.get(&v.pad)
                .is_some_and(|spec| v.position < spec.samples.len())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_pad(len: usize, mode: PadMode) -> PadSpec {
        PadSpec {
            label: "ramp".into(),
            mode,
            duck_others: false,
            gain: 1.0,
            samples: (0..len).map(|i| i as f32 / len as f32).collect(),
        }
    }

    #[test]
    fn test_empty_pad_rejected() {
        let mut board = Soundboard::new();
        assert!(matches!(
            board.add_pad(ramp_pad(0, PadMode::OneShot)),
            Err(AudioError::BadSettings(_))
        ));
    }

    #[test]
    fn test_one_shot_retrigger_restarts_from_zero() {
        let mut board = Soundboard::new();
        let pad = board.add_pad(ramp_pad(1_000, PadMode::OneShot)).unwrap();
        board.trigger(&pad).unwrap();

        let mut block = vec![0.0_f32; 100];
        board.render(&mut block);
        assert_eq!(board.active_voices(), 1);

        // retrigger mid-playback: still one voice, back at sample zero
        board.trigger(&pad).unwrap();
        assert_eq!(board.active_voices(), 1);
        let mut block = vec![0.0_f32; 4];
        board.render(&mut block);
        assert_eq!(block[0], 0.0);
        assert!((block[1] - 0.001).abs() < 1e-6);
    }

    #[test]
    fn test_polyphonic_voices_stack() {
        let mut board = Soundboard::new();
        let pad = board.add_pad(ramp_pad(1_000, PadMode::Polyphonic)).unwrap();
        board.trigger(&pad).unwrap();
        board.trigger(&pad).unwrap();
        assert_eq!(board.active_voices(), 2);

        let mut block = vec![0.0_f32; 4];
        board.render(&mut block);
        // both voices at the same position, so samples double up
        assert!((block[2] - 0.004).abs() < 1e-6);
    }

    #[test]
    fn test_voice_retires_at_end_of_samples() {
        let mut board = Soundboard::new();
        let pad = board.add_pad(ramp_pad(10, PadMode::OneShot)).unwrap();
        board.trigger(&pad).unwrap();
        let mut block = vec![0.0_f32; 16];
        board.render(&mut block);
        assert_eq!(board.active_voices(), 0);
        assert_eq!(block[12], 0.0);
    }

    #[test]
    fn test_stop_cuts_all_voices_of_pad() {
        let mut board = Soundboard::new();
        let pad = board.add_pad(ramp_pad(1_000, PadMode::Polyphonic)).unwrap();
        board.trigger(&pad).unwrap();
        board.trigger(&pad).unwrap();
        assert_eq!(board.stop(&pad).unwrap(), 2);
        assert_eq!(board.active_voices(), 0);
    }

    #[test]
    fn test_duck_flag_follows_voices() {
        let mut board = Soundboard::new();
        let mut spec = ramp_pad(10, PadMode::OneShot);
        spec.duck_others = true;
        let pad = board.add_pad(spec).unwrap();
        assert!(!board.ducking());
        board.trigger(&pad).unwrap();
        assert!(board.ducking());
        let mut block = vec![0.0_f32; 16];
        board.render(&mut block);
        assert!(!board.ducking());
    }
}
