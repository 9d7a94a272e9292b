//! The program mix.
//!
//! Strips are processed in creation order, summed onto the bus, then the
//! soundboard voices are layered on top. The master fader and a soft
//! clipper sit at the end of the chain.
//!
//! The graph is driven from one thread; callers mutate configuration
//! between `process_block` calls, which is what makes every change land on
//! a block boundary.

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use portable_atomic::AtomicF32;
use stagecast_core::{PadId, PadSpec, SourceId, StripConfig, StripMeter};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::soundboard::Soundboard;
use crate::strip::{ChannelStrip, StripHandle};
use crate::{AudioError, AudioResult, SAMPLE_RATE};

pub struct AudioGraph {
    strips: HashMap<SourceId, ChannelStrip>,
    order: Vec<SourceId>,
    soundboard: Soundboard,
    master: Arc<AtomicF32>,
    duck_attenuation: f32,
    duck_snapshot: Option<HashMap<SourceId, f32>>,
    scratch: Vec<f32>,
}

impl AudioGraph {
    /// Creates an empty graph. `duck_attenuation` is the linear gain
    /// applied to all strips while a ducking pad plays.
    pub fn new(duck_attenuation: f32) -> Self {
        Self {
            strips: HashMap::new(),
            order: Vec::new(),
            soundboard: Soundboard::new(),
            master: Arc::new(AtomicF32::new(1.0)),
            duck_attenuation: duck_attenuation.clamp(0.0, 1.0),
            duck_snapshot: None,
            scratch: vec![0.0; crate::BLOCK_SIZE],
        }
    }

    /// Adds a strip for the source, replacing any existing one.
    #[instrument(name = "add_strip", skip(self, config))]
    pub fn add_strip(
        &mut self,
        source: &SourceId,
        config: &StripConfig,
    ) -> AudioResult<StripHandle> {
        let strip = ChannelStrip::new(source.clone(), config, SAMPLE_RATE as f32)?;
        let handle = strip.handle();
        if self.strips.insert(source.clone(), strip).is_none() {
            self.order.push(source.clone());
        }
        debug!(source = %source, "strip added");
        Ok(handle)
    }

    pub fn remove_strip(&mut self, source: &SourceId) -> bool {
        self.order.retain(|id| id != source);
        if let Some(snapshot) = self.duck_snapshot.as_mut() {
            snapshot.remove(source);
        }
        self.strips.remove(source).is_some()
    }

    pub fn strip_handle(&self, source: &SourceId) -> Option<StripHandle> {
        self.strips.get(source).map(ChannelStrip::handle)
    }

    pub fn strip_count(&self) -> usize {
        self.strips.len()
    }

    pub fn set_fader(&self, source: &SourceId, gain: f32) -> AudioResult<()> {
        let strip = self
            .strips
            .get(source)
            .ok_or_else(|| AudioError::UnknownStrip(source.clone()))?;
        strip.set_fader(gain);
        Ok(())
    }

    pub fn fader(&self, source: &SourceId) -> Option<f32> {
        self.strips.get(source).map(ChannelStrip::fader)
    }

    pub fn set_muted(&self, source: &SourceId, muted: bool) -> AudioResult<()> {
        let strip = self
            .strips
            .get(source)
            .ok_or_else(|| AudioError::UnknownStrip(source.clone()))?;
        strip.set_muted(muted);
        Ok(())
    }

    /// Swaps the strip's processor chain at the next block boundary.
    pub fn set_strip_config(&mut self, source: &SourceId, config: &StripConfig) -> AudioResult<()> {
        let strip = self
            .strips
            .get_mut(source)
            .ok_or_else(|| AudioError::UnknownStrip(source.clone()))?;
        strip.apply_config(config, SAMPLE_RATE as f32)
    }

    pub fn set_master(&self, gain: f32) {
        self.master.store(gain.clamp(0.0, 2.0), Ordering::Relaxed);
    }

    pub fn master(&self) -> f32 {
        self.master.load(Ordering::Relaxed)
    }

    pub fn add_pad(&mut self, spec: PadSpec) -> AudioResult<PadId> {
        self.soundboard.add_pad(spec)
    }

    pub fn pad(&self, id: &PadId) -> Option<&PadSpec> {
        self.soundboard.pad(id)
    }

    pub fn trigger_pad(&mut self, pad: &PadId) -> AudioResult<Uuid> {
        self.soundboard.trigger(pad)
    }

    pub fn stop_pad(&mut self, pad: &PadId) -> AudioResult<usize> {
        self.soundboard.stop(pad)
    }

    pub fn active_voices(&self) -> usize {
        self.soundboard.active_voices()
    }

    pub fn is_ducked(&self) -> bool {
        self.duck_snapshot.is_some()
    }

    /// Per-strip meters in strip creation order.
    pub fn meters(&self) -> Vec<StripMeter> {
        self.order
            .iter()
            .filter_map(|id| {
                self.strips.get(id).map(|strip| {
                    let (peak, rms) = strip.handle().meter.read();
                    StripMeter {
                        source: id.clone(),
                        peak,
                        rms,
                    }
                })
            })
            .collect()
    }

    /// Runs one block through every strip into `output`.
    ///
    /// Sources without an input entry process silence, which lets their
    /// envelopes settle and their meters fall to zero. Input blocks longer
    /// or shorter than `output` are truncated or zero-padded.
    pub fn process_block(&mut self, inputs: &HashMap<SourceId, Vec<f32>>, output: &mut [f32]) {
        self.update_duck();

        let len = output.len();
        if self.scratch.len() < len {
            self.scratch.resize(len, 0.0);
        }
        output.fill(0.0);

        for id in &self.order {
            let Some(strip) = self.strips.get_mut(id) else {
                continue;
            };
            match inputs.get(id) {
                Some(input) => {
                    let take = input.len().min(len);
                    self.scratch[..take].copy_from_slice(&input[..take]);
                    self.scratch[take..len].fill(0.0);
                }
                None => self.scratch[..len].fill(0.0),
            }
            strip.process_block(&mut self.scratch[..len]);
            for (out, sample) in output.iter_mut().zip(&self.scratch) {
                *out += sample;
            }
        }

        self.soundboard.render(output);

        let master = self.master.load(Ordering::Relaxed);
        for sample in output.iter_mut() {
            *sample = soft_clip(*sample * master);
        }
    }

    /// Engages or releases the duck based on what the soundboard is
    /// playing. Engage snapshots every fader and writes the attenuated
    /// value; release writes the snapshot back, which intentionally
    /// overrides fader moves made while ducked.
    fn update_duck(&mut self) {
        let ducking = self.soundboard.ducking();
        if ducking && self.duck_snapshot.is_none() {
            let mut snapshot = HashMap::new();
            for (id, strip) in &self.strips {
                let level = strip.fader();
                snapshot.insert(id.clone(), level);
                strip.set_fader(level * self.duck_attenuation);
            }
            debug!(strips = snapshot.len(), "duck engaged");
            self.duck_snapshot = Some(snapshot);
        } else if !ducking {
            if let Some(snapshot) = self.duck_snapshot.take() {
                for (id, level) in snapshot {
                    if let Some(strip) = self.strips.get(&id) {
                        strip.set_fader(level);
                    }
                }
                debug!("duck released");
            }
        }
    }
}

/// Soft clipping to keep the summed bus out of harsh digital clipping.
fn soft_clip(sample: f32) -> f32 {
    if sample > 1.0 {
        1.0 - (-sample + 1.0).exp() * 0.5
    } else if sample < -1.0 {
        -1.0 + (sample + 1.0).exp() * 0.5
    } else {
        sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagecast_core::PadMode;

    const BLOCK: usize = 64;

    fn input_for(source: &SourceId, level: f32) -> HashMap<SourceId, Vec<f32>> {
        let mut inputs = HashMap::new();
        inputs.insert(source.clone(), vec![level; BLOCK]);
        inputs
    }

    fn ducking_pad(len: usize) -> PadSpec {
        PadSpec {
            label: "stinger".into(),
            mode: PadMode::OneShot,
            duck_others: true,
            gain: 1.0,
            samples: vec![0.1; len],
        }
    }

    #[test]
    fn test_bus_sums_strips() {
        let mut graph = AudioGraph::new(0.2);
        let a = SourceId::new();
        let b = SourceId::new();
        graph.add_strip(&a, &StripConfig::default()).unwrap();
        graph.add_strip(&b, &StripConfig::default()).unwrap();

        let mut inputs = input_for(&a, 0.3);
        inputs.insert(b.clone(), vec![0.4; BLOCK]);
        let mut output = vec![0.0; BLOCK];
        graph.process_block(&inputs, &mut output);
        assert!((output[10] - 0.7).abs() < 1e-5);
    }

    #[test]
    fn test_fader_and_master_scale_bus() {
        let mut graph = AudioGraph::new(0.2);
        let source = SourceId::new();
        graph.add_strip(&source, &StripConfig::default()).unwrap();
        graph.set_fader(&source, 0.5).unwrap();
        graph.set_master(0.5);

        let mut output = vec![0.0; BLOCK];
        graph.process_block(&input_for(&source, 0.8), &mut output);
        assert!((output[0] - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_missing_input_meters_zero() {
        let mut graph = AudioGraph::new(0.2);
        let source = SourceId::new();
        graph.add_strip(&source, &StripConfig::default()).unwrap();

        let mut output = vec![0.0; BLOCK];
        graph.process_block(&HashMap::new(), &mut output);
        let meters = graph.meters();
        assert_eq!(meters.len(), 1);
        assert_eq!(meters[0].peak, 0.0);
        assert_eq!(meters[0].rms, 0.0);
    }

    #[test]
    fn test_soft_clip_bounds_hot_bus() {
        let mut graph = AudioGraph::new(0.2);
        let a = SourceId::new();
        let b = SourceId::new();
        graph.add_strip(&a, &StripConfig::default()).unwrap();
        graph.add_strip(&b, &StripConfig::default()).unwrap();

        let mut inputs = input_for(&a, 1.0);
        inputs.insert(b.clone(), vec![1.0; BLOCK]);
        let mut output = vec![0.0; BLOCK];
        graph.process_block(&inputs, &mut output);
        assert!(output.iter().all(|s| s.abs() <= 1.0));
        assert!(output[0] > 0.7);
    }

    #[test]
    fn test_pad_mixes_into_bus() {
        let mut graph = AudioGraph::new(0.2);
        let pad = graph
            .add_pad(PadSpec::one_shot("sting", vec![0.5; BLOCK]))
            .unwrap();
        graph.trigger_pad(&pad).unwrap();

        let mut output = vec![0.0; BLOCK];
        graph.process_block(&HashMap::new(), &mut output);
        assert!((output[5] - 0.5).abs() < 1e-6);
        assert_eq!(graph.active_voices(), 0);
    }

    #[test]
    fn test_duck_restores_exact_levels() {
        let mut graph = AudioGraph::new(0.25);
        let source = SourceId::new();
        graph.add_strip(&source, &StripConfig::default()).unwrap();
        graph.set_fader(&source, 0.8).unwrap();

        let pad = graph.add_pad(ducking_pad(BLOCK * 2)).unwrap();
        graph.trigger_pad(&pad).unwrap();

        let mut output = vec![0.0; BLOCK];
        graph.process_block(&HashMap::new(), &mut output);
        assert!(graph.is_ducked());
        assert!((graph.fader(&source).unwrap() - 0.2).abs() < 1e-6);

        // a fader move while ducked is overridden by the restore
        graph.set_fader(&source, 1.5).unwrap();

        graph.process_block(&HashMap::new(), &mut output);
        // pad exhausted; next block releases the duck
        graph.process_block(&HashMap::new(), &mut output);
        assert!(!graph.is_ducked());
        assert!((graph.fader(&source).unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_early_pad_stop_releases_duck() {
        let mut graph = AudioGraph::new(0.25);
        let source = SourceId::new();
        graph.add_strip(&source, &StripConfig::default()).unwrap();
        graph.set_fader(&source, 0.8).unwrap();

        // plenty of samples left when the stop lands
        let pad = graph.add_pad(ducking_pad(BLOCK * 8)).unwrap();
        graph.trigger_pad(&pad).unwrap();

        let mut output = vec![0.0; BLOCK];
        graph.process_block(&HashMap::new(), &mut output);
        assert!(graph.is_ducked());

        assert_eq!(graph.stop_pad(&pad).unwrap(), 1);
        graph.process_block(&HashMap::new(), &mut output);
        assert!(!graph.is_ducked());
        assert!((graph.fader(&source).unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_strip_errors() {
        let graph = AudioGraph::new(0.2);
        let ghost = SourceId::new();
        assert!(matches!(
            graph.set_fader(&ghost, 1.0),
            Err(AudioError::UnknownStrip(_))
        ));
    }
}
