//! Per-source channel strips.
//!
//! Signal order is input gain, gate, EQ, compressor, fader, mute. Fader
//! and mute live in atomics shared with control surfaces; the block loop
//! reads them once per block so a parameter never changes mid-block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use portable_atomic::AtomicF32;
use stagecast_core::{SourceId, StripConfig};

use crate::dynamics::{Compressor, Gate};
use crate::eq::Biquad;
use crate::meter::MeterProbe;
use crate::{AudioError, AudioResult};

/// Control handle shared with UI threads and MIDI dispatch.
#[derive(Debug)]
pub struct StripHandle {
    pub fader: Arc<AtomicF32>,
    pub muted: Arc<AtomicBool>,
    pub meter: Arc<MeterProbe>,
}

impl Clone for StripHandle {
    fn clone(&self) -> Self {
        Self {
            fader: Arc::clone(&self.fader),
            muted: Arc::clone(&self.muted),
            meter: Arc::clone(&self.meter),
        }
    }
}

pub struct ChannelStrip {
    source: SourceId,
    input_gain: f32,
    gate: Gate,
    eq: Vec<Biquad>,
    compressor: Compressor,
    fader: Arc<AtomicF32>,
    muted: Arc<AtomicBool>,
    meter: Arc<MeterProbe>,
}

impl ChannelStrip {
    pub fn new(source: SourceId, config: &StripConfig, sample_rate: f32) -> AudioResult<Self> {
        validate(config)?;
        Ok(Self {
            source,
            input_gain: config.input_gain,
            gate: Gate::from_settings(&config.gate, sample_rate),
            eq: config
                .eq
                .iter()
                .map(|band| Biquad::design(band, sample_rate))
                .collect(),
            compressor: Compressor::from_settings(&config.compressor, sample_rate),
            fader: Arc::new(AtomicF32::new(1.0)),
            muted: Arc::new(AtomicBool::new(false)),
            meter: MeterProbe::new(),
        })
    }

    pub fn source(&self) -> &SourceId {
        &self.source
    }

    pub fn handle(&self) -> StripHandle {
        StripHandle {
            fader: Arc::clone(&self.fader),
            muted: Arc::clone(&self.muted),
            meter: Arc::clone(&self.meter),
        }
    }

    /// Swaps in a new processor chain. Envelopes restart from silence,
    /// which is acceptable because swaps happen between blocks.
    pub fn apply_config(&mut self, config: &StripConfig, sample_rate: f32) -> AudioResult<()> {
        validate(config)?;
        self.input_gain = config.input_gain;
        self.gate = Gate::from_settings(&config.gate, sample_rate);
        self.eq = config
            .eq
            .iter()
            .map(|band| Biquad::design(band, sample_rate))
            .collect();
        self.compressor = Compressor::from_settings(&config.compressor, sample_rate);
        Ok(())
    }

    /// Fader gain, clamped to 0.0-2.0 (1.0 = unity).
    pub fn set_fader(&self, gain: f32) {
        self.fader.store(gain.clamp(0.0, 2.0), Ordering::Relaxed);
    }

    pub fn fader(&self) -> f32 {
        self.fader.load(Ordering::Relaxed)
    }

    pub fn set_muted(&self, muted: bool) {
        self.muted.store(muted, Ordering::Relaxed);
    }

    pub fn is_muted(&self) -> bool {
        self.muted.load(Ordering::Relaxed)
    }

    /// Processes one block in place, leaving the post-fader signal behind.
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        let fader = self.fader.load(Ordering::Relaxed);
        let muted = self.muted.load(Ordering::Relaxed);

        for sample in buffer.iter_mut() {
            let mut x = *sample * self.input_gain;
            x = self.gate.process(x);
            for section in &mut self.eq {
                x = section.process(x);
            }
            x = self.compressor.process(x);
            *sample = x * fader;
        }
        if muted {
            buffer.fill(0.0);
        }
        self.meter.update(buffer);
    }
}

fn validate(config: &StripConfig) -> AudioResult<()> {
    if config.input_gain < 0.0 {
        return Err(AudioError::BadSettings(format!(
            "input gain must be non-negative, got {}",
            config.input_gain
        )));
    }
    if config.compressor.ratio < 1.0 {
        return Err(AudioError::BadSettings(format!(
            "compressor ratio must be at least 1:1, got {}",
            config.compressor.ratio
        )));
    }
    for band in &config.eq {
        if band.frequency_hz <= 0.0 {
            return Err(AudioError::BadSettings(format!(
                "eq band frequency must be positive, got {}",
                band.frequency_hz
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f32 = 48_000.0;

    // default config has gate and compressor disabled, so the strip is
    // gain-transparent
    fn passthrough_config() -> StripConfig {
        StripConfig::default()
    }

    #[test]
    fn test_fader_scales_output() {
        let mut strip = ChannelStrip::new(SourceId::new(), &passthrough_config(), FS).unwrap();
        strip.set_fader(0.5);
        let mut block = vec![0.8_f32; 64];
        strip.process_block(&mut block);
        for s in &block {
            assert!((s - 0.4).abs() < 1e-6);
        }
    }

    #[test]
    fn test_mute_silences_and_zeroes_meter() {
        let mut strip = ChannelStrip::new(SourceId::new(), &passthrough_config(), FS).unwrap();
        strip.set_muted(true);
        let mut block = vec![1.0_f32; 64];
        strip.process_block(&mut block);
        assert!(block.iter().all(|s| *s == 0.0));
        assert_eq!(strip.handle().meter.read(), (0.0, 0.0));
    }

    #[test]
    fn test_fader_clamp() {
        let strip = ChannelStrip::new(SourceId::new(), &passthrough_config(), FS).unwrap();
        strip.set_fader(5.0);
        assert!((strip.fader() - 2.0).abs() < 1e-6);
        strip.set_fader(-1.0);
        assert_eq!(strip.fader(), 0.0);
    }

    #[test]
    fn test_handle_shares_fader_with_strip() {
        let mut strip = ChannelStrip::new(SourceId::new(), &passthrough_config(), FS).unwrap();
        let handle = strip.handle();
        handle.fader.store(0.25, Ordering::Relaxed);
        let mut block = vec![1.0_f32; 16];
        strip.process_block(&mut block);
        assert!((block[0] - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_bad_ratio_rejected() {
        let mut config = passthrough_config();
        config.compressor.ratio = 0.5;
        assert!(matches!(
            ChannelStrip::new(SourceId::new(), &config, FS),
            Err(AudioError::BadSettings(_))
        ));
    }
}
