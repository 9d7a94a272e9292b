//! Gate and compressor sections of the channel strip.

use stagecast_core::{CompressorSettings, GateSettings};

/// Hysteresis between the gate's open and close thresholds.
const GATE_HYSTERESIS_DB: f32 = 6.0;

/// Window of the detection envelope follower, in milliseconds.
const DETECTOR_MS: f32 = 20.0;

pub(crate) fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

pub(crate) fn linear_to_db(value: f32) -> f32 {
    20.0 * value.max(1e-9).log10()
}

/// One-pole smoothing coefficient for a time constant in milliseconds.
fn smoothing_coeff(ms: f32, sample_rate: f32) -> f32 {
    (-1.0 / (ms.max(0.01) * 0.001 * sample_rate)).exp()
}

/// Noise gate with hysteresis.
///
/// Opens when the detection envelope crosses the threshold and closes only
/// once it falls a further six decibels, so signals hovering near the
/// threshold do not chatter. The gain ramp uses the configured attack and
/// release times.
#[derive(Debug, Clone)]
pub struct Gate {
    enabled: bool,
    open_threshold: f32,
    close_threshold: f32,
    attack: f32,
    release: f32,
    env_decay: f32,
    envelope: f32,
    gain: f32,
    open: bool,
}

impl Gate {
    pub fn from_settings(settings: &GateSettings, sample_rate: f32) -> Self {
        Self {
            enabled: settings.enabled,
            open_threshold: db_to_linear(settings.threshold_db),
            close_threshold: db_to_linear(settings.threshold_db - GATE_HYSTERESIS_DB),
            attack: smoothing_coeff(settings.attack_ms, sample_rate),
            release: smoothing_coeff(settings.release_ms, sample_rate),
            env_decay: smoothing_coeff(DETECTOR_MS, sample_rate),
            envelope: 0.0,
            gain: 0.0,
            open: false,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        if !self.enabled {
            return x;
        }
        self.envelope = x.abs().max(self.envelope * self.env_decay);
        if self.open {
            if self.envelope < self.close_threshold {
                self.open = false;
            }
        } else if self.envelope > self.open_threshold {
            self.open = true;
        }

        let target = if self.open { 1.0 } else { 0.0 };
        let coeff = if target > self.gain {
            self.attack
        } else {
            self.release
        };
        self.gain = target + (self.gain - target) * coeff;
        x * self.gain
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.gain = 0.0;
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Feed-forward compressor working in the decibel domain.
///
/// Gain reduction is computed from how far the detector sits over the
/// threshold, scaled by the ratio, then smoothed with separate attack and
/// release ballistics before makeup gain.
#[derive(Debug, Clone)]
pub struct Compressor {
    enabled: bool,
    threshold_db: f32,
    ratio: f32,
    attack: f32,
    release: f32,
    makeup: f32,
    reduction_db: f32,
}

impl Compressor {
    pub fn from_settings(settings: &CompressorSettings, sample_rate: f32) -> Self {
        Self {
            enabled: settings.enabled,
            threshold_db: settings.threshold_db,
            ratio: settings.ratio.max(1.0),
            attack: smoothing_coeff(settings.attack_ms, sample_rate),
            release: smoothing_coeff(settings.release_ms, sample_rate),
            makeup: db_to_linear(settings.makeup_db),
            reduction_db: 0.0,
        }
    }

    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        if !self.enabled {
            return x;
        }
        let level_db = linear_to_db(x.abs());
        let over = (level_db - self.threshold_db).max(0.0);
        let target = over * (1.0 - 1.0 / self.ratio);
        let coeff = if target > self.reduction_db {
            self.attack
        } else {
            self.release
        };
        self.reduction_db = target + (self.reduction_db - target) * coeff;
        x * db_to_linear(-self.reduction_db) * self.makeup
    }

    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }

    pub fn gain_reduction_db(&self) -> f32 {
        self.reduction_db
    }
}
