//! Biquad equalizer sections.
//!
//! Coefficients follow the RBJ audio EQ cookbook. Each configured band
//! becomes one direct form I section; the strip runs them in series.

use stagecast_core::{EqBand, EqBandKind};

/// One second-order filter section with normalized coefficients.
#[derive(Debug, Clone)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Designs a section for the band at the given sample rate.
    ///
    /// The center frequency is clamped below Nyquist so a misconfigured
    /// band degrades instead of blowing up the filter.
    pub fn design(band: &EqBand, sample_rate: f32) -> Self {
        let f0 = band.frequency_hz.clamp(10.0, sample_rate * 0.45);
        let q = band.q.max(0.05);
        let a = 10.0_f32.powf(band.gain_db / 40.0);
        let w0 = 2.0 * std::f32::consts::PI * f0 / sample_rate;
        let cos_w0 = w0.cos();
        let sin_w0 = w0.sin();
        let alpha = sin_w0 / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match band.kind {
            EqBandKind::Peaking => (
                1.0 + alpha * a,
                -2.0 * cos_w0,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cos_w0,
                1.0 - alpha / a,
            ),
            EqBandKind::LowShelf => {
                let shelf = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 + shelf),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cos_w0),
                    a * ((a + 1.0) - (a - 1.0) * cos_w0 - shelf),
                    (a + 1.0) + (a - 1.0) * cos_w0 + shelf,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cos_w0),
                    (a + 1.0) + (a - 1.0) * cos_w0 - shelf,
                )
            }
            EqBandKind::HighShelf => {
                let shelf = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 + shelf),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_w0),
                    a * ((a + 1.0) + (a - 1.0) * cos_w0 - shelf),
                    (a + 1.0) - (a - 1.0) * cos_w0 + shelf,
                    2.0 * ((a - 1.0) - (a + 1.0) * cos_w0),
                    (a + 1.0) - (a - 1.0) * cos_w0 - shelf,
                )
            }
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Runs one sample through the section.
    #[inline]
    pub fn process(&mut self, x: f32) -> f32 {
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y
    }

    /// Clears the delay line.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate).sin())
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_zero_gain_peaking_passes_signal() {
        let band = EqBand::peaking(1_000.0, 0.0);
        let mut filter = Biquad::design(&band, 48_000.0);
        let input = sine(1_000.0, 48_000.0, 4_800);
        let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();
        assert!((rms(&output) - rms(&input)).abs() < 0.01);
    }

    #[test]
    fn test_peaking_boost_raises_level_at_center() {
        let band = EqBand::peaking(1_000.0, 6.0);
        let mut filter = Biquad::design(&band, 48_000.0);
        let input = sine(1_000.0, 48_000.0, 9_600);
        let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();
        // +6 dB is roughly a factor of two; allow settling slop
        let tail_in = rms(&input[4_800..]);
        let tail_out = rms(&output[4_800..]);
        assert!(tail_out / tail_in > 1.8, "boost was {}", tail_out / tail_in);
    }

    #[test]
    fn test_low_shelf_cut_attenuates_low_tone() {
        let band = EqBand {
            kind: EqBandKind::LowShelf,
            frequency_hz: 200.0,
            gain_db: -12.0,
            q: 0.7,
        };
        let mut filter = Biquad::design(&band, 48_000.0);
        let input = sine(60.0, 48_000.0, 9_600);
        let output: Vec<f32> = input.iter().map(|&s| filter.process(s)).collect();
        let tail_in = rms(&input[4_800..]);
        let tail_out = rms(&output[4_800..]);
        assert!(tail_out < tail_in * 0.5, "cut left {}", tail_out / tail_in);
    }
}
