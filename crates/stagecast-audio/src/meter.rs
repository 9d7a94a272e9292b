use std::sync::Arc;

use portable_atomic::AtomicF32;
use std::sync::atomic::Ordering;

/// Lock-free meter slot.
///
/// The processing path stores block peak and RMS; the control thread reads
/// them whenever it assembles a meter event. Relaxed ordering is fine here,
/// a stale meter frame is indistinguishable from a fresh one.
#[derive(Debug)]
pub struct MeterProbe {
    peak: AtomicF32,
    rms: AtomicF32,
}

impl MeterProbe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            peak: AtomicF32::new(0.0),
            rms: AtomicF32::new(0.0),
        })
    }

    /// Records the peak and RMS of one processed block.
    pub fn update(&self, block: &[f32]) {
        if block.is_empty() {
            return;
        }
        let mut peak = 0.0_f32;
        let mut sum = 0.0_f32;
        for &sample in block {
            peak = peak.max(sample.abs());
            sum += sample * sample;
        }
        let rms = (sum / block.len() as f32).sqrt();
        self.peak.store(peak, Ordering::Relaxed);
        self.rms.store(rms, Ordering::Relaxed);
    }

    pub fn clear(&self) {
        self.peak.store(0.0, Ordering::Relaxed);
        self.rms.store(0.0, Ordering::Relaxed);
    }

    /// Latest (peak, rms) pair.
    pub fn read(&self) -> (f32, f32) {
        (
            self.peak.load(Ordering::Relaxed),
            self.rms.load(Ordering::Relaxed),
        )
    }
}
