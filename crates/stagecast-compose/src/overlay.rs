//! Overlay visibility lifecycle.

use std::time::{Duration, Instant};

use stagecast_core::{OverlayAnimation, OverlayId, OverlaySpec};

/// Where an overlay is in its show/hide lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayPhase {
    /// Not rendered.
    Hidden,

    /// Entry animation running.
    AnimatingIn { from: Instant, until: Instant },

    /// Fully shown.
    Visible,

    /// Exit animation running.
    AnimatingOut { from: Instant, until: Instant },
}

/// A positioned visual element rendered over the program output.
///
/// Visibility is independent of scene switches unless the spec scopes
/// the overlay to a scene.
#[derive(Debug, Clone)]
pub struct Overlay {
    id: OverlayId,
    spec: OverlaySpec,
    phase: OverlayPhase,
    animation: Duration,
}

impl Overlay {
    /// Create a hidden overlay.
    pub fn new(spec: OverlaySpec, animation: Duration) -> Self {
        Self {
            id: OverlayId::new(),
            spec,
            phase: OverlayPhase::Hidden,
            animation,
        }
    }

    /// Overlay identifier.
    pub fn id(&self) -> &OverlayId {
        &self.id
    }

    /// Current definition.
    pub fn spec(&self) -> &OverlaySpec {
        &self.spec
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> &OverlayPhase {
        &self.phase
    }

    /// Replace the definition; the lifecycle phase is kept.
    pub fn update(&mut self, spec: OverlaySpec) {
        self.spec = spec;
    }

    /// Begin showing. No-op when already visible or entering.
    pub fn show(&mut self, now: Instant) {
        match self.phase {
            OverlayPhase::Visible | OverlayPhase::AnimatingIn { .. } => {}
            _ => {
                self.phase = if self.spec.animate_in == OverlayAnimation::None {
                    OverlayPhase::Visible
                } else {
                    OverlayPhase::AnimatingIn {
                        from: now,
                        until: now + self.animation,
                    }
                };
            }
        }
    }

    /// Begin hiding. No-op when already hidden or leaving.
    pub fn hide(&mut self, now: Instant) {
        match self.phase {
            OverlayPhase::Hidden | OverlayPhase::AnimatingOut { .. } => {}
            _ => {
                self.phase = if self.spec.animate_out == OverlayAnimation::None {
                    OverlayPhase::Hidden
                } else {
                    OverlayPhase::AnimatingOut {
                        from: now,
                        until: now + self.animation,
                    }
                };
            }
        }
    }

    /// Advance animations that have run their course.
    pub fn tick(&mut self, now: Instant) {
        match self.phase {
            OverlayPhase::AnimatingIn { until, .. } if now >= until => {
                self.phase = OverlayPhase::Visible;
            }
            OverlayPhase::AnimatingOut { until, .. } if now >= until => {
                self.phase = OverlayPhase::Hidden;
            }
            _ => {}
        }
    }

    /// Render opacity at `now`, or None when not rendered.
    pub fn opacity(&self, now: Instant) -> Option<f32> {
        match self.phase {
            OverlayPhase::Hidden => None,
            OverlayPhase::Visible => Some(1.0),
            OverlayPhase::AnimatingIn { from, until } => {
                Some(phase_progress(from, until, now))
            }
            OverlayPhase::AnimatingOut { from, until } => {
                Some(1.0 - phase_progress(from, until, now))
            }
        }
    }
}

fn phase_progress(from: Instant, until: Instant, now: Instant) -> f32 {
    let total = until.saturating_duration_since(from);
    if total.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(from);
    (elapsed.as_secs_f32() / total.as_secs_f32()).min(1.0)
}
