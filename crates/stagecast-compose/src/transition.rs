//! Bounded-duration scene transitions.

use std::time::{Duration, Instant};

use stagecast_core::{SceneId, TransitionKind};

/// A transition animation in flight.
///
/// While a run is active both the outgoing and incoming scene
/// composites are rendered; the run ends once `duration` has elapsed.
#[derive(Debug, Clone)]
pub struct TransitionRun {
    /// Animation style.
    pub kind: TransitionKind,

    /// Scene being left.
    pub from: SceneId,

    /// Scene being entered (already the program cursor).
    pub to: SceneId,

    started_at: Instant,
    duration: Duration,
}

impl TransitionRun {
    /// Start a run at `now`.
    pub fn new(
        kind: TransitionKind,
        from: SceneId,
        to: SceneId,
        now: Instant,
        duration: Duration,
    ) -> Self {
        Self {
            kind,
            from,
            to,
            started_at: now,
            duration,
        }
    }

    /// Animation progress in 0.0 - 1.0.
    pub fn progress(&self, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    /// Whether the run has finished by `now`.
    pub fn is_complete(&self, now: Instant) -> bool {
        self.progress(now) >= 1.0
    }

    /// Whether the scene is one of the two being blended.
    pub fn involves(&self, scene: &SceneId) -> bool {
        &self.from == scene || &self.to == scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_clamped() {
        let start = Instant::now();
        let run = TransitionRun::new(
            TransitionKind::Fade,
            SceneId::from("a"),
            SceneId::from("b"),
            start,
            Duration::from_millis(100),
        );

        assert_eq!(run.progress(start), 0.0);
        let mid = run.progress(start + Duration::from_millis(50));
        assert!(mid > 0.4 && mid < 0.6);
        assert_eq!(run.progress(start + Duration::from_millis(200)), 1.0);
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let start = Instant::now();
        let run = TransitionRun::new(
            TransitionKind::Cut,
            SceneId::from("a"),
            SceneId::from("b"),
            start,
            Duration::ZERO,
        );
        assert!(run.is_complete(start));
    }

    #[test]
    fn test_involves_both_endpoints() {
        let run = TransitionRun::new(
            TransitionKind::Slide,
            SceneId::from("a"),
            SceneId::from("b"),
            Instant::now(),
            Duration::from_millis(100),
        );
        assert!(run.involves(&SceneId::from("a")));
        assert!(run.involves(&SceneId::from("b")));
        assert!(!run.involves(&SceneId::from("c")));
    }
}
