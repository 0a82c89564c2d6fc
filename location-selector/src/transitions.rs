use std::time::{Duration, Instant};

/// Easing function for transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    EaseIn,
    EaseOut,
    #[default]
    EaseInOut,
}

impl Easing {
    /// Apply easing to progress (0.0 to 1.0).
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// Duration and easing of a resize or scroll animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionConfig {
    pub duration: Duration,
    pub easing: Easing,
}

impl TransitionConfig {
    pub fn new(duration: Duration, easing: Easing) -> Self {
        Self { duration, easing }
    }

    /// A transition that completes on the first advance.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO, Easing::Linear)
    }

    /// Linear progress of a transition started at `started`, clamped to 0..=1.
    pub fn progress(&self, started: Instant, now: Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(started);
        (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn is_finished(&self, started: Instant, now: Instant) -> bool {
        now.saturating_duration_since(started) >= self.duration
    }

    /// Eased value between `from` and `to` at `now`.
    pub fn interpolate(&self, from: u16, to: u16, started: Instant, now: Instant) -> u16 {
        let t = self.easing.apply(self.progress(started, now));
        let value = from as f32 + (to as f32 - from as f32) * t;
        value.round().clamp(0.0, u16::MAX as f32) as u16
    }
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self::new(Duration::from_millis(350), Easing::EaseInOut)
    }
}
