//! Selector configuration.

use std::time::Duration;

use crate::error::SelectorError;
use crate::transitions::{Easing, TransitionConfig};

/// Configuration shared by a selector and the trees it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Duration of expand/collapse resizes and smooth scrolling.
    pub animation_duration: Duration,
    pub easing: Easing,
    /// Height of a single row.
    pub row_height: u16,
    /// Height of the visible scroll viewport.
    pub viewport_height: u16,
    /// When set, every animation completes on the next advance.
    pub reduced_motion: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            animation_duration: Duration::from_millis(350),
            easing: Easing::EaseInOut,
            row_height: 1,
            viewport_height: 20,
            reduced_motion: false,
        }
    }
}

impl SelectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn animation_duration(mut self, duration: Duration) -> Self {
        self.animation_duration = duration;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn row_height(mut self, height: u16) -> Self {
        self.row_height = height;
        self
    }

    pub fn viewport_height(mut self, height: u16) -> Self {
        self.viewport_height = height;
        self
    }

    pub fn reduced_motion(mut self, enabled: bool) -> Self {
        self.reduced_motion = enabled;
        self
    }

    /// The transition used for resizes and smooth scrolls.
    pub fn transition(&self) -> TransitionConfig {
        if self.reduced_motion {
            TransitionConfig::instant()
        } else {
            TransitionConfig::new(self.animation_duration, self.easing)
        }
    }

    pub fn validate(&self) -> Result<(), SelectorError> {
        if self.row_height == 0 {
            return Err(SelectorError::InvalidConfig {
                field: "row_height",
                reason: "must be greater than zero",
            });
        }
        if self.viewport_height == 0 {
            return Err(SelectorError::InvalidConfig {
                field: "viewport_height",
                reason: "must be greater than zero",
            });
        }
        Ok(())
    }
}
