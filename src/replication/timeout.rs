//! Adaptive acknowledgement timeout.
//!
//! The bound tracks a smoothed round-trip latency (1/8 weight per sample)
//! scaled by a multiplier, clamped to the configured range. A timeout doubles
//! the bound so a slow replica is not repeatedly cut off.

use std::time::Duration;

use crate::core::AckConfig;

const SMOOTHING: f64 = 0.125;

#[derive(Clone, Debug)]
pub struct AdaptiveTimeout {
    min: Duration,
    max: Duration,
    multiplier: f64,
    smoothed: Option<Duration>,
    current: Duration,
}

impl AdaptiveTimeout {
    pub fn new(config: &AckConfig) -> Self {
        let min = config.min_timeout.min(config.max_timeout);
        let max = config.max_timeout;
        let multiplier = if config.latency_multiplier.is_finite() && config.latency_multiplier > 0.0 {
            config.latency_multiplier
        } else {
            1.0
        };
        Self {
            min,
            max,
            multiplier,
            smoothed: None,
            current: config.initial_timeout.max(min).min(max),
        }
    }

    /// Current wait bound.
    #[must_use]
    pub fn current(&self) -> Duration {
        self.current
    }

    #[must_use]
    pub fn smoothed_latency(&self) -> Option<Duration> {
        self.smoothed
    }

    pub fn record_latency(&mut self, latency: Duration) {
        let smoothed = match self.smoothed {
            None => latency,
            Some(prev) => prev.mul_f64(1.0 - SMOOTHING) + latency.mul_f64(SMOOTHING),
        };
        self.smoothed = Some(smoothed);
        self.current = self.clamp(smoothed.mul_f64(self.multiplier));
    }

    pub fn record_timeout(&mut self) {
        self.current = self.clamp(self.current.saturating_mul(2));
    }

    fn clamp(&self, bound: Duration) -> Duration {
        bound.max(self.min).min(self.max)
    }
}
