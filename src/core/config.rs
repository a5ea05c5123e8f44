//! Combat configuration.
//!
//! Sessions are configured once at battle start. All tunables that change
//! outcomes (revival hp, multipliers, seed) live here so a replay only needs
//! the config plus the recorded action inputs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome-affecting combat parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CombatConfig {
    /// Seed for the shared battle RNG.
    pub seed: u64,

    /// Hp restored when an immortal stack prevents a death.
    pub revival_hp: u32,

    /// Multiplier applied to base attack while the attacker is weakened.
    pub weakened_multiplier: f64,

    /// Multiplier applied when the target resists the damage source.
    /// `0.0` negates resisted damage entirely.
    pub resist_multiplier: f64,

    /// Replica acknowledgement bounds.
    pub ack: AckConfig,

    /// Sequencing delays between sub-steps of an action.
    pub pacing: PacingConfig,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            revival_hp: 100,
            weakened_multiplier: 0.5,
            resist_multiplier: 0.0,
            ack: AckConfig::default(),
            pacing: PacingConfig::default(),
        }
    }
}

impl CombatConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_revival_hp(mut self, hp: u32) -> Self {
        self.revival_hp = hp;
        self
    }

    pub fn with_weakened_multiplier(mut self, multiplier: f64) -> Self {
        self.weakened_multiplier = multiplier;
        self
    }

    pub fn with_resist_multiplier(mut self, multiplier: f64) -> Self {
        self.resist_multiplier = multiplier;
        self
    }

    pub fn with_ack(mut self, ack: AckConfig) -> Self {
        self.ack = ack;
        self
    }

    pub fn with_pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }
}

/// Bounds for the adaptive acknowledgement timeout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AckConfig {
    /// Timeout used before any latency has been observed.
    pub initial_timeout: Duration,
    pub min_timeout: Duration,
    pub max_timeout: Duration,
    /// Timeout = smoothed latency × this factor (then clamped).
    pub latency_multiplier: f64,
}

impl Default for AckConfig {
    fn default() -> Self {
        Self {
            initial_timeout: Duration::from_millis(3_000),
            min_timeout: Duration::from_millis(500),
            max_timeout: Duration::from_millis(10_000),
            latency_multiplier: 4.0,
        }
    }
}

/// Presentation-paced pauses on the authoritative side.
///
/// These only order sub-steps; outcomes never depend on them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Pause after a turn's actions are broadcast, before damage lands.
    pub travel_delay: Duration,
    /// Pause after damage lands, before reactive triggers.
    pub impact_delay: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CombatConfig::default();
        assert_eq!(config.revival_hp, 100);
        assert_eq!(config.weakened_multiplier, 0.5);
        assert_eq!(config.resist_multiplier, 0.0);
        assert!(config.ack.min_timeout <= config.ack.initial_timeout);
        assert!(config.ack.initial_timeout <= config.ack.max_timeout);
        assert_eq!(config.pacing, PacingConfig::default());
    }

    #[test]
    fn test_builder_pattern() {
        let config = CombatConfig::default()
            .with_seed(123)
            .with_revival_hp(40)
            .with_weakened_multiplier(0.75);

        assert_eq!(config.seed, 123);
        assert_eq!(config.revival_hp, 40);
        assert_eq!(config.weakened_multiplier, 0.75);
    }

    #[test]
    fn test_serialization() {
        let config = CombatConfig::default().with_seed(9);
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: CombatConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
