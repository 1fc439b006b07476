//! Simulation configuration with documented constants
//!
//! All magic numbers are collected here with explanations of their purpose.
//! The sight/elevation limits are an opaque game-balance contract inherited
//! from the legacy world rules; do not re-derive them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the simulation core
///
/// Constructed once at bootstrap and passed explicitly to every component.
/// There is no ambient/global config access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    // === CLOCK ===
    /// Length of one simulation step in milliseconds
    ///
    /// Every world advancement phase runs once per step. Steps are never
    /// skipped or merged, only shortened when a tick overruns.
    pub tick_interval_ms: u64,

    // === MOVEMENT ===
    /// Base cost of one walked step in milliseconds, before speed scaling
    ///
    /// Remaining movement cooldown = last step stamp + step cost - now.
    pub base_step_cost_ms: u64,

    /// Multiplier applied to the step cost for diagonal steps
    ///
    /// Diagonal steps cover more ground and cost proportionally more time.
    pub diagonal_step_factor: u32,

    // === COMBAT ===
    /// Cost of one melee attack in milliseconds (the combat cooldown)
    pub attack_cost_ms: u64,

    /// Maximum Chebyshev distance for a melee attack (tiles)
    pub melee_range: i32,

    /// Horizontal half-width of the observation window (tiles)
    ///
    /// A creature can observe positions within ±sight_range_x on x and
    /// ±sight_range_y on y. The asymmetry mirrors the classic client
    /// viewport and is kept verbatim.
    pub sight_range_x: i32,

    /// Vertical half-height of the observation window (tiles)
    pub sight_range_y: i32,

    /// Maximum floor delta across which creatures can interact
    pub max_elevation_delta: u8,

    // === WORLD ===
    /// Number of ticks in a full day/night cycle
    pub day_length_ticks: u64,

    /// Minimum spawn-descriptor count before bulk placement fans out
    /// across threads; below it the coordination overhead dominates.
    pub parallel_placement_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,

            base_step_cost_ms: 400,
            diagonal_step_factor: 3,

            attack_cost_ms: 2000,
            melee_range: 1,
            sight_range_x: 8,
            sight_range_y: 6,
            max_elevation_delta: 2,

            day_length_ticks: 3600,
            parallel_placement_threshold: 64,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// One simulation step as a Duration
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<(), String> {
        if self.tick_interval_ms == 0 {
            return Err("tick_interval_ms must be positive".into());
        }
        if self.base_step_cost_ms == 0 || self.attack_cost_ms == 0 {
            return Err("action costs must be positive".into());
        }
        if self.diagonal_step_factor == 0 {
            return Err("diagonal_step_factor must be positive".into());
        }
        if self.melee_range < 1 {
            return Err("melee_range must be at least 1".into());
        }
        // The observe window must at least cover melee range
        if self.sight_range_x < self.melee_range || self.sight_range_y < self.melee_range {
            return Err(format!(
                "sight window ({}, {}) must cover melee_range ({})",
                self.sight_range_x, self.sight_range_y, self.melee_range
            ));
        }
        if self.day_length_ticks == 0 {
            return Err("day_length_ticks must be positive".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_sight_window_must_cover_melee_range() {
        let mut config = SimulationConfig::default();
        config.sight_range_y = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_tick_rejected() {
        let mut config = SimulationConfig::default();
        config.tick_interval_ms = 0;
        assert!(config.validate().is_err());
    }
}
