//! Ambient world light, cycled by the clock's world phase

use std::sync::atomic::{AtomicU8, Ordering};

/// Light levels at the extremes of the day cycle
pub const LIGHT_DAY: u8 = 250;
pub const LIGHT_NIGHT: u8 = 40;

/// World-level ambient light state
///
/// The clock compares `level_for` against the stored level each tick and
/// schedules a light event on mismatch, so spectators hear about dawn and
/// dusk transitions.
pub struct WorldLight {
    level: AtomicU8,
}

impl Default for WorldLight {
    fn default() -> Self {
        Self {
            level: AtomicU8::new(LIGHT_DAY),
        }
    }
}

impl WorldLight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(&self) -> u8 {
        self.level.load(Ordering::Acquire)
    }

    /// Set the level directly; returns true if it changed
    pub fn set_level(&self, level: u8) -> bool {
        self.level.swap(level, Ordering::AcqRel) != level
    }

    /// Light level for a point in the day cycle
    ///
    /// First half of the cycle is day, second half night, with a linear ramp
    /// over the 1/8 of the cycle around each transition.
    pub fn level_for(tick: u64, day_length: u64) -> u8 {
        let phase = tick % day_length;
        let half = day_length / 2;
        let ramp = (day_length / 8).max(1);
        let span = u64::from(LIGHT_DAY - LIGHT_NIGHT);

        if phase < half {
            // Day, fading toward dusk at the end.
            let until_dusk = half - phase;
            if until_dusk <= ramp {
                let faded = span * (ramp - until_dusk) / ramp;
                LIGHT_DAY - faded as u8
            } else {
                LIGHT_DAY
            }
        } else {
            // Night, fading toward dawn at the end.
            let until_dawn = day_length - phase;
            if until_dawn <= ramp {
                let raised = span * (ramp - until_dawn) / ramp;
                LIGHT_NIGHT + raised as u8
            } else {
                LIGHT_NIGHT
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midday_and_midnight_levels() {
        assert_eq!(WorldLight::level_for(0, 800), LIGHT_DAY);
        assert_eq!(WorldLight::level_for(500, 800), LIGHT_NIGHT);
    }

    #[test]
    fn test_set_level_reports_only_changes() {
        let light = WorldLight::new();
        assert!(!light.set_level(LIGHT_DAY));
        assert!(light.set_level(LIGHT_NIGHT));
        assert!(!light.set_level(LIGHT_NIGHT));
        assert_eq!(light.level(), LIGHT_NIGHT);
    }

    #[test]
    fn test_dusk_ramps_down() {
        let day_length = 800;
        // Ramp is the last 100 ticks of the day half (300..400).
        let mid_ramp = WorldLight::level_for(350, day_length);
        assert!(mid_ramp < LIGHT_DAY);
        assert!(mid_ramp > LIGHT_NIGHT);
    }
}
