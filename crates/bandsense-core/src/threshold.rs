//! Threshold Calculator - adaptive per-band trigger level
//!
//! Once per buffer the raw threshold is the larger of the band's configured
//! floor and the noise estimate plus a margin. The persistent threshold then
//! moves part of the way toward it, which keeps the bar from jumping around
//! and causing triggers to oscillate near the boundary.

use crate::level::to_db;

/// Per-band smoothed threshold, in dB
#[derive(Debug, Clone, Copy)]
pub struct ThresholdCalculator {
    min_threshold_db: f32,
    margin_db: f32,
    speed: f32,
    value_db: f32,
}

impl ThresholdCalculator {
    /// Create a calculator starting at the band's floor. `speed` is clamped to `0.0..=1.0`.
    pub fn new(min_threshold_db: f32, margin_db: f32, speed: f32) -> Self {
        Self {
            min_threshold_db,
            margin_db,
            speed: speed.clamp(0.0, 1.0),
            value_db: min_threshold_db,
        }
    }

    /// Raw (unsmoothed) threshold for a noise floor given in dB
    pub fn raw_threshold_db(&self, noise_db: f32) -> f32 {
        self.min_threshold_db.max(noise_db + self.margin_db)
    }

    /// Advance the smoothed threshold using a linear noise floor estimate
    pub fn update(&mut self, noise_floor: f32) -> f32 {
        self.update_db(to_db(noise_floor))
    }

    /// Advance the smoothed threshold using a noise floor already in dB
    pub fn update_db(&mut self, noise_db: f32) -> f32 {
        let raw = self.raw_threshold_db(noise_db);
        self.value_db += self.speed * (raw - self.value_db);
        self.value_db = self.value_db.max(self.min_threshold_db);
        self.value_db
    }

    /// Current smoothed threshold in dB
    pub fn value_db(&self) -> f32 {
        self.value_db
    }

    /// Configured floor in dB
    pub fn min_threshold_db(&self) -> f32 {
        self.min_threshold_db
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_starts_at_floor() {
        let threshold = ThresholdCalculator::new(-38.0, 3.5, 0.5);
        assert_eq!(threshold.value_db(), -38.0);
    }

    #[test]
    fn test_silence_keeps_floor() {
        let mut threshold = ThresholdCalculator::new(-42.0, 3.5, 0.5);
        for _ in 0..100 {
            assert_eq!(threshold.update(0.0), -42.0);
        }
    }

    #[test]
    fn test_noise_raises_bar_gradually() {
        let mut threshold = ThresholdCalculator::new(-38.0, 3.5, 0.5);
        // Noise at -20 dB -> raw threshold -16.5 dB
        assert!((threshold.raw_threshold_db(-20.0) + 16.5).abs() < 1e-4);

        let first = threshold.update_db(-20.0);
        assert!((first - (-27.25)).abs() < 1e-4, "first step was {}", first);

        for _ in 0..50 {
            threshold.update_db(-20.0);
        }
        assert!((threshold.value_db() + 16.5).abs() < 1e-3);
    }

    #[test]
    fn test_falls_back_when_noise_drops() {
        let mut threshold = ThresholdCalculator::new(-38.0, 3.5, 0.5);
        for _ in 0..50 {
            threshold.update_db(-10.0);
        }
        for _ in 0..50 {
            threshold.update(0.0);
        }
        assert!((threshold.value_db() + 38.0).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_never_below_floor(
            floor in -80.0f32..-10.0,
            speed in 0.0f32..1.0,
            noise in prop::collection::vec(0.0f32..1.0, 1..100),
        ) {
            let mut threshold = ThresholdCalculator::new(floor, 3.5, speed);
            for n in noise {
                prop_assert!(threshold.update(n) >= floor);
            }
            prop_assert!(threshold.update(0.0) >= floor);
        }
    }
}
