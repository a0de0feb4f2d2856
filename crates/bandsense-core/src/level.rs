//! Level helpers - linear magnitude to decibel conversion

/// Smallest linear magnitude considered by [`to_db`]
pub const DB_EPSILON: f32 = 1e-6;

/// Decibel value reported for silence (`20 * log10(DB_EPSILON)`)
pub const DB_FLOOR: f32 = -120.0;

/// Convert a linear magnitude to decibels.
///
/// Values at or below [`DB_EPSILON`] (including NaN) map to [`DB_FLOOR`] so the
/// result is always finite.
pub fn to_db(magnitude: f32) -> f32 {
    if magnitude.is_nan() || magnitude <= DB_EPSILON {
        return DB_FLOOR;
    }
    20.0 * magnitude.min(f32::MAX).log10()
}

/// Root mean square of a block of samples. Empty input yields 0.0.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let energy: f32 = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    energy.sqrt()
}

/// RMS level of a block of samples in decibels.
pub fn rms_db(samples: &[f32]) -> f32 {
    to_db(rms(samples))
}

/// Accumulates a running sum of squares so the RMS of a buffer can be computed
/// while its samples are produced one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsAccumulator {
    sum_squares: f64,
    count: usize,
}

impl RmsAccumulator {
    /// Add one sample
    #[inline]
    pub fn push(&mut self, sample: f32) {
        self.sum_squares += f64::from(sample) * f64::from(sample);
        self.count += 1;
    }

    /// Number of samples accumulated
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no samples were accumulated
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Linear RMS of everything accumulated so far
    pub fn rms(&self) -> f32 {
        if self.count == 0 {
            return 0.0;
        }
        (self.sum_squares / self.count as f64).sqrt() as f32
    }

    /// RMS in decibels
    pub fn rms_db(&self) -> f32 {
        to_db(self.rms())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zero_is_finite_floor() {
        assert_eq!(to_db(0.0), DB_FLOOR);
        assert!(to_db(0.0).is_finite());
        assert_eq!(rms_db(&[0.0; 64]), DB_FLOOR);
        assert_eq!(RmsAccumulator::default().rms_db(), DB_FLOOR);
    }

    #[test]
    fn test_nan_maps_to_floor() {
        assert_eq!(to_db(f32::NAN), DB_FLOOR);
    }

    #[test]
    fn test_unity_is_zero_db() {
        assert!(to_db(1.0).abs() < 1e-6);
        assert!((to_db(0.1) + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_rms_of_sine() {
        // Sine wave at 0.5 amplitude should give RMS of ~0.35
        let samples: Vec<f32> = (0..1000).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();
        let value = rms(&samples);
        assert!(value > 0.3 && value < 0.4, "RMS was {}", value);
    }

    #[test]
    fn test_accumulator_matches_block_rms() {
        let samples: Vec<f32> = (0..480).map(|i| (i as f32 * 0.05).cos() * 0.25).collect();
        let mut acc = RmsAccumulator::default();
        for &s in &samples {
            acc.push(s);
        }
        assert_eq!(acc.len(), samples.len());
        assert!((acc.rms() - rms(&samples)).abs() < 1e-5);
    }

    proptest! {
        #[test]
        fn prop_db_always_finite(magnitude in 0.0f32..10.0) {
            let db = to_db(magnitude);
            prop_assert!(db.is_finite());
            prop_assert!(db >= DB_FLOOR);
        }
    }
}
