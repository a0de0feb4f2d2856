//! Noise Floor Estimator - slow follow of the ambient envelope
//!
//! The estimate creeps toward the envelope with a very small smoothing
//! coefficient. Rises are unrestricted. Falls are limited to
//! `previous * decay_clamp` per sample so a sudden near-silence cannot drag the
//! floor down and leave the detector oversensitive right afterwards.

/// Per-band noise floor estimate
#[derive(Debug, Clone, Copy)]
pub struct NoiseFloorEstimator {
    smoothing: f32,
    decay_clamp: f32,
    value: f32,
}

impl NoiseFloorEstimator {
    /// Create an estimator. `smoothing` and `decay_clamp` are clamped to `0.0..=1.0`.
    pub fn new(smoothing: f32, decay_clamp: f32) -> Self {
        Self {
            smoothing: smoothing.clamp(0.0, 1.0),
            decay_clamp: decay_clamp.clamp(0.0, 1.0),
            value: 0.0,
        }
    }

    /// Move the estimate toward the current envelope
    #[inline]
    pub fn update(&mut self, envelope: f32) -> f32 {
        let envelope = if envelope.is_finite() {
            envelope.max(0.0)
        } else {
            0.0
        };
        let smoothed = self.value + self.smoothing * (envelope - self.value);
        let lower_bound = self.value * self.decay_clamp;
        self.value = smoothed.max(lower_bound);
        self.value
    }

    /// Current estimate (linear, never negative)
    pub fn value(&self) -> f32 {
        self.value
    }
}
