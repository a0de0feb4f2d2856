//! Envelope Tracker - asymmetric attack/release smoothing
//!
//! Follows the magnitude of a band's filtered signal. Rising input is chased
//! with the attack coefficient (near-immediate response to onsets), falling
//! input with the much smaller release coefficient so the envelope reflects
//! sustained loudness instead of every zero crossing.

/// Per-band envelope follower
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeTracker {
    attack: f32,
    release: f32,
    value: f32,
}

impl EnvelopeTracker {
    /// Create a tracker. Both coefficients are clamped to `0.0..=1.0`.
    pub fn new(attack: f32, release: f32) -> Self {
        Self {
            attack: attack.clamp(0.0, 1.0),
            release: release.clamp(0.0, 1.0),
            value: 0.0,
        }
    }

    /// Feed one filtered sample and return the updated envelope
    #[inline]
    pub fn update(&mut self, sample: f32) -> f32 {
        let magnitude = sample.abs();
        let coeff = if magnitude > self.value {
            self.attack
        } else {
            self.release
        };
        self.value += coeff * (magnitude - self.value);
        // Guards against NaN input poisoning the state
        if !self.value.is_finite() || self.value < 0.0 {
            self.value = 0.0;
        }
        self.value
    }

    /// Current envelope (linear, never negative)
    pub fn value(&self) -> f32 {
        self.value
    }
}
