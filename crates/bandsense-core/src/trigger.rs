//! Trigger Detector - threshold crossing with a refractory period
//!
//! Not an edge detector: a band re-fires every cycle its level stays at or
//! above the threshold, as soon as its cooldown has elapsed. Within a single
//! cycle at most one band fires. Low is checked first and, when it fires,
//! High is not evaluated at all (its cooldown timer is left untouched).

use std::time::{Duration, Instant};

use crate::band::Band;

/// Level and threshold of one band for the current cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerInput {
    /// Buffer RMS level in dB
    pub level_db: f32,
    /// Smoothed threshold in dB
    pub threshold_db: f32,
}

impl TriggerInput {
    /// Whether the level reaches the threshold
    pub fn crosses(&self) -> bool {
        self.level_db >= self.threshold_db
    }
}

/// Last-fire bookkeeping for one band
#[derive(Debug, Clone, Copy, Default)]
pub struct CooldownGate {
    /// `None` until the band fires for the first time
    last_fired: Option<Instant>,
}

impl CooldownGate {
    /// Whether enough time passed since the last fire
    pub fn is_open(&self, now: Instant, cooldown: Duration) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= cooldown,
        }
    }

    /// Record a fire at `now`
    pub fn mark(&mut self, now: Instant) {
        self.last_fired = Some(now);
    }

    /// Instant of the last fire, if any
    pub fn last_fired(&self) -> Option<Instant> {
        self.last_fired
    }
}

/// Decides which band, if any, fires in a processing cycle
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    cooldown: Duration,
    low: CooldownGate,
    high: CooldownGate,
}

impl TriggerDetector {
    /// Create a detector with the given per-band cooldown
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            low: CooldownGate::default(),
            high: CooldownGate::default(),
        }
    }

    /// Evaluate one cycle. Returns the band that fired, after recording its timestamp.
    pub fn evaluate(
        &mut self,
        low: TriggerInput,
        high: TriggerInput,
        now: Instant,
    ) -> Option<Band> {
        if low.crosses() && self.low.is_open(now, self.cooldown) {
            self.low.mark(now);
            return Some(Band::Low);
        }
        if high.crosses() && self.high.is_open(now, self.cooldown) {
            self.high.mark(now);
            return Some(Band::High);
        }
        None
    }

    /// Last fire instant of a band
    pub fn last_fired(&self, band: Band) -> Option<Instant> {
        self.gate(band).last_fired()
    }

    fn gate(&self, band: Band) -> &CooldownGate {
        match band {
            Band::Low => &self.low,
            Band::High => &self.high,
        }
    }
}
