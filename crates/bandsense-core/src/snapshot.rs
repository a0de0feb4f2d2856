//! Metrics Snapshot - per-buffer record of the detector's computed values
//!
//! The detector produces one snapshot per processed buffer and hands it to an
//! optional [`MetricsPublisher`]. The shipped publisher, [`SnapshotSlot`], only
//! keeps the latest value and swaps it atomically so readers on other threads
//! never observe a partially written snapshot.

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::band::Band;
use crate::level::DB_FLOOR;

/// Immutable record of one processing cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricsSnapshot {
    /// Wall-clock time the buffer was processed
    pub timestamp: DateTime<Utc>,
    /// Low band level (buffer RMS) in dB
    pub low_env_db: f32,
    /// High band level (buffer RMS) in dB
    pub high_env_db: f32,
    /// Low band noise floor in dB
    pub low_noise_db: f32,
    /// High band noise floor in dB
    pub high_noise_db: f32,
    /// Low band smoothed threshold in dB
    pub low_threshold_db: f32,
    /// High band smoothed threshold in dB
    pub high_threshold_db: f32,
    /// Low band fired this cycle
    pub low_triggered: bool,
    /// High band fired this cycle
    pub high_triggered: bool,
}

impl MetricsSnapshot {
    /// Snapshot reported before any buffer was processed: current time, levels at the floor
    pub fn empty_at(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            low_env_db: DB_FLOOR,
            high_env_db: DB_FLOOR,
            low_noise_db: DB_FLOOR,
            high_noise_db: DB_FLOOR,
            low_threshold_db: DB_FLOOR,
            high_threshold_db: DB_FLOOR,
            low_triggered: false,
            high_triggered: false,
        }
    }

    /// Whether the given band fired in this snapshot's cycle
    pub fn triggered(&self, band: Band) -> bool {
        match band {
            Band::Low => self.low_triggered,
            Band::High => self.high_triggered,
        }
    }

    /// Band that fired, if any
    pub fn fired_band(&self) -> Option<Band> {
        Band::ALL.into_iter().find(|&band| self.triggered(band))
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::empty_at(Utc::now())
    }
}

/// Receives the latest snapshot after every buffer.
///
/// Called on the audio thread: implementations must not block.
pub trait MetricsPublisher: Send + Sync {
    /// Replace the latest snapshot
    fn update(&self, snapshot: MetricsSnapshot);
}

/// Lock-free "latest value" slot shared between the audio thread and readers
#[derive(Debug, Default)]
pub struct SnapshotSlot {
    latest: ArcSwapOption<MetricsSnapshot>,
}

impl SnapshotSlot {
    /// Create an empty slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot, if any
    pub fn latest(&self) -> Option<Arc<MetricsSnapshot>> {
        self.latest.load_full()
    }

    /// Latest snapshot, or an empty one stamped with the current time
    pub fn latest_or_default(&self) -> MetricsSnapshot {
        match self.latest() {
            Some(snapshot) => (*snapshot).clone(),
            None => MetricsSnapshot::default(),
        }
    }

    /// Drop the stored snapshot
    pub fn clear(&self) {
        self.latest.store(None);
    }
}

impl MetricsPublisher for SnapshotSlot {
    fn update(&self, snapshot: MetricsSnapshot) {
        self.latest.store(Some(Arc::new(snapshot)));
    }
}
