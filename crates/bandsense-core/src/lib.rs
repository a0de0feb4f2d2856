//! BandSense Core - Adaptive dual-band audio event detection
//!
//! This crate contains the signal path and its surroundings:
//! - Band filters, envelope and noise floor tracking
//! - Adaptive thresholds and the cooldown-gated trigger
//! - Per-buffer metrics snapshots
//! - Capture backends and the monitor lifecycle
//! - Configuration and logging settings

#![warn(missing_docs)]

// Signal path
pub mod band;
pub mod envelope;
pub mod filter;
pub mod level;
pub mod noise_floor;
pub mod threshold;
pub mod trigger;

// Pipeline
pub mod audio;
pub mod detector;
pub mod events;
pub mod monitor;
pub mod snapshot;

// Ambient
pub mod config;
pub mod error;
pub mod logging;

// --- Re-exports grouped by category ---

// Signal path
pub use band::{Band, BandSettings};
pub use envelope::EnvelopeTracker;
pub use filter::{filter_sample, BandFilter};
pub use level::{rms_db, to_db, RmsAccumulator, DB_EPSILON, DB_FLOOR};
pub use noise_floor::NoiseFloorEstimator;
pub use threshold::ThresholdCalculator;
pub use trigger::{CooldownGate, TriggerDetector, TriggerInput};

// Pipeline
#[cfg(feature = "audio")]
pub use audio::backend::cpal_backend::CpalBackend;
pub use audio::backend::mock::{MockBackend, MockFeeder};
pub use audio::{AudioBackend, BufferCallback, CaptureError, StreamFormat};
pub use detector::{BandState, CycleReport, DualBandDetector};
pub use events::{BandEvent, ChannelEventSink, EventSink};
pub use monitor::{AudioMonitor, MonitorStats, MonitorStatsSnapshot};
pub use snapshot::{MetricsPublisher, MetricsSnapshot, SnapshotSlot};

// Configuration
pub use config::{AppConfig, DetectorConfig, MetricsServerSettings};
pub use error::{CoreError, Result};
pub use logging::LogConfig;
