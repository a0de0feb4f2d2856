//! Dual-band detector - the per-buffer processing pipeline
//!
//! For every buffer:
//! 1. each mono sample runs through both band filters, and the filtered value
//!    updates that band's envelope and noise floor;
//! 2. the RMS of each band's filtered samples over the whole buffer gives the
//!    band level in dB;
//! 3. thresholds advance once from the current noise floors;
//! 4. the trigger detector picks at most one band to fire (Low first);
//! 5. a snapshot of the cycle is published.
//!
//! All state is a running filter, so dropping a buffer has no lasting effect.

use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace, warn};

use crate::audio::decode::decode_mono_into;
use crate::audio::StreamFormat;
use crate::band::{Band, BandSettings};
use crate::config::DetectorConfig;
use crate::envelope::EnvelopeTracker;
use crate::error::Result;
use crate::events::{BandEvent, EventSink};
use crate::filter::{filter_sample, BandFilter};
use crate::level::{to_db, RmsAccumulator};
use crate::noise_floor::NoiseFloorEstimator;
use crate::snapshot::{MetricsPublisher, MetricsSnapshot};
use crate::threshold::ThresholdCalculator;
use crate::trigger::{TriggerDetector, TriggerInput};

/// Mutable state owned by one band
#[derive(Debug, Clone)]
pub struct BandState {
    band: Band,
    settings: BandSettings,
    filter: Option<BandFilter>,
    envelope: EnvelopeTracker,
    noise: NoiseFloorEstimator,
    threshold: ThresholdCalculator,
    rms: RmsAccumulator,
}

impl BandState {
    fn new(band: Band, config: &DetectorConfig) -> Self {
        let settings = *config.band(band);
        Self {
            band,
            settings,
            filter: None,
            envelope: EnvelopeTracker::new(config.attack, config.release),
            noise: NoiseFloorEstimator::new(config.noise_smoothing, config.noise_decay_clamp),
            threshold: ThresholdCalculator::new(
                settings.min_threshold_db,
                config.margin_db,
                config.threshold_speed,
            ),
            rms: RmsAccumulator::default(),
        }
    }

    /// Rebuild the filter for a sample rate. On invalid parameters the band
    /// is left without a filter and reads as silence.
    fn configure(&mut self, sample_rate: u32) {
        match BandFilter::for_band(&self.settings, sample_rate) {
            Ok(filter) => {
                debug!(
                    "{} band filter: center={}Hz q={} sample_rate={}Hz",
                    self.band,
                    filter.center_hz(),
                    filter.q(),
                    filter.sample_rate()
                );
                self.filter = Some(filter);
            }
            Err(e) => {
                warn!("{} band filter disabled: {}", self.band, e);
                self.filter = None;
            }
        }
    }

    #[inline]
    fn process_sample(&mut self, sample: f32) {
        let filtered = filter_sample(self.filter.as_mut(), sample);
        let envelope = self.envelope.update(filtered);
        self.noise.update(envelope);
        self.rms.push(filtered);
    }

    /// Close the current buffer: returns (level dB, noise dB, threshold dB)
    fn finish_buffer(&mut self) -> (f32, f32, f32) {
        let level_db = self.rms.rms_db();
        self.rms = RmsAccumulator::default();
        let noise_db = to_db(self.noise.value());
        let threshold_db = self.threshold.update_db(noise_db);
        (level_db, noise_db, threshold_db)
    }

    /// Which band this state belongs to
    pub fn band(&self) -> Band {
        self.band
    }

    /// Whether a filter is configured
    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Current envelope (linear)
    pub fn envelope(&self) -> f32 {
        self.envelope.value()
    }

    /// Current noise floor (linear)
    pub fn noise_floor(&self) -> f32 {
        self.noise.value()
    }

    /// Current smoothed threshold in dB
    pub fn threshold_db(&self) -> f32 {
        self.threshold.value_db()
    }
}

/// Outcome of one processed buffer
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Values computed for this buffer
    pub snapshot: MetricsSnapshot,
    /// Band that fired, if any
    pub fired: Option<Band>,
    /// Whether the fired event reached the sink (`true` when nothing fired)
    pub delivered: bool,
}

/// The adaptive dual-band detector
pub struct DualBandDetector {
    low: BandState,
    high: BandState,
    trigger: TriggerDetector,
    sample_rate: Option<u32>,
    scratch: Vec<f32>,
    sink: Option<Arc<dyn EventSink>>,
    publisher: Option<Arc<dyn MetricsPublisher>>,
    total_samples: u64,
}

impl DualBandDetector {
    /// Create an unconfigured detector (filters absent until [`configure`](Self::configure))
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            low: BandState::new(Band::Low, config),
            high: BandState::new(Band::High, config),
            trigger: TriggerDetector::new(config.cooldown()),
            sample_rate: None,
            scratch: Vec::new(),
            sink: None,
            publisher: None,
            total_samples: 0,
        }
    }

    /// Attach the event sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Attach a metrics publisher; `None` disables publication
    pub fn with_publisher(mut self, publisher: Option<Arc<dyn MetricsPublisher>>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Build both band filters for the capture's sample rate
    pub fn configure(&mut self, sample_rate: u32) {
        self.low.configure(sample_rate);
        self.high.configure(sample_rate);
        self.sample_rate = Some(sample_rate);
    }

    /// Sample rate the filters are tuned for
    pub fn sample_rate(&self) -> Option<u32> {
        self.sample_rate
    }

    /// State of one band
    pub fn band_state(&self, band: Band) -> &BandState {
        match band {
            Band::Low => &self.low,
            Band::High => &self.high,
        }
    }

    /// Last fire instant of a band
    pub fn last_fired(&self, band: Band) -> Option<Instant> {
        self.trigger.last_fired(band)
    }

    /// Process one raw capture buffer.
    ///
    /// Filters are rebuilt first if the buffer's sample rate differs from the
    /// one they were tuned for. Zero-length buffers are a no-op and return
    /// `Ok(None)`. A malformed buffer is rejected before any state changes.
    pub fn process_buffer(
        &mut self,
        format: &StreamFormat,
        bytes: &[u8],
        now: Instant,
    ) -> Result<Option<CycleReport>> {
        if bytes.is_empty() {
            return Ok(None);
        }
        if self.sample_rate != Some(format.sample_rate) {
            if let Some(previous) = self.sample_rate {
                debug!(
                    "Sample rate changed {}Hz -> {}Hz, rebuilding filters",
                    previous, format.sample_rate
                );
            }
            self.configure(format.sample_rate);
        }

        let mut samples = std::mem::take(&mut self.scratch);
        let decoded = decode_mono_into(bytes, format.channels, &mut samples);
        let report = match decoded {
            Ok(()) => self.process_samples(&samples, now),
            Err(e) => {
                self.scratch = samples;
                return Err(e);
            }
        };
        self.scratch = samples;
        Ok(report)
    }

    /// Process a block of mono samples. Empty input is a no-op.
    pub fn process_samples(&mut self, samples: &[f32], now: Instant) -> Option<CycleReport> {
        if samples.is_empty() {
            return None;
        }

        for &sample in samples {
            self.low.process_sample(sample);
            self.high.process_sample(sample);
        }

        let (low_level, low_noise, low_threshold) = self.low.finish_buffer();
        let (high_level, high_noise, high_threshold) = self.high.finish_buffer();

        let fired = self.trigger.evaluate(
            TriggerInput {
                level_db: low_level,
                threshold_db: low_threshold,
            },
            TriggerInput {
                level_db: high_level,
                threshold_db: high_threshold,
            },
            now,
        );

        let delivered = match fired {
            Some(band) => self.emit(band),
            None => true,
        };

        let snapshot = MetricsSnapshot {
            timestamp: Utc::now(),
            low_env_db: low_level,
            high_env_db: high_level,
            low_noise_db: low_noise,
            high_noise_db: high_noise,
            low_threshold_db: low_threshold,
            high_threshold_db: high_threshold,
            low_triggered: fired == Some(Band::Low),
            high_triggered: fired == Some(Band::High),
        };
        if let Some(publisher) = &self.publisher {
            publisher.update(snapshot.clone());
        }

        self.log_progress(samples.len(), &snapshot);

        Some(CycleReport {
            snapshot,
            fired,
            delivered,
        })
    }

    fn emit(&self, band: Band) -> bool {
        let event = BandEvent::new(band);
        trace!("Trigger: {} ({} band)", event, band);
        match &self.sink {
            Some(sink) => match sink.emit(event) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to raise '{}': {}", event, e);
                    false
                }
            },
            None => true,
        }
    }

    fn log_progress(&mut self, count: usize, snapshot: &MetricsSnapshot) {
        let before = self.total_samples;
        self.total_samples += count as u64;
        // Roughly once per second of audio
        let period = u64::from(self.sample_rate.unwrap_or(48_000).max(1));
        if before / period != self.total_samples / period {
            debug!(
                "Detector: {}k samples, low {:.1}/{:.1} dB, high {:.1}/{:.1} dB (level/threshold)",
                self.total_samples / 1000,
                snapshot.low_env_db,
                snapshot.low_threshold_db,
                snapshot.high_env_db,
                snapshot.high_threshold_db
            );
        }
    }
}
