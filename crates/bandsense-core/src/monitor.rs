//! Capture lifecycle
//!
//! [`AudioMonitor`] owns a capture backend and wires each buffer it delivers
//! into a fresh [`DualBandDetector`]. Faults inside one buffer are contained
//! to that buffer: the next one is processed normally.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::audio::{AudioBackend, BufferCallback, StreamFormat};
use crate::config::DetectorConfig;
use crate::detector::{CycleReport, DualBandDetector};
use crate::error::Result;
use crate::events::EventSink;
use crate::snapshot::MetricsPublisher;

/// Counters updated from the capture thread
#[derive(Debug, Default)]
pub struct MonitorStats {
    buffers_processed: AtomicU64,
    buffers_dropped: AtomicU64,
    events_emitted: AtomicU64,
    sink_failures: AtomicU64,
}

/// Point-in-time copy of [`MonitorStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStatsSnapshot {
    /// Buffers that completed a detection cycle
    pub buffers_processed: u64,
    /// Buffers discarded because they were malformed or processing faulted
    pub buffers_dropped: u64,
    /// Trigger events raised
    pub events_emitted: u64,
    /// Events the sink refused
    pub sink_failures: u64,
}

impl MonitorStats {
    fn record(&self, report: &CycleReport) {
        self.buffers_processed.fetch_add(1, Ordering::Relaxed);
        if report.fired.is_some() {
            self.events_emitted.fetch_add(1, Ordering::Relaxed);
            if !report.delivered {
                self.sink_failures.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn record_dropped(&self) {
        self.buffers_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters
    pub fn snapshot(&self) -> MonitorStatsSnapshot {
        MonitorStatsSnapshot {
            buffers_processed: self.buffers_processed.load(Ordering::Relaxed),
            buffers_dropped: self.buffers_dropped.load(Ordering::Relaxed),
            events_emitted: self.events_emitted.load(Ordering::Relaxed),
            sink_failures: self.sink_failures.load(Ordering::Relaxed),
        }
    }
}

/// Starts and stops capture and runs detection on every buffer
pub struct AudioMonitor<B: AudioBackend> {
    backend: B,
    config: DetectorConfig,
    sink: Arc<dyn EventSink>,
    publisher: Option<Arc<dyn MetricsPublisher>>,
    stats: Arc<MonitorStats>,
    format: Option<StreamFormat>,
}

impl<B: AudioBackend> AudioMonitor<B> {
    /// Create a stopped monitor
    pub fn new(backend: B, config: DetectorConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            backend,
            config,
            sink,
            publisher: None,
            stats: Arc::new(MonitorStats::default()),
            format: None,
        }
    }

    /// Publish a snapshot per buffer; `None` turns publication off
    pub fn with_publisher(mut self, publisher: Option<Arc<dyn MetricsPublisher>>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Begin capture. Calling this while running does nothing.
    ///
    /// If the capture stream cannot be started, any partial setup is torn
    /// down, the monitor stays stopped and the error is returned.
    pub fn start(&mut self) -> Result<()> {
        if self.format.is_some() {
            debug!("Audio monitor already running");
            return Ok(());
        }

        let detector = DualBandDetector::new(&self.config)
            .with_sink(self.sink.clone())
            .with_publisher(self.publisher.clone());
        let callback = Self::buffer_callback(detector, self.stats.clone());

        match self.backend.start(callback) {
            Ok(format) => {
                info!(
                    "Audio monitor started on '{}' ({}Hz, {} ch)",
                    self.backend.device_name(),
                    format.sample_rate,
                    format.channels
                );
                self.format = Some(format);
                Ok(())
            }
            Err(e) => {
                error!("Failed to start audio capture: {}", e);
                if let Err(teardown) = self.backend.stop() {
                    warn!("Capture teardown after failed start: {}", teardown);
                }
                self.format = None;
                Err(e.into())
            }
        }
    }

    fn buffer_callback(mut detector: DualBandDetector, stats: Arc<MonitorStats>) -> BufferCallback {
        Box::new(move |format: &StreamFormat, bytes: &[u8]| {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                detector.process_buffer(format, bytes, Instant::now())
            }));
            match outcome {
                Ok(Ok(Some(report))) => stats.record(&report),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    warn!("Dropping audio buffer: {}", e);
                    stats.record_dropped();
                }
                Err(_) => {
                    error!("Audio buffer processing panicked, buffer dropped");
                    stats.record_dropped();
                }
            }
        })
    }

    /// End capture. Calling this while stopped does nothing; a failing
    /// backend is logged and the monitor still ends up stopped.
    pub fn stop(&mut self) {
        if self.format.take().is_none() {
            return;
        }
        match self.backend.stop() {
            Ok(()) => info!("Audio monitor stopped"),
            Err(e) => warn!("Error while stopping audio capture: {}", e),
        }
    }

    /// Whether capture is active
    pub fn is_running(&self) -> bool {
        self.format.is_some()
    }

    /// Format negotiated by the running stream
    pub fn format(&self) -> Option<StreamFormat> {
        self.format
    }

    /// Shared counters
    pub fn stats(&self) -> Arc<MonitorStats> {
        self.stats.clone()
    }

    /// Detector settings used on the next start
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The capture backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: AudioBackend> Drop for AudioMonitor<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
