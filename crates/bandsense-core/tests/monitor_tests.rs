use bandsense_core::{
    AudioMonitor, Band, BandEvent, ChannelEventSink, CoreError, DetectorConfig, EventSink,
    MockBackend, Result, SnapshotSlot, StreamFormat,
};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn sine(freq: f32, sample_rate: u32, channels: u16, start: usize, frames: usize) -> Vec<f32> {
    (start..start + frames)
        .flat_map(|i| {
            let v = (2.0 * PI * freq * i as f32 / sample_rate as f32).sin() * 0.3;
            std::iter::repeat(v).take(usize::from(channels))
        })
        .collect()
}

/// Sink that counts attempts and always refuses
#[derive(Default)]
struct RefusingSink {
    attempts: AtomicUsize,
}

impl EventSink for RefusingSink {
    fn emit(&self, _event: BandEvent) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        Err(CoreError::Sink("host is busy".to_string()))
    }
}

#[test]
fn test_end_to_end_bass_through_mock_capture() {
    let backend = MockBackend::new(StreamFormat::new(48_000, 2));
    let feeder = backend.feeder();
    let (sink, rx) = ChannelEventSink::bounded(64);
    let slot = Arc::new(SnapshotSlot::new());
    let mut monitor = AudioMonitor::new(backend, DetectorConfig::default(), Arc::new(sink))
        .with_publisher(Some(slot.clone()));

    monitor.start().unwrap();
    for i in 0..100 {
        assert!(feeder.push_samples(&sine(100.0, 48_000, 2, i * 480, 480)));
    }
    monitor.stop();

    let events: Vec<_> = rx.try_iter().collect();
    assert!(events.iter().any(|e| e.band == Band::Low));
    assert!(events.iter().all(|e| e.band == Band::Low));

    let stats = monitor.stats().snapshot();
    assert_eq!(stats.buffers_processed, 100);
    assert_eq!(stats.buffers_dropped, 0);
    assert_eq!(stats.events_emitted as usize, events.len());
    assert!(slot.latest().is_some());

    // Nothing is delivered once stopped
    assert!(!feeder.push_samples(&sine(100.0, 48_000, 2, 0, 480)));
}

#[test]
fn test_sample_rate_change_is_followed() {
    let backend = MockBackend::new(StreamFormat::new(48_000, 1));
    let feeder = backend.feeder();
    let (sink, rx) = ChannelEventSink::bounded(64);
    let mut monitor = AudioMonitor::new(backend, DetectorConfig::default(), Arc::new(sink));
    monitor.start().unwrap();

    assert!(feeder.push_samples(&sine(100.0, 48_000, 1, 0, 480)));
    let switched = StreamFormat::new(44_100, 1);
    for i in 0..10 {
        assert!(feeder.push_samples_with_format(switched, &sine(100.0, 44_100, 1, i * 441, 441)));
    }

    assert_eq!(monitor.stats().snapshot().buffers_processed, 11);
    assert!(rx.try_iter().all(|e| e.band == Band::Low));
}

#[test]
fn test_refusing_sink_does_not_stop_capture() {
    let backend = MockBackend::new(StreamFormat::new(48_000, 1));
    let feeder = backend.feeder();
    let sink = Arc::new(RefusingSink::default());
    let mut monitor = AudioMonitor::new(backend, DetectorConfig::default(), sink.clone());
    monitor.start().unwrap();

    for i in 0..20 {
        assert!(feeder.push_samples(&sine(100.0, 48_000, 1, i * 480, 480)));
    }

    let stats = monitor.stats().snapshot();
    assert_eq!(stats.buffers_processed, 20);
    assert!(stats.sink_failures >= 1);
    assert_eq!(stats.sink_failures, stats.events_emitted);
    // Each event was attempted exactly once
    assert_eq!(sink.attempts.load(Ordering::Relaxed) as u64, stats.events_emitted);
}

#[test]
fn test_restart_after_failed_start() {
    let mut backend = MockBackend::new(StreamFormat::new(48_000, 1));
    backend.set_fail_on_start(true);
    let (sink, _rx) = ChannelEventSink::bounded(4);
    let mut monitor = AudioMonitor::new(backend, DetectorConfig::default(), Arc::new(sink));

    let err = monitor.start().unwrap_err();
    assert!(matches!(err, CoreError::Capture(_)));
    assert!(!monitor.is_running());
    monitor.stop();
    assert!(!monitor.is_running());
}

#[test]
fn test_drop_stops_capture() {
    let backend = MockBackend::new(StreamFormat::new(48_000, 1));
    let feeder = backend.feeder();
    let (sink, _rx) = ChannelEventSink::bounded(4);
    let mut monitor = AudioMonitor::new(backend, DetectorConfig::default(), Arc::new(sink));
    monitor.start().unwrap();
    assert!(feeder.push_samples(&[0.0; 16]));
    drop(monitor);
    assert!(!feeder.push_samples(&[0.0; 16]));
}
