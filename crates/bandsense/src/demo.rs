//! Synthetic signal for running without a capture device
//!
//! Plays a short 100 Hz thump every half second and a quieter 3 kHz tick in
//! between, pushed through a [`MockFeeder`] in real time.

use bandsense_core::{MockFeeder, StreamFormat};
use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

/// Frames per pushed buffer (10 ms at 48 kHz)
const BUFFER_FRAMES: usize = 480;
const PERIOD_SECS: f32 = 0.5;
const BURST_SECS: f32 = 0.06;

/// Generator for the demo pattern
pub struct DemoSignal {
    format: StreamFormat,
    position: usize,
}

impl DemoSignal {
    /// Create a generator for a stream format
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            position: 0,
        }
    }

    fn sample_at(&self, index: usize) -> f32 {
        let rate = self.format.sample_rate as f32;
        let t = index as f32 / rate;
        let phase = t % PERIOD_SECS;
        let half = PERIOD_SECS / 2.0;
        if phase < BURST_SECS {
            let decay = 1.0 - phase / BURST_SECS;
            (2.0 * PI * 100.0 * t).sin() * 0.5 * decay
        } else if (half..half + BURST_SECS).contains(&phase) {
            let decay = 1.0 - (phase - half) / BURST_SECS;
            (2.0 * PI * 3000.0 * t).sin() * 0.15 * decay
        } else {
            0.0
        }
    }

    /// Next interleaved buffer
    pub fn next_buffer(&mut self, frames: usize) -> Vec<f32> {
        let channels = usize::from(self.format.channels.max(1));
        let mut out = Vec::with_capacity(frames * channels);
        for i in 0..frames {
            let value = self.sample_at(self.position + i);
            out.extend(std::iter::repeat(value).take(channels));
        }
        self.position += frames;
        out
    }
}

/// Feeds the demo signal until stopped
pub struct DemoFeeder {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DemoFeeder {
    /// Start feeding on a background thread
    pub fn spawn(feeder: MockFeeder, format: StreamFormat) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        let handle = thread::Builder::new()
            .name("bandsense-demo".to_string())
            .spawn(move || {
                let mut signal = DemoSignal::new(format);
                let interval = Duration::from_secs_f64(
                    BUFFER_FRAMES as f64 / f64::from(format.sample_rate.max(1)),
                );
                let mut next = Instant::now();
                while flag.load(Ordering::Relaxed) {
                    if !feeder.push_samples(&signal.next_buffer(BUFFER_FRAMES)) {
                        debug!("Demo capture stopped");
                        break;
                    }
                    next += interval;
                    thread::sleep(next.saturating_duration_since(Instant::now()));
                }
            })?;
        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the thread and wait for it
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DemoFeeder {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_layout() {
        let format = StreamFormat::new(48_000, 2);
        let mut signal = DemoSignal::new(format);
        let first = signal.next_buffer(480);
        assert_eq!(first.len(), 960);
        // Stereo frames are duplicated
        assert_eq!(first[2], first[3]);
        assert!(first.iter().any(|s| s.abs() > 0.1));

        // Quiet gap between bursts
        let mut gap = DemoSignal::new(format);
        gap.position = 48_000 / 10;
        assert!(gap.next_buffer(480).iter().all(|s| *s == 0.0));
    }
}
