//! Manually driven backend
//!
//! Buffers are pushed through a [`MockFeeder`] and delivered synchronously on
//! the caller's thread, which makes the whole pipeline deterministic in tests.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::{AudioBackend, BufferCallback, CaptureError, StreamFormat};
use crate::audio::decode::encode_f32_le;

#[derive(Default)]
struct Shared {
    callback: Option<BufferCallback>,
    format: Option<StreamFormat>,
}

/// Backend fed by hand
pub struct MockBackend {
    format: StreamFormat,
    fail_on_start: bool,
    fail_on_stop: bool,
    shared: Arc<Mutex<Shared>>,
    starts: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a backend that reports `format` on start
    pub fn new(format: StreamFormat) -> Self {
        Self {
            format,
            fail_on_start: false,
            fail_on_stop: false,
            shared: Arc::new(Mutex::new(Shared::default())),
            starts: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Make `start` fail as if the device were unavailable
    pub fn failing_start(mut self) -> Self {
        self.fail_on_start = true;
        self
    }

    /// Make `stop` report an error (the stream is still released)
    pub fn failing_stop(mut self) -> Self {
        self.fail_on_stop = true;
        self
    }

    /// Let subsequent `start` calls succeed or fail
    pub fn set_fail_on_start(&mut self, fail: bool) {
        self.fail_on_start = fail;
    }

    /// Handle used to push buffers
    pub fn feeder(&self) -> MockFeeder {
        MockFeeder {
            shared: self.shared.clone(),
        }
    }

    /// Number of streams opened so far
    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::Relaxed)
    }
}

impl AudioBackend for MockBackend {
    fn start(&mut self, callback: BufferCallback) -> Result<StreamFormat, CaptureError> {
        if self.fail_on_start {
            return Err(CaptureError::NoDevice("mock device unavailable".to_string()));
        }
        let mut shared = self.shared.lock();
        if shared.callback.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }
        shared.callback = Some(callback);
        shared.format = Some(self.format);
        self.starts.fetch_add(1, Ordering::Relaxed);
        Ok(self.format)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let mut shared = self.shared.lock();
        shared.callback = None;
        shared.format = None;
        if self.fail_on_stop {
            return Err(CaptureError::Stream("mock stop failure".to_string()));
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.shared.lock().callback.is_some()
    }

    fn device_name(&self) -> String {
        "mock".to_string()
    }
}

/// Pushes buffers into a running [`MockBackend`]
#[derive(Clone)]
pub struct MockFeeder {
    shared: Arc<Mutex<Shared>>,
}

impl MockFeeder {
    /// Deliver raw bytes. Returns `false` when no stream is running.
    pub fn push_bytes(&self, bytes: &[u8]) -> bool {
        let mut shared = self.shared.lock();
        let Some(format) = shared.format else {
            return false;
        };
        match shared.callback.as_mut() {
            Some(callback) => {
                callback(&format, bytes);
                true
            }
            None => false,
        }
    }

    /// Deliver interleaved samples
    pub fn push_samples(&self, samples: &[f32]) -> bool {
        let mut bytes = Vec::with_capacity(samples.len() * 4);
        encode_f32_le(samples, &mut bytes);
        self.push_bytes(&bytes)
    }

    /// Deliver samples under a different format, as after a device change
    pub fn push_samples_with_format(&self, format: StreamFormat, samples: &[f32]) -> bool {
        let mut bytes = Vec::with_capacity(samples.len() * 4);
        encode_f32_le(samples, &mut bytes);
        let mut shared = self.shared.lock();
        if shared.format.is_none() {
            return false;
        }
        shared.format = Some(format);
        match shared.callback.as_mut() {
            Some(callback) => {
                callback(&format, &bytes);
                true
            }
            None => false,
        }
    }
}
