//! CPAL capture backend
//!
//! On Windows the default render device is opened as a WASAPI loopback input
//! so the detector hears what the system is playing. Other platforms have no
//! loopback in CPAL; there the named or default input device is used (route a
//! monitor source to it to follow system output).
//!
//! Every supported device sample type is converted to interleaved LE `f32`
//! bytes before it reaches the callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample, StreamConfig};
use tracing::{debug, info, warn};

use super::{AudioBackend, BufferCallback, CaptureError, StreamFormat};

/// Capture backend over the system audio host
pub struct CpalBackend {
    device: cpal::Device,
    loopback: bool,
    stream: Option<cpal::Stream>,
}

#[allow(deprecated)]
fn device_label(device: &cpal::Device) -> Option<String> {
    device.name().ok()
}

impl CpalBackend {
    /// List capture device names
    pub fn list_devices() -> Result<Option<Vec<String>>, CaptureError> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| CaptureError::NoDevice(e.to_string()))?;
        let names: Vec<String> = devices.filter_map(|d| device_label(&d)).collect();
        if names.is_empty() {
            Ok(None)
        } else {
            Ok(Some(names))
        }
    }

    /// Open a backend. `None` picks the loopback device on Windows and the
    /// default input elsewhere.
    pub fn new(device_name: Option<String>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        match device_name {
            Some(name) => {
                let mut devices = host
                    .input_devices()
                    .map_err(|e| CaptureError::NoDevice(e.to_string()))?;
                let device = devices
                    .find(|d| device_label(d).map(|n| n == name).unwrap_or(false))
                    .ok_or_else(|| {
                        CaptureError::NoDevice(format!("input device '{}' not found", name))
                    })?;
                Ok(Self {
                    device,
                    loopback: false,
                    stream: None,
                })
            }
            None => Self::default_device(&host),
        }
    }

    #[cfg(target_os = "windows")]
    fn default_device(host: &cpal::Host) -> Result<Self, CaptureError> {
        let device = host
            .default_output_device()
            .ok_or_else(|| CaptureError::NoDevice("no default output device".to_string()))?;
        Ok(Self {
            device,
            loopback: true,
            stream: None,
        })
    }

    #[cfg(not(target_os = "windows"))]
    fn default_device(host: &cpal::Host) -> Result<Self, CaptureError> {
        let device = host
            .default_input_device()
            .ok_or_else(|| CaptureError::NoDevice("no default input device".to_string()))?;
        Ok(Self {
            device,
            loopback: false,
            stream: None,
        })
    }

    fn build_stream<T>(
        &self,
        config: &StreamConfig,
        format: StreamFormat,
        mut callback: BufferCallback,
    ) -> Result<cpal::Stream, CaptureError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let mut scratch: Vec<u8> = Vec::new();
        let err_fn = |err| warn!("Audio stream error: {}", err);
        self.device
            .build_input_stream(
                config,
                move |data: &[T], _: &cpal::InputCallbackInfo| {
                    scratch.clear();
                    scratch.reserve(data.len() * 4);
                    for &sample in data {
                        let value: f32 = sample.to_sample();
                        scratch.extend_from_slice(&value.to_le_bytes());
                    }
                    callback(&format, &scratch);
                },
                err_fn,
                None,
            )
            .map_err(|e| CaptureError::Stream(e.to_string()))
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self, callback: BufferCallback) -> Result<StreamFormat, CaptureError> {
        if self.stream.is_some() {
            return Err(CaptureError::AlreadyRunning);
        }

        let supported = if self.loopback {
            self.device.default_output_config()
        } else {
            self.device.default_input_config()
        }
        .map_err(|e| CaptureError::UnsupportedFormat(e.to_string()))?;

        let sample_format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let format = StreamFormat::new(config.sample_rate, config.channels.max(1));

        debug!(
            "Capture config: format={:?} sample_rate={}Hz channels={} loopback={}",
            sample_format, format.sample_rate, format.channels, self.loopback
        );

        let stream = match sample_format {
            SampleFormat::F32 => self.build_stream::<f32>(&config, format, callback)?,
            SampleFormat::I16 => self.build_stream::<i16>(&config, format, callback)?,
            SampleFormat::U16 => self.build_stream::<u16>(&config, format, callback)?,
            SampleFormat::I32 => self.build_stream::<i32>(&config, format, callback)?,
            other => {
                return Err(CaptureError::UnsupportedFormat(format!(
                    "sample format {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
        info!("Capture started on '{}'", self.device_name());
        self.stream = Some(stream);
        Ok(format)
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        let result = stream
            .pause()
            .map_err(|e| CaptureError::Stream(e.to_string()));
        // Dropping the stream releases the device even if pausing failed
        drop(stream);
        result
    }

    fn is_running(&self) -> bool {
        self.stream.is_some()
    }

    fn device_name(&self) -> String {
        device_label(&self.device).unwrap_or_else(|| "Unknown Device".to_string())
    }
}
