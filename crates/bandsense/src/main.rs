//! BandSense - Dual-band loopback audio trigger detector
//!
//! Captures system audio, raises `sharp` (low band) and `subtle` (high band)
//! events on stdout, and optionally serves live metrics over HTTP.
//!
//! Usage: `bandsense [CONFIG] [--mock] [--list-devices]`

#![warn(missing_docs)]

mod demo;
mod logging_setup;

use anyhow::{bail, Context, Result};
use bandsense_control::{MetricsServer, MetricsServerConfig};
use bandsense_core::{
    AppConfig, AudioBackend, AudioMonitor, BandEvent, ChannelEventSink, MetricsPublisher,
    MetricsServerSettings, MockBackend, MonitorStatsSnapshot, SnapshotSlot, StreamFormat,
};
use crossbeam_channel::Receiver;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::{error, info, warn};

use crate::demo::DemoFeeder;

/// Events waiting for the host; the audio thread drops events beyond this
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Command line options
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config_path: Option<PathBuf>,
    mock: bool,
    list_devices: bool,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self> {
        let mut parsed = Self::default();
        for arg in args {
            match arg.as_str() {
                "--mock" => parsed.mock = true,
                "--list-devices" => parsed.list_devices = true,
                flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
                path => {
                    if parsed.config_path.is_some() {
                        bail!("Only one config path may be given");
                    }
                    parsed.config_path = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}

fn main() -> Result<()> {
    let args = CliArgs::parse(std::env::args().skip(1))?;
    let config = AppConfig::load(args.config_path.as_deref())
        .context("Failed to load configuration")?;
    let _log_guard = logging_setup::init(&config.log)?;

    info!("BandSense {} starting", env!("CARGO_PKG_VERSION"));

    if args.list_devices {
        return list_devices();
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("bandsense-rt")
        .build()
        .context("Failed to build async runtime")?;

    let publisher = if config.metrics.enabled {
        start_metrics_server(&runtime, &config.metrics)
    } else {
        None
    };

    let (sink, events) = ChannelEventSink::bounded(EVENT_QUEUE_CAPACITY);
    let drain = spawn_event_drain(events)?;

    let stats = if args.mock {
        let format = StreamFormat::new(48_000, 2);
        let backend = MockBackend::new(format);
        let feeder = backend.feeder();
        let mut monitor = AudioMonitor::new(backend, config.detector.clone(), Arc::new(sink))
            .with_publisher(publisher);
        monitor.start()?;
        let mut demo = DemoFeeder::spawn(feeder, format).context("Failed to start demo signal")?;
        info!("Running on a synthetic signal, press Ctrl+C to stop");
        wait_for_shutdown(&runtime);
        demo.stop();
        finish(monitor)
    } else {
        let backend = open_capture(config.audio_device.clone())?;
        let mut monitor = AudioMonitor::new(backend, config.detector.clone(), Arc::new(sink))
            .with_publisher(publisher);
        monitor
            .start()
            .context("Audio capture could not be started")?;
        info!("Listening, press Ctrl+C to stop");
        wait_for_shutdown(&runtime);
        finish(monitor)
    };

    // All senders are gone once the monitor is dropped
    if drain.join().is_err() {
        warn!("Event drain thread panicked");
    }

    info!(
        "Processed {} buffers ({} dropped), {} events ({} undelivered)",
        stats.buffers_processed, stats.buffers_dropped, stats.events_emitted, stats.sink_failures
    );
    runtime.shutdown_background();
    Ok(())
}

#[cfg(feature = "audio")]
fn open_capture(device: Option<String>) -> Result<impl AudioBackend> {
    bandsense_core::CpalBackend::new(device).map_err(|e| {
        error!("Failed to open audio device: {}", e);
        anyhow::Error::new(e).context("Failed to open audio device")
    })
}

#[cfg(not(feature = "audio"))]
fn open_capture(_device: Option<String>) -> Result<MockBackend> {
    bail!("Built without audio capture support, run with --mock")
}

#[cfg(feature = "audio")]
fn list_devices() -> Result<()> {
    match bandsense_core::CpalBackend::list_devices()? {
        Some(names) => {
            for name in names {
                println!("{}", name);
            }
        }
        None => warn!("No capture devices found"),
    }
    Ok(())
}

#[cfg(not(feature = "audio"))]
fn list_devices() -> Result<()> {
    bail!("Built without audio capture support")
}

/// Bind the metrics server; on failure the detector runs without publication
fn start_metrics_server(
    runtime: &Runtime,
    settings: &MetricsServerSettings,
) -> Option<Arc<dyn MetricsPublisher>> {
    let slot = Arc::new(SnapshotSlot::new());
    let config = MetricsServerConfig::from(settings);
    match runtime.block_on(MetricsServer::bind(config, slot.clone())) {
        Ok(server) => {
            let _task = runtime.spawn(async move {
                if let Err(e) = server.serve().await {
                    error!("Metrics server stopped: {}", e);
                }
            });
            Some(slot)
        }
        Err(e) => {
            warn!("Metrics server disabled: {}", e);
            None
        }
    }
}

fn spawn_event_drain(events: Receiver<BandEvent>) -> Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("bandsense-events".to_string())
        .spawn(move || {
            let stdout = std::io::stdout();
            let mut stdout_open = true;
            for event in events.iter() {
                info!("Event: {} ({} band)", event, event.band);
                if !stdout_open {
                    continue;
                }
                let mut out = stdout.lock();
                if writeln!(out, "{}", event).and_then(|_| out.flush()).is_err() {
                    warn!("stdout closed, events are only logged from now on");
                    stdout_open = false;
                }
            }
        })
        .context("Failed to spawn event thread")
}

fn wait_for_shutdown(runtime: &Runtime) {
    if let Err(e) = runtime.block_on(tokio::signal::ctrl_c()) {
        error!("Failed to listen for Ctrl+C: {}", e);
    }
    info!("Shutting down");
}

fn finish<B: AudioBackend>(mut monitor: AudioMonitor<B>) -> MonitorStatsSnapshot {
    monitor.stop();
    monitor.stats().snapshot()
}
