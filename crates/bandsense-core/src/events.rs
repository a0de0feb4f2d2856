//! Event sink - where trigger events are raised

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::fmt;

use crate::band::Band;
use crate::error::{CoreError, Result};

/// A named, parameterless trigger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BandEvent {
    /// Band that fired
    pub band: Band,
}

impl BandEvent {
    /// Event for a band
    pub fn new(band: Band) -> Self {
        Self { band }
    }

    /// Event identifier raised into the host (`sharp` or `subtle`)
    pub fn name(&self) -> &'static str {
        self.band.event_name()
    }
}

impl fmt::Display for BandEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Receives trigger events from the audio thread.
///
/// `emit` runs on the hot path and must not block. Failures are logged by the
/// caller and never retried.
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: BandEvent) -> Result<()>;
}

/// Sink backed by a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    sender: Sender<BandEvent>,
}

impl ChannelEventSink {
    /// Create a sink and the receiver the host drains
    pub fn bounded(capacity: usize) -> (Self, Receiver<BandEvent>) {
        let (sender, receiver) = bounded(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: BandEvent) -> Result<()> {
        self.sender.try_send(event).map_err(|e| match e {
            TrySendError::Full(ev) => CoreError::Sink(format!("event queue full, dropped {}", ev)),
            TrySendError::Disconnected(ev) => {
                CoreError::Sink(format!("event receiver gone, dropped {}", ev))
            }
        })
    }
}
