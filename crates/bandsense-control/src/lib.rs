//! BandSense Control - Metrics HTTP surface
//!
//! Serves the detector's latest snapshot for live inspection:
//! - `GET /metrics` returns the snapshot as JSON
//! - every other path returns a page that polls `/metrics` and draws a rolling chart
//!
//! ## Feature Flags
//!
//! - `http-api`: Enable the web server (requires `axum`, `tower-http`)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bandsense_control::{MetricsServer, MetricsServerConfig};
//! use bandsense_core::SnapshotSlot;
//! use std::sync::Arc;
//!
//! # async fn run() -> bandsense_control::Result<()> {
//! let slot = Arc::new(SnapshotSlot::new());
//! let server = MetricsServer::bind(MetricsServerConfig::new(5005), slot).await?;
//! server.serve().await
//! # }
//! ```

#![warn(missing_docs)]

/// Error types
pub mod error;

/// Metrics web server
#[cfg(feature = "http-api")]
pub mod web;

pub use error::{ControlError, Result};

#[cfg(feature = "http-api")]
pub use web::{BoundMetricsServer, MetricsServer, MetricsServerConfig};
