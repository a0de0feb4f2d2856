//! Metrics web server
//!
//! A read-only view of the latest [`bandsense_core::MetricsSnapshot`]. The
//! detector writes the snapshot slot; request handlers only ever load it.

pub mod page;
pub mod routes;
pub mod server;

pub use routes::build_router;
pub use server::{BoundMetricsServer, MetricsServer, MetricsServerConfig};
