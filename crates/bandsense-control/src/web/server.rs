//! Axum HTTP server

use axum::http::{header, HeaderValue};
use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use bandsense_core::{MetricsServerSettings, SnapshotSlot};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;

use super::routes::build_router;
use crate::{error::ControlError, Result};

/// Metrics server configuration
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MetricsServerConfig {
    /// Interface to bind
    pub host: String,
    /// TCP port, 0 picks a free one
    pub port: u16,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            // Local only; the page is a debugging aid
            host: "127.0.0.1".to_string(),
            port: 5005,
        }
    }
}

impl MetricsServerConfig {
    /// Create a config for a port on localhost
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Set the host address
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ControlError::HttpError(format!("Invalid address: {}", e)))
    }
}

impl From<&MetricsServerSettings> for MetricsServerConfig {
    fn from(settings: &MetricsServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}

/// Entry point for the metrics server
pub struct MetricsServer;

impl MetricsServer {
    /// Build the full application: routes, panic isolation and security headers
    pub fn app(slot: Arc<SnapshotSlot>) -> Router {
        build_router(slot)
            .layer(middleware::from_fn(security_headers))
            .layer(CatchPanicLayer::new())
    }

    /// Bind the listener. Fails when the address is invalid or in use.
    pub async fn bind(
        config: MetricsServerConfig,
        slot: Arc<SnapshotSlot>,
    ) -> Result<BoundMetricsServer> {
        let addr = config.socket_addr()?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ControlError::HttpError(format!("Failed to bind {}: {}", addr, e)))?;
        let local_addr = listener.local_addr()?;
        Ok(BoundMetricsServer {
            listener,
            local_addr,
            app: Self::app(slot),
        })
    }
}

/// A bound, not yet serving, metrics server
pub struct BoundMetricsServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    app: Router,
}

impl BoundMetricsServer {
    /// Address actually bound (resolves port 0)
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests
    pub async fn serve(self) -> Result<()> {
        tracing::info!("Metrics server listening on http://{}", self.local_addr);
        axum::serve(self.listener, self.app.into_make_service())
            .await
            .map_err(|e| ControlError::HttpError(format!("Server error: {}", e)))
    }

    /// Spawn the server in a background task
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.serve().await })
    }
}

/// Security headers middleware
async fn security_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // Prevent MIME sniffing
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // Prevent clickjacking
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("no-referrer"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[test]
    fn test_config_from_settings() {
        let settings = MetricsServerSettings::default();
        let config = MetricsServerConfig::from(&settings);
        assert_eq!(config, MetricsServerConfig::default());
        assert_eq!(config.port, 5005);
        assert_eq!(config.host, "127.0.0.1");

        let config = MetricsServerConfig::new(9000).with_host("0.0.0.0".to_string());
        assert_eq!(config.socket_addr().unwrap().port(), 9000);
    }

    #[test]
    fn test_invalid_host_rejected() {
        let config = MetricsServerConfig::new(80).with_host("not a host".to_string());
        assert!(config.socket_addr().is_err());
    }

    #[tokio::test]
    async fn test_security_headers() {
        let app = MetricsServer::app(Arc::new(SnapshotSlot::new()));
        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers
                .get("X-Content-Type-Options")
                .and_then(|h| h.to_str().ok()),
            Some("nosniff")
        );
        assert_eq!(
            headers.get("X-Frame-Options").and_then(|h| h.to_str().ok()),
            Some("DENY")
        );
        assert_eq!(
            headers.get("Referrer-Policy").and_then(|h| h.to_str().ok()),
            Some("no-referrer")
        );
    }

    async fn faulty_handler() -> &'static str {
        panic!("handler fault")
    }

    #[tokio::test]
    async fn test_panicking_handler_is_isolated() {
        let app = Router::new()
            .route("/boom", axum::routing::get(faulty_handler))
            .route("/ok", axum::routing::get(|| async { "ok" }))
            .layer(CatchPanicLayer::new());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        // The service keeps answering
        let response = app
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bind_conflict_reported() {
        let slot = Arc::new(SnapshotSlot::new());
        let first = MetricsServer::bind(MetricsServerConfig::new(0), slot.clone())
            .await
            .unwrap();
        let taken = MetricsServerConfig::new(first.local_addr().port());
        let err = MetricsServer::bind(taken, slot).await;
        assert!(matches!(err, Err(ControlError::HttpError(_))));
    }

    #[tokio::test]
    async fn test_serves_over_tcp() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let server = MetricsServer::bind(MetricsServerConfig::new(0), Arc::new(SnapshotSlot::new()))
            .await
            .unwrap();
        let addr = server.local_addr();
        let handle = server.spawn();

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200"));
        assert!(response.contains("\"LowTriggered\":false"));

        handle.abort();
    }
}
