//! Route definitions

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Json},
    routing::get,
    Router,
};
use bandsense_core::{MetricsSnapshot, SnapshotSlot};
use std::sync::Arc;

use super::page::CHART_PAGE;

/// Build the metrics router
pub fn build_router(slot: Arc<SnapshotSlot>) -> Router {
    Router::new()
        .route("/metrics", get(get_metrics))
        .fallback(get_page)
        .with_state(slot)
}

/// GET /metrics - latest snapshot, or an empty one stamped now
async fn get_metrics(State(slot): State<Arc<SnapshotSlot>>) -> impl IntoResponse {
    let snapshot: MetricsSnapshot = slot.latest_or_default();
    ([(header::CACHE_CONTROL, "no-store")], Json(snapshot))
}

/// Any other path - the live chart
async fn get_page() -> Html<&'static str> {
    Html(CHART_PAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use bandsense_core::MetricsPublisher;
    use tower::ServiceExt;

    async fn get(router: Router, uri: &str) -> (StatusCode, String, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn test_metrics_before_first_buffer() {
        let slot = Arc::new(SnapshotSlot::new());
        let (status, content_type, body) = get(build_router(slot), "/metrics").await;

        assert_eq!(status, StatusCode::OK);
        assert!(content_type.starts_with("application/json"));
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["LowTriggered"], false);
        assert_eq!(json["HighTriggered"], false);
        assert!(json["Timestamp"].as_str().is_some_and(|t| !t.is_empty()));
    }

    #[tokio::test]
    async fn test_metrics_returns_latest_snapshot() {
        let slot = Arc::new(SnapshotSlot::new());
        let mut snapshot = MetricsSnapshot::default();
        snapshot.low_env_db = -12.5;
        snapshot.low_triggered = true;
        slot.update(snapshot);

        let (_, _, body) = get(build_router(slot), "/metrics").await;
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["LowEnvDb"], -12.5);
        assert_eq!(json["LowTriggered"], true);
        for key in [
            "HighEnvDb",
            "LowNoiseDb",
            "HighNoiseDb",
            "LowThresholdDb",
            "HighThresholdDb",
        ] {
            assert!(json[key].is_number(), "missing {}", key);
        }
    }

    #[tokio::test]
    async fn test_other_paths_serve_chart() {
        let slot = Arc::new(SnapshotSlot::new());
        for uri in ["/", "/index.html", "/some/deep/path"] {
            let (status, content_type, body) = get(build_router(slot.clone()), uri).await;
            assert_eq!(status, StatusCode::OK);
            assert!(content_type.starts_with("text/html"));
            let html = String::from_utf8(body).unwrap();
            assert!(html.contains("/metrics"));
            assert!(html.contains("<canvas"));
        }
    }
}
