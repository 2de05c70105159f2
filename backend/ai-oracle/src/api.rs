//! Axum REST API handlers.

use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub const SERVICE_NAME: &str = "AI Oracle";

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ActionResponse {
    pub proposal_id: u64,
    pub status: &'static str,
}

// ─────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────

pub fn router() -> Router {
    Router::new()
        .route("/", get(health))
        .route("/action/update-risk/:proposal_id", post(trigger_risk_update))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        service: SERVICE_NAME,
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /action/update-risk/:proposal_id`
///
/// Acknowledges the trigger. Proposal features are not available to this
/// service yet, so nothing is scored or submitted.
pub async fn trigger_risk_update(Path(proposal_id): Path<u64>) -> impl IntoResponse {
    info!("Risk update requested for proposal {proposal_id}");
    (
        StatusCode::ACCEPTED,
        Json(ActionResponse {
            proposal_id,
            status: "accepted",
        }),
    )
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    async fn send(method: Method, uri: &str) -> (StatusCode, Option<Value>) {
        let response = router()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).ok())
    }

    #[tokio::test]
    async fn health_reports_service_status() {
        let (status, body) = send(Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);

        let body = body.unwrap();
        assert_eq!(body["service"], "AI Oracle");
        assert_eq!(body["status"], "running");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn risk_trigger_is_acknowledged() {
        let (status, body) = send(Method::POST, "/action/update-risk/1").await;
        assert_eq!(status, StatusCode::ACCEPTED);

        let body = body.unwrap();
        assert_eq!(body["proposal_id"], 1);
        assert_eq!(body["status"], "accepted");
    }

    #[tokio::test]
    async fn non_numeric_proposal_id_is_rejected() {
        let (status, _) = send(Method::POST, "/action/update-risk/first").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn risk_trigger_requires_post() {
        let (status, _) = send(Method::GET, "/action/update-risk/1").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }
}
