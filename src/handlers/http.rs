//! HTTP distance API.
//!
//! Endpoints:
//! - `GET /health` — health check
//! - `GET /v1/users/{username}/distance?from=&to=` — distance travelled in
//!   meters, bounds as RFC3339 timestamps, both optional and inclusive
//!
//! Failures carry `{"error": "<kind>"}` with the status from
//! [`DomainError::http_status`].

use std::future::Future;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::{DomainError, ErrorBody, Result};
use crate::services::HistoryService;

/// Shared state for axum handlers.
type AppState = Arc<HistoryService>;

/// Serve the API on `listener` until `shutdown` resolves.
pub async fn serve(
    service: Arc<HistoryService>,
    listener: tokio::net::TcpListener,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    info!(addr = %listener.local_addr()?, "HTTP API listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown)
        .await
}

/// Build the axum router (separated for testing).
pub fn router(service: Arc<HistoryService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/users/:username/distance", get(distance))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.http_status();
        if status.is_server_error() {
            warn!(error = %self, "Request failed");
        }
        (status, Json(ErrorBody::from(&self))).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Default, Deserialize)]
struct DistanceParams {
    from: Option<String>,
    to: Option<String>,
}

#[derive(Debug, Serialize)]
struct DistanceResponse {
    distance: f64,
}

async fn distance(
    State(service): State<AppState>,
    Path(username): Path<String>,
    params: Option<Query<DistanceParams>>,
) -> Result<Json<DistanceResponse>> {
    let Query(params) = params.ok_or_else(|| DomainError::invalid_argument("malformed query"))?;
    let from = parse_bound("from", params.from.as_deref())?;
    let to = parse_bound("to", params.to.as_deref())?;

    let distance = service
        .get_distance_by_username(&username, from, to)
        .await?;

    Ok(Json(DistanceResponse { distance }))
}

fn parse_bound(name: &str, raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|e| DomainError::invalid_argument(format!("{name}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Point;
    use crate::interfaces::{AddRecordRequest, StaticUserDirectory};
    use crate::storage::MockHistoryRepository;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::TimeZone;
    use tower::ServiceExt;

    async fn app() -> Router {
        let repo = Arc::new(MockHistoryRepository::new());
        let users = Arc::new(StaticUserDirectory::default().with_user("alice", 1));
        let service = Arc::new(HistoryService::new(repo.clone(), users));

        service
            .add_record(AddRecordRequest::new(
                1,
                Point::new(0.0, 0.0),
                Point::new(0.0, 0.001),
                Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            ))
            .await
            .unwrap();

        router(service)
    }

    async fn fetch(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    #[tokio::test]
    async fn test_health() {
        let (status, _) = fetch(app().await, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_distance_ok() {
        let (status, json) = fetch(app().await, "/v1/users/alice/distance").await;

        assert_eq!(status, StatusCode::OK);
        let distance = json["distance"].as_f64().unwrap();
        assert!(distance > 100.0 && distance < 120.0, "{distance}");
    }

    #[tokio::test]
    async fn test_distance_with_window() {
        let (status, json) = fetch(
            app().await,
            "/v1/users/alice/distance?from=2024-01-01T13:00:00Z&to=2024-01-02T00:00:00Z&page=3",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["distance"].as_f64(), Some(0.0));
    }

    #[tokio::test]
    async fn test_unknown_user_is_404() {
        let (status, json) = fetch(app().await, "/v1/users/bob/distance").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, serde_json::json!({ "error": "not found" }));
    }

    #[tokio::test]
    async fn test_bad_timestamp_is_400() {
        let (status, json) = fetch(app().await, "/v1/users/alice/distance?from=yesterday").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, serde_json::json!({ "error": "invalid argument" }));
    }

    #[tokio::test]
    async fn test_inverted_window_is_400() {
        let (status, _) = fetch(
            app().await,
            "/v1/users/alice/distance?from=2024-01-02T00:00:00Z&to=2024-01-01T00:00:00Z",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_maps_to_500() {
        let response = DomainError::internal("db at 10.0.0.5 refused").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_bound_accepts_offsets() {
        let parsed = parse_bound("from", Some("2024-01-01T15:00:00+03:00"))
            .unwrap()
            .unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
        assert_eq!(parse_bound("to", Some("")).unwrap(), None);
    }
}
