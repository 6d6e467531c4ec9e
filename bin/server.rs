// Shipment Tracker - Tracking Server
// Accepts update records over HTTP and exposes the tracked shipments as JSON

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::path::Path as FsPath;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use shipment_tracker::config::DEFAULT_CONFIG_PATH;
use shipment_tracker::{
    load_config, logging, result_message, CalendarZone, SharedProcessor, TrackerView,
    TrackingError, TrackingProcessor,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    processor: SharedProcessor,
    zone: CalendarZone,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /update-shipment - Apply one raw update record
async fn update_shipment(State(state): State<AppState>, body: String) -> impl IntoResponse {
    let outcome = state.processor.lock().try_process(body.trim());

    let status = match &outcome {
        Ok(_) => StatusCode::OK,
        Err(TrackingError::ShipmentNotFound(_)) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::BAD_REQUEST,
    };

    (status, result_message(&outcome))
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/shipments - Ids of every known shipment
async fn list_shipments(State(state): State<AppState>) -> impl IntoResponse {
    let ids = state.processor.lock().shipment_ids();
    Json(ApiResponse::ok(ids))
}

/// GET /api/shipments/:id - Tracked view of one shipment
async fn get_shipment(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let processor = state.processor.lock();

    match processor.find_shipment(&id) {
        Some(shipment) => {
            let view = TrackerView::project(shipment, state.zone);
            (StatusCode::OK, Json(ApiResponse::ok(view))).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<TrackerView>::err(format!(
                "Shipment with ID '{}' not found.",
                id
            ))),
        )
            .into_response(),
    }
}

fn app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/shipments", get(list_shipments))
        .route("/shipments/:id", get(get_shipment))
        .with_state(state.clone());

    Router::new()
        .route("/update-shipment", post(update_shipment))
        .with_state(state)
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(FsPath::new(&config_path))?;
    logging::init(&config.log_filter);

    let state = AppState {
        processor: TrackingProcessor::new(config.rule_validator()).into_shared(),
        zone: config.calendar_zone(),
    };

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    tracing::info!(bind = %config.server.bind, "tracking server listening");

    axum::serve(listener, app(state))
        .await
        .context("Server terminated unexpectedly")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use shipment_tracker::RuleValidator;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        let zone = CalendarZone::utc();
        AppState {
            processor: TrackingProcessor::new(RuleValidator::new(zone)).into_shared(),
            zone,
        }
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, String) {
        let response = app(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn post_update(record: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/update-shipment")
            .header("content-type", "text/plain")
            .body(Body::from(record.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_update_shipment_statuses() {
        let state = test_state();

        let (status, body) = send(&state, post_update("created,S1,1700000000000,EXPRESS\n")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Success: Update processed for S1.");

        let (status, body) = send(&state, post_update("shipped,S9,1")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Error: Shipment S9 not found.");

        let (status, body) = send(&state, post_update("teleported,S1,2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Error: Unknown update type 'teleported'.");

        let (status, _) = send(&state, post_update("garbage")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_shipment_endpoints() {
        let state = test_state();
        send(&state, post_update("created,S2,1700000000000,BULK")).await;
        send(&state, post_update("created,S1,1700000000000")).await;
        send(&state, post_update("location,S1,1700000000001,Depot")).await;

        let (status, body) = send(&state, get_request("/api/shipments")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"], serde_json::json!(["S1", "S2"]));

        let (status, body) = send(&state, get_request("/api/shipments/S1")).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["data"]["status"], "Created");
        assert_eq!(json["data"]["current_location"], "Depot");

        let (status, body) = send(&state, get_request("/api/shipments/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&test_state(), get_request("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"OK\""));
    }
}
