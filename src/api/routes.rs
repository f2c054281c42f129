//! Application route configuration.

use axum::{
    extract::State, http::StatusCode, middleware, response::Json, routing::get, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::author_routes;
use super::metrics::{render, track_metrics};
use super::openapi::ApiDoc;
use super::AppState;

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(render))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(author_routes())
        .route_layer(middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

const DATABASE_UNREACHABLE: &str = "database unreachable";

async fn root() -> &'static str {
    "Welcome to Author API"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: ServiceStatus,
}

#[derive(Serialize)]
struct ServiceStatus {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Health check endpoint with database connectivity check
async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (code, response) = match state.health.ping().await {
        Ok(()) => (
            StatusCode::OK,
            HealthResponse {
                status: "healthy",
                database: ServiceStatus {
                    status: "healthy",
                    error: None,
                },
            },
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                HealthResponse {
                    status: "degraded",
                    database: ServiceStatus {
                        status: "unhealthy",
                        error: Some(DATABASE_UNREACHABLE.to_string()),
                    },
                },
            )
        }
    };

    (code, Json(response))
}
