use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core decision logic: the route table, the guard, and sequential navigation.
pub mod guard;
pub mod navigation;
pub mod routes;

// Identity providers and their failure modes.
pub mod auth;
pub mod error;
pub mod identity;

// HTTP surface and configuration.
pub mod config;
pub mod handlers;
pub mod models;

// --- Public Re-exports ---

pub use config::AppConfig;
pub use guard::{Decision, Guard, RedirectTarget, decide};
pub use identity::{IdentityProvider, IdentityState, MockIdentityProvider};
pub use navigation::{NavigationOutcome, Navigator};
pub use routes::{AccessAttribute, RouteEntry, RouteTable, route_table};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
/// Page loads handled by the guarded fallback are not part of the API.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::list_routes, handlers::navigate),
    components(
        schemas(
            models::RouteSummary, models::MatchedRoute, models::NavigateRequest,
            models::NavigateResponse, models::DecisionKind, routes::AccessAttribute,
            guard::RedirectTarget,
        )
    ),
    tags(
        (name = "fleet-portal", description = "Fleet Portal navigation guard API")
    )
)]
struct ApiDoc;

/// GuardState
///
/// The concrete type used to share the navigation guard across the application state.
pub type GuardState = Arc<Guard>;

/// AppState
///
/// The single, immutable container shared by every request. The guard owns the
/// route table and the identity provider; configuration is consumed while wiring
/// them in `main`.
#[derive(Clone)]
pub struct AppState {
    pub guard: GuardState,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for GuardState {
    fn from_ref(app_state: &AppState) -> GuardState {
        app_state.guard.clone()
    }
}

/// create_router
///
/// Assembles the HTTP surface: health check, the JSON guard API, Swagger UI, and
/// the guarded fallback that handles every page load.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    // Header name constant for Request Correlation.
    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // GET /health
        // Unauthenticated liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        .route("/api/routes", get(handlers::list_routes))
        .route("/api/navigate", post(handlers::navigate))
        // Everything else is a page load and goes through the navigation guard.
        .fallback(handlers::guarded_view)
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span, tagged with the `x-request-id` set above so every
/// guard log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
