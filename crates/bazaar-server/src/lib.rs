//! HTTP surface of the registry and the gateway views built on it.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;

use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::HeaderName,
    routing::{delete, get, post},
    Router,
};
use bazaar_core::{Gateway, SharedRegistry};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
    LatencyUnit,
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use handlers::{gateway, health, registry};

#[derive(Clone)]
pub struct AppState {
    pub registry: SharedRegistry,
    pub gateway: Arc<Gateway>,
    pub prometheus: Option<PrometheusHandle>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(registry: SharedRegistry, prometheus: Option<PrometheusHandle>) -> Self {
        Self {
            gateway: Arc::new(Gateway::new(registry.clone())),
            registry,
            prometheus,
            started_at: Instant::now(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        registry::register_service,
        registry::deregister_service,
        registry::discover_services,
        registry::get_service_instance,
        registry::list_services,
        gateway::gateway_status,
        gateway::registered_services,
        gateway::available_routes,
        health::health_check,
    ),
    components(
        schemas(
            bazaar_core::Registration,
            bazaar_core::ServiceInstance,
            bazaar_core::HealthStatus,
            bazaar_core::GatewayStatus,
            bazaar_core::ServiceSummary,
            bazaar_core::ServiceRoutes,
            health::HealthResponse,
        )
    ),
    tags(
        (name = "Registry", description = "Service registration and discovery"),
        (name = "Gateway", description = "Aggregated cross-service views"),
        (name = "Health", description = "Liveness")
    )
)]
pub struct ApiDoc;

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::render_metrics))
        .route("/api/registry/register", post(registry::register_service))
        .route(
            "/api/registry/deregister/:service_id",
            delete(registry::deregister_service),
        )
        .route(
            "/api/registry/discover/:service_name",
            get(registry::discover_services),
        )
        .route(
            "/api/registry/instance/:service_name",
            get(registry::get_service_instance),
        )
        .route("/api/registry/services", get(registry::list_services))
        .route("/api/gateway/status", get(gateway::gateway_status))
        .route("/api/gateway/services", get(gateway::registered_services))
        .route("/api/gateway/routes", get(gateway::available_routes))
        .with_state(state);

    with_request_middleware(router)
}

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Layers shared by every route. Each request carries an `x-request-id`,
/// kept when the caller sends one, echoed on the response and recorded on
/// its trace span. Handler panics render as failure envelopes.
pub fn with_request_middleware(router: Router) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    router
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    let request_id = request
                        .headers()
                        .get(REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        request_id = %request_id,
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                })
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
