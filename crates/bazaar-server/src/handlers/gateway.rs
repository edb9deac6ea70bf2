use std::collections::BTreeMap;

use axum::{extract::State, Json};
use bazaar_core::{ApiResponse, GatewayStatus, ServiceInstance, ServiceRoutes};

use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/gateway/status",
    tag = "Gateway",
    responses((status = 200, description = "Gateway and per-service status", body = GatewayStatus))
)]
pub async fn gateway_status(State(state): State<AppState>) -> Json<ApiResponse<GatewayStatus>> {
    Json(ApiResponse::success(state.gateway.status()))
}

#[utoipa::path(
    get,
    path = "/api/gateway/services",
    tag = "Gateway",
    responses((status = 200, description = "Discovered instances per known service"))
)]
pub async fn registered_services(
    State(state): State<AppState>,
) -> Json<ApiResponse<BTreeMap<String, Vec<ServiceInstance>>>> {
    Json(ApiResponse::success(state.gateway.roster()))
}

#[utoipa::path(
    get,
    path = "/api/gateway/routes",
    tag = "Gateway",
    responses((status = 200, description = "Static route catalog", body = Vec<ServiceRoutes>))
)]
pub async fn available_routes(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ServiceRoutes>>> {
    Json(ApiResponse::success(state.gateway.routes()))
}
