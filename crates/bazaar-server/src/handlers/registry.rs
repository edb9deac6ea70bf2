//! Registry endpoints used by domain services to join and find each other.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};
use bazaar_core::{ApiResponse, Registration, ServiceInstance};
use tracing::info;

use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::AppState;

#[utoipa::path(
    post,
    path = "/api/registry/register",
    tag = "Registry",
    request_body = Registration,
    responses(
        (status = 200, description = "Service registered successfully"),
        (status = 400, description = "Malformed body or missing service name or id"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_service(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Registration>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let service_name = payload.service_name.clone();
    let registered = state.registry.register(payload)?;
    if !registered {
        return Err(ApiError::BadRequest("Failed to register service".to_string()));
    }

    metrics::counter!("registry_registrations_total").increment(1);
    info!(service_name = %service_name, "Service registration accepted");
    Ok(Json(ApiResponse::success_with_message(
        true,
        "Service registered successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/registry/deregister/{service_id}",
    tag = "Registry",
    params(("service_id" = String, Path, description = "Instance id")),
    responses(
        (status = 200, description = "Service deregistered successfully"),
        (status = 404, description = "Service not found")
    )
)]
pub async fn deregister_service(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let removed = state.registry.deregister(&service_id)?;
    let result = if removed { "removed" } else { "missing" };
    metrics::counter!("registry_deregistrations_total", "result" => result).increment(1);

    if !removed {
        return Err(ApiError::NotFound("Service not found".to_string()));
    }
    Ok(Json(ApiResponse::success_with_message(
        true,
        "Service deregistered successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/registry/discover/{service_name}",
    tag = "Registry",
    params(("service_name" = String, Path, description = "Service family name")),
    responses((status = 200, description = "Healthy instances, possibly none", body = Vec<ServiceInstance>))
)]
pub async fn discover_services(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
) -> Result<Json<ApiResponse<Vec<ServiceInstance>>>, ApiError> {
    let instances = state.registry.discover(&service_name)?;
    metrics::counter!("registry_discoveries_total").increment(1);
    Ok(Json(ApiResponse::success(instances)))
}

#[utoipa::path(
    get,
    path = "/api/registry/instance/{service_name}",
    tag = "Registry",
    params(("service_name" = String, Path, description = "Service family name")),
    responses(
        (status = 200, description = "Selected instance", body = ServiceInstance),
        (status = 404, description = "No healthy service instances found")
    )
)]
pub async fn get_service_instance(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
) -> Result<Json<ApiResponse<ServiceInstance>>, ApiError> {
    match state.registry.healthy_instance(&service_name)? {
        Some(instance) => {
            metrics::counter!("registry_selections_total").increment(1);
            Ok(Json(ApiResponse::success(instance)))
        }
        None => Err(ApiError::NotFound(
            "No healthy service instances found".to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/registry/services",
    tag = "Registry",
    responses((status = 200, description = "Instance count per known service"))
)]
pub async fn list_services(
    State(state): State<AppState>,
) -> Json<ApiResponse<BTreeMap<String, usize>>> {
    Json(ApiResponse::success(state.gateway.instance_counts()))
}
