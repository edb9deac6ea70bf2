use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Descriptive route metadata for one logical service. Not derived from
/// the registry.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRoutes {
    pub service: String,
    pub base_url: String,
    pub endpoints: Vec<String>,
}

fn entry(service: &str, base_url: &str, endpoints: &[&str]) -> ServiceRoutes {
    ServiceRoutes {
        service: service.to_string(),
        base_url: base_url.to_string(),
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
    }
}

pub fn route_catalog() -> Vec<ServiceRoutes> {
    vec![
        entry(
            "user-service",
            "/api/users",
            &[
                "GET /api/users - Get paginated users",
                "GET /api/users/{id} - Get user by ID",
                "GET /api/users/by-email/{email} - Get user by email",
                "POST /api/users - Create new user",
                "PUT /api/users/{id} - Update user",
                "DELETE /api/users/{id} - Delete user",
                "POST /api/users/{id}/activate - Activate user",
                "POST /api/users/{id}/deactivate - Deactivate user",
            ],
        ),
        entry(
            "product-service",
            "/api/products",
            &[
                "GET /api/products - Get paginated products",
                "GET /api/products/{id} - Get product by ID",
                "GET /api/products/by-sku/{sku} - Get product by SKU",
                "POST /api/products - Create new product",
                "PUT /api/products/{id} - Update product",
                "DELETE /api/products/{id} - Delete product",
                "POST /api/products/{id}/stock - Update product stock",
                "GET /api/products/{id}/stock-availability - Check stock availability",
                "GET /api/products/categories - Get all categories",
            ],
        ),
        entry(
            "order-service",
            "/api/orders",
            &[
                "GET /api/orders - Get paginated orders",
                "GET /api/orders/{id} - Get order by ID",
                "GET /api/orders/user/{userId} - Get orders by user ID",
                "POST /api/orders - Create new order",
                "PUT /api/orders/{id}/status - Update order status",
                "POST /api/orders/{id}/cancel - Cancel order",
                "POST /api/orders/{id}/ship - Ship order",
                "POST /api/orders/{id}/deliver - Deliver order",
            ],
        ),
        entry(
            "notification-service",
            "/api/notifications",
            &[
                "GET /api/notifications - Get paginated notifications",
                "GET /api/notifications/{id} - Get notification by ID",
                "GET /api/notifications/user/{userId} - Get notifications by user ID",
                "POST /api/notifications - Send new notification",
                "POST /api/notifications/{id}/mark-read - Mark notification as read",
                "POST /api/notifications/{id}/mark-delivered - Mark notification as delivered",
                "POST /api/notifications/{id}/retry - Retry failed notification",
                "GET /api/notifications/stats - Get notification statistics",
            ],
        ),
        entry(
            "service-registry",
            "/api/registry",
            &[
                "POST /api/registry/register - Register service",
                "DELETE /api/registry/deregister/{serviceId} - Deregister service",
                "GET /api/registry/discover/{serviceName} - Discover service instances",
                "GET /api/registry/instance/{serviceName} - Get healthy service instance",
                "GET /api/registry/services - Get all services",
            ],
        ),
        entry(
            "gateway",
            "/api/gateway",
            &[
                "GET /api/gateway/status - Get gateway status",
                "GET /api/gateway/services - Get registered services",
                "GET /api/gateway/routes - Get available routes",
            ],
        ),
    ]
}
