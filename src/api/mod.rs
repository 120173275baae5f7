//! REST API layer: route handlers, DTOs, and router composition.
//!
//! Client/admin endpoints are mounted under `/api/v1`; webhook and
//! system endpoints live at the root.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the gateway.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "boxoffice-gateway",
        description = "Order fulfillment and payment reconciliation API"
    ),
    paths(
        handlers::payments::confirm_payment,
        handlers::webhooks::stripe_webhook,
        handlers::orders::get_order,
        handlers::orders::refund_order,
        handlers::tickets::check_in,
        handlers::system::health_handler,
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::webhooks::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}
