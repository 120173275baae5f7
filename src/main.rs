//! boxoffice-gateway server entry point.
//!
//! Starts the Axum HTTP server over the PostgreSQL-backed store and the
//! configured payment providers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use boxoffice_gateway::api;
use boxoffice_gateway::app_state::AppState;
use boxoffice_gateway::config::GatewayConfig;
use boxoffice_gateway::domain::PaymentMethod;
use boxoffice_gateway::provider::{
    PaymentProvider, PaypalProvider, ProviderRegistry, StripeProvider,
};
use boxoffice_gateway::service::{FulfillmentService, RefundService, TicketService};
use boxoffice_gateway::store::{FulfillmentStore, PostgresStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = GatewayConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting boxoffice-gateway");

    // Database pool + migrations
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Providers share one HTTP client
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.provider_timeout_secs))
        .build()?;
    let stripe = Arc::new(StripeProvider::new(&config.stripe, http.clone()));
    let paypal = Arc::new(PaypalProvider::new(&config.paypal, http));
    let providers = Arc::new(
        ProviderRegistry::new()
            .with(PaymentMethod::Card, Arc::clone(&stripe) as Arc<dyn PaymentProvider>)
            .with(PaymentMethod::Paypal, paypal),
    );

    // Build service layer
    let store: Arc<dyn FulfillmentStore> = Arc::new(PostgresStore::new(pool));
    let fulfillment = Arc::new(FulfillmentService::new(Arc::clone(&store)));
    let refunds = Arc::new(RefundService::new(Arc::clone(&store), Arc::clone(&providers)));
    let tickets = Arc::new(TicketService::new(store));

    // Build application state
    let app_state = AppState {
        fulfillment,
        refunds,
        tickets,
        providers,
        stripe,
    };

    // Build router
    let app = api::build_router()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
