use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::handler::{
        detect_subscriptions, get_group_ratios, health_check, processor_webhook,
        set_group_ratios, AppState,
    },
    middleware::{create_cors_layer, rate_limit_middleware},
};

pub async fn create_app(state: AppState) -> Router {
    info!("Setting up HTTP routes...");

    let app = Router::new()
        // Public health check endpoint
        .route("/health", get(health_check))
        .nest(
            "/api/v1",
            Router::new()
                // Inbound processor events (signed raw payload)
                .route("/webhook/processor", post(processor_webhook))
                // Ratio configuration, consumed by the surrounding CRUD layer
                .route(
                    "/groups/:group_id/ratios",
                    get(get_group_ratios).post(set_group_ratios),
                )
                // Ledger analysis
                .route("/subscriptions/detect", post(detect_subscriptions))
                .layer(axum_middleware::from_fn(rate_limit_middleware)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(create_cors_layer()),
        )
        .with_state(state);

    info!("✓ HTTP routes configured");
    app
}

pub async fn run_server(app: Router, bind_address: &str) -> Result<(), Box<dyn std::error::Error>> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app).await?;
    Ok(())
}
