// ============================================================================
// SOCIAL MEDIA ANALYTICS MICROSERVICE
// ============================================================================

// - Polls the evaluation service for users, posts, and comment counts
// - In-memory analytics cache with derived views
// - Two uncoordinated refresh timers (full rebuild + random sample)
// - Three read endpoints for the dashboard front end
// - Structured logging

use std::sync::Arc;

use social_analytics::{
    cache::AnalyticsCache, client::UpstreamClient, config::Config, ingest::Ingestor, router,
    scheduler, states::AppState,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env();

    // Create application state
    let cache = Arc::new(AnalyticsCache::new());
    let client = Arc::new(UpstreamClient::new(
        &config.base_url,
        config.credentials.clone(),
    ));
    let ingestor = Ingestor::new(client.clone(), cache.clone());
    let state = AppState {
        cache,
        ingestor: ingestor.clone(),
    };

    // Build the router
    let app = router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    info!("Server running on http://{}", addr);
    info!("API Endpoints:");
    info!("  GET    /                 - Liveness check");
    info!("  GET    /health           - Health check");
    info!("  GET    /users            - Top five users by post count");
    info!("  GET    /posts?type=...   - popular | latest posts");

    // Warm the cache and start the refresh timers in the background once the
    // first authentication succeeds; a failed exchange leaves the cache empty
    // until a query triggers the lazy rebuild.
    tokio::spawn(async move {
        match client.authenticate().await {
            Ok(_) => {
                ingestor.initialize_data().await;
                scheduler::spawn_refresh_tasks(ingestor);
            }
            Err(err) => warn!("Initial authentication failed: {}", err),
        }
    });

    axum::serve(listener, app).await.unwrap();
}
