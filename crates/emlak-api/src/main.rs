//! # emlak-api — Binary Entry Point
//!
//! Starts the Axum HTTP server for the Emlak platform API.
//! Binds to configurable port (default 8080).

use emlak_api::state::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let port = config.port;

    // Initialize database pool (optional — absent means in-memory only).
    let db_pool = emlak_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    // Attempt to create the image CDN client from environment.
    let media_client = match emlak_media_client::MediaCdnConfig::from_env() {
        Ok(cdn_config) => match emlak_media_client::MediaClient::new(cdn_config) {
            Ok(client) => {
                tracing::info!("media CDN client configured");
                Some(client)
            }
            Err(e) => {
                tracing::error!("Failed to create media CDN client: {e}");
                return Err(e.into());
            }
        },
        Err(e) => {
            tracing::warn!(
                "media CDN client not configured: {e}. Deleted listings will keep their images."
            );
            None
        }
    };

    // Bootstrap: load site manifest if SITE_CONFIG is set, seed admin.
    let state = emlak_api::bootstrap::bootstrap(config, media_client, db_pool).map_err(|e| {
        tracing::error!("Bootstrap failed: {e}");
        e
    })?;

    // Hydrate in-memory stores from database (if connected).
    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = emlak_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Emlak API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
