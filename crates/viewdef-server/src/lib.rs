//! HTTP facade over the view compiler and the DDL validator

pub mod config;
pub mod logging;
pub mod routes;

use tokio::net::TcpListener;
use viewdef_validate::SqlParserValidator;

pub use config::{Config, ConfigError};
pub use routes::{router, AppState};

/// Build the router from configuration and serve it until the listener fails.
pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let catalog = config.catalog.to_catalog();
    tracing::info!(tables = catalog.len(), "catalog loaded");

    let app = router(AppState::new(catalog, SqlParserValidator::new()));

    let addr = config.server.address();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("viewdef server listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
