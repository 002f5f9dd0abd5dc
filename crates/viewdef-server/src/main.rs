use viewdef_server::{logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let path = std::env::var("VIEWDEF_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());
    let config = Config::load_or_default(&path)?;
    config.apply_logging_env();
    logging::init()?;

    tracing::info!(config = %path, "starting viewdef server");
    viewdef_server::serve(&config).await
}
