//! `spiro serve`: Start the HTTP API server.

use spiro_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    let store = spiro_store::build_from_config(&config.store).await?;

    println!("🌀 Spiro Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Store:     {} ({})", store.name(), config.store.path);
    println!(
        "   Replies:   {} per primary by default",
        config.pagination.default_sub_comment_count
    );

    spiro_gateway::start(config, store).await?;

    Ok(())
}
