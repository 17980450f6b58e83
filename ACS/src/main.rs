use acsconfig::get_config;
use acsserver::{AcsState, CwmpServerExt, LoggingOptions, ServerBuilder, init_logging};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ========== PHASE 1 : Configuration et logs ==========
    let config = get_config();
    init_logging(LoggingOptions::from_config(&config))?;

    if let Some(dir) = config.get_config_dir() {
        info!(config_dir = %dir.display(), "Configuration loaded");
    }

    // ========== PHASE 2 : Routes ==========
    let mut server = ServerBuilder::new_configured().build();

    let server_info = server.info();
    server
        .add_route("/info", move || {
            let info = server_info.clone();
            async move { info }
        })
        .await;

    let prefixes = config.get_cwmp_prefixes();
    for (uri, prefix) in &prefixes {
        info!(%uri, %prefix, "Output namespace prefix");
    }
    server
        .init_cwmp(AcsState::new(prefixes), config.get_max_body_size())
        .await;

    // ========== PHASE 3 : Démarrage du serveur ==========
    info!("🌐 Starting CWMP endpoint...");
    server.start().await?;

    info!("✅ ACS is ready!");
    info!("Press Ctrl+C to stop...");
    server.wait().await;

    Ok(())
}
