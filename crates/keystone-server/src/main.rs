//! # Keystone Server
//!
//! Main entry point for the Keystone application.

use keystone_config::{AppConfig, ConfigLoader};
use keystone_core::{KeystoneError, KeystoneResult};
use keystone_rest::create_router;
use keystone_server::{di, startup};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match ConfigLoader::from_default_location() {
        Ok(loader) => loader.get().await,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = startup::init_logging(&config.observability) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    startup::print_banner();
    info!("Starting Keystone server...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> KeystoneResult<()> {
    let application = di::build_application(&config).await?;
    let router = create_router(application.module(), application.health(), &config.server);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| KeystoneError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    startup::print_startup_info(&addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(startup::shutdown_signal())
        .await
        .map_err(|e| KeystoneError::internal(format!("REST server error: {}", e)));

    application.shutdown().await;
    served?;

    info!("Server shutdown complete");
    Ok(())
}
