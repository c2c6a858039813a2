//! Server startup utilities.

use keystone_config::ObservabilityConfig;
use keystone_core::{KeystoneError, KeystoneResult};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set; `{level}` is the configured level.
pub fn default_filter(level: &str) -> String {
    format!("{},keystone=debug,tower_http=debug", level)
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level. `log_format = "json"` emits one
/// JSON object per event, anything else the human-readable format.
pub fn init_logging(config: &ObservabilityConfig) -> KeystoneResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter(&config.log_level))
            .map_err(|e| KeystoneError::Configuration(format!("Invalid log filter: {}", e)))?,
    };

    let json = config.log_format.eq_ignore_ascii_case("json");

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_target(true)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_target(true)))
        .try_init()
        .map_err(|e| KeystoneError::Configuration(format!("Failed to install logger: {}", e)))
}

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
    __ __               __
   / //_/__  __  _______/ /_____  ____  ___
  / ,< / _ \/ / / / ___/ __/ __ \/ __ \/ _ \
 / /| /  __/ /_/ (__  ) /_/ /_/ / / / /  __/
/_/ |_\___/\__, /____/\__/\____/_/ /_/\___/
          /____/
    "#);
}

/// Prints server startup information.
pub fn print_startup_info(addr: &str) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("REST API:  http://{}/api/v1/users", addr);
    info!("Health:    http://{}/health", addr);
    info!("Ready:     http://{}/ready", addr);
    info!("{}", separator);
}

/// Resolves when the process receives Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
