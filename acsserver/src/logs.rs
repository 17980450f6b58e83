//! Initialisation du système de logs

use acsconfig::Config;
use anyhow::{Result, anyhow};
use tracing::Level;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Options d'initialisation du logging
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    /// Niveau minimum (`ERROR` ... `TRACE`) quand `RUST_LOG` n'est pas défini
    pub min_level: String,
    /// Activer la sortie console
    pub enable_console: bool,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            min_level: "INFO".to_string(),
            enable_console: true,
        }
    }
}

impl LoggingOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_level: config.get_log_min_level(),
            enable_console: config.get_log_enable_console(),
        }
    }
}

/// Installe le subscriber global.
///
/// `RUST_LOG` l'emporte sur `options.min_level` ; un niveau inconnu
/// retombe sur `INFO`. Échoue si un subscriber est déjà installé.
pub fn init_logging(options: LoggingOptions) -> Result<()> {
    let level = string_to_level(&options.min_level).unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));

    let console = options.enable_console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .try_init()
        .map_err(|err| anyhow!("Cannot install tracing subscriber: {}", err))
}

fn string_to_level(s: &str) -> Option<Level> {
    match s.trim().to_uppercase().as_str() {
        "ERROR" => Some(Level::ERROR),
        "WARN" => Some(Level::WARN),
        "INFO" => Some(Level::INFO),
        "DEBUG" => Some(Level::DEBUG),
        "TRACE" => Some(Level::TRACE),
        _ => None,
    }
}
