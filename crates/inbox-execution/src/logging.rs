//! Process-wide tracing setup.

use crate::session_log_layer::SessionLogLayer;
use anyhow::{Context, Result};
use inbox_core::config::LoggingConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Picks the filter directive: `RUST_LOG` wins over the config file.
fn filter_directive(config: &LoggingConfig, env: Option<String>) -> String {
    env.filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| config.filter.clone())
}

/// Installs the global subscriber.
///
/// Output goes to stderr as text or JSON lines per `config.json`. When a
/// `SessionLogLayer` is supplied, session status lines are also forwarded to
/// its channel.
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig, session_log: Option<SessionLogLayer>) -> Result<()> {
    let directive = filter_directive(config, std::env::var(EnvFilter::DEFAULT_ENV).ok());
    let filter = EnvFilter::try_new(&directive)
        .with_context(|| format!("Invalid log filter '{}'", directive))?;

    let (json_layer, text_layer) = if config.json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(session_log)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("[Logging] Tracing initialized with filter '{}'", directive);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_config() {
        let config = LoggingConfig::default();
        assert_eq!(
            filter_directive(&config, Some("inbox_application=trace".to_string())),
            "inbox_application=trace"
        );
    }

    #[test]
    fn test_blank_env_falls_back_to_config() {
        let config = LoggingConfig {
            filter: "warn".to_string(),
            json: false,
        };
        assert_eq!(filter_directive(&config, Some("  ".to_string())), "warn");
        assert_eq!(filter_directive(&config, None), "warn");
    }
}
