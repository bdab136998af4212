//! Startup orchestration.
//!
//! Configuration precedence, lowest first: built-in defaults, config file,
//! environment, command line. The merged result is validated once.

use std::path::PathBuf;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::GatewayConfig;
use crate::config::validation::validate_config;

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub config_path: Option<PathBuf>,
    pub bind_address: Option<String>,
    pub upstream_base_url: Option<String>,
}

/// Build the effective configuration.
pub fn resolve_config<F>(overrides: &Overrides, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match &overrides.config_path {
        Some(path) => read_config(path)?,
        None => GatewayConfig::default(),
    };

    config.apply_env(env);

    if let Some(bind) = &overrides.bind_address {
        config.listener.bind_address = bind.clone();
    }
    if let Some(base) = &overrides.upstream_base_url {
        config.upstream.base_url = base.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
