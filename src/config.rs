//! Daemon configuration.
//!
//! Layered with `figment`, lowest to highest priority:
//!
//! 1. Compiled defaults ([`DaemonConfig::default`])
//! 2. A TOML file: `$DOCKYARD_CONFIG`, or `dockyard.toml` in the working
//!    directory when present
//! 3. `DOCKYARD_*` environment variables (e.g. `DOCKYARD_DOCKER_SOCKET`)
//! 4. The plain `PORT` and `HOST` environment variables
//!
//! [`DaemonConfig::load`] first imports a `.env` file from the working
//! directory (or a parent) into the environment, without overriding
//! variables that are already set.
//!
//! An unset or invalid port falls back to [`DEFAULT_PORT`] instead of
//! failing startup.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_DOCKER_TIMEOUT_SECS: u64 = 120;

const DEFAULT_CONFIG_FILE: &str = "dockyard.toml";
const CONFIG_PATH_VAR: &str = "DOCKYARD_CONFIG";
const ENV_PREFIX: &str = "DOCKYARD_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),
}

/// Process configuration for the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Bind host for the HTTP listener.
    pub host: String,
    /// Bind port for the HTTP listener.
    #[serde(deserialize_with = "lenient_port")]
    pub port: u16,
    /// Path to the Docker Engine control socket.
    pub docker_socket: String,
    /// Per-request timeout handed to the Docker client, in seconds.
    pub docker_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            docker_socket: DEFAULT_DOCKER_SOCKET.to_string(),
            docker_timeout_secs: DEFAULT_DOCKER_TIMEOUT_SECS,
        }
    }
}

impl DaemonConfig {
    /// Load the configuration from all layers, after importing `.env`.
    pub fn load() -> Result<Self, ConfigError> {
        load_dotenv();
        Ok(Self::extract(&Self::figment())?)
    }

    /// The layered figment the daemon reads its configuration from.
    pub fn figment() -> Figment {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.into());

        Figment::from(Serialized::defaults(DaemonConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["CONFIG"]))
            .merge(Env::raw().only(&["PORT", "HOST"]))
    }

    /// Extract a configuration from an arbitrary figment.
    pub fn extract(figment: &Figment) -> Result<Self, figment::Error> {
        let mut config: DaemonConfig = figment.extract()?;
        if config.host.trim().is_empty() {
            config.host = DEFAULT_HOST.to_string();
        }
        Ok(config)
    }
}

/// Import a `.env` file into the process environment. Variables that are
/// already set win over the file.
fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(i64),
    Text(String),
    Other(IgnoredAny),
}

fn lenient_port<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = PortValue::deserialize(deserializer)?;
    let parsed = match &raw {
        PortValue::Number(n) => u16::try_from(*n).ok(),
        PortValue::Text(s) => s.trim().parse::<u16>().ok(),
        PortValue::Other(_) => None,
    };

    match parsed {
        Some(port) if port != 0 => Ok(port),
        _ => {
            let shown = match raw {
                PortValue::Number(n) => n.to_string(),
                PortValue::Text(s) => s,
                PortValue::Other(_) => "<not a number>".to_string(),
            };
            warn!(
                "Invalid port {:?}, falling back to {}",
                shown, DEFAULT_PORT
            );
            Ok(DEFAULT_PORT)
        }
    }
}
