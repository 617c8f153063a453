//! Configuration for the host agent.
//!
//! A TOML file (`$HOST_AGENT_CONFIG`, else `~/.host-agent/config.toml`) with three
//! optional sections, overlaid by a few environment variables and resolved into
//! [`Settings`]. String values may reference environment variables as `${VAR}`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_SEARCH_ROOT: &str = "/home/david/vps";
pub const DEFAULT_RG_BINARY: &str = "rg";
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_BACKUP_SCRIPT: &str = "/home/david/backup-n8n-workflows.sh";
pub const DEFAULT_BACKUP_TIMEOUT_SECS: u64 = 300;

pub const ENV_CONFIG_PATH: &str = "HOST_AGENT_CONFIG";
pub const ENV_BEARER_TOKEN: &str = "HOST_AGENT_BEARER_TOKEN";
pub const ENV_HOST: &str = "HOST_AGENT_HOST";
pub const ENV_PORT: &str = "HOST_AGENT_PORT";
pub const ENV_SEARCH_ROOT: &str = "HOST_AGENT_SEARCH_ROOT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no bearer token configured; set [server].bearer_token or HOST_AGENT_BEARER_TOKEN")]
    MissingBearerToken,
    #[error("invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}

impl ConfigError {
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Read { path, .. } | Self::Parse { path, .. } => Some(path),
            Self::MissingBearerToken | Self::InvalidEnv { .. } => None,
        }
    }
}

// ============================================================================
// File model
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct HostAgentConfig {
    pub server: Option<ServerConfig>,
    pub search: Option<SearchConfig>,
    pub backup: Option<BackupConfig>,
}

#[derive(Default, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub bearer_token: Option<String>,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &mask(self.bearer_token.as_deref()))
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchConfig {
    /// Parent directory of the allow-listed directories.
    pub root: Option<String>,
    pub rg_binary: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackupConfig {
    pub script_path: Option<String>,
    pub timeout_secs: Option<u64>,
}

fn mask(value: Option<&str>) -> &'static str {
    if value.is_some() { "[REDACTED]" } else { "None" }
}

/// Replace every `${VAR}` with `lookup(VAR)` (empty when unset).
/// An unclosed `${` is kept as-is.
fn expand_with(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let name = &rest[start + 2..start + 2 + end_rel];
        if !name.is_empty() {
            out.push_str(&lookup(name).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

impl HostAgentConfig {
    /// Load from [`config_path`]. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(ENV_CONFIG_PATH).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".host-agent").join("config.toml"))
}

// ============================================================================
// Resolved settings
// ============================================================================

/// Fully resolved runtime settings.
#[derive(Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub bearer_token: String,
    pub search_root: PathBuf,
    pub rg_binary: String,
    pub search_timeout: Duration,
    pub backup_script: PathBuf,
    pub backup_timeout: Duration,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bearer_token", &"[REDACTED]")
            .field("search_root", &self.search_root)
            .field("rg_binary", &self.rg_binary)
            .field("search_timeout", &self.search_timeout)
            .field("backup_script", &self.backup_script)
            .field("backup_timeout", &self.backup_timeout)
            .finish()
    }
}

impl Settings {
    /// Load the config file (if any) and resolve it against the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let config = HostAgentConfig::load()?.unwrap_or_default();
        Self::resolve(config, |name| std::env::var(name).ok())
    }

    /// Apply defaults, `${VAR}` expansion and environment overrides.
    ///
    /// `env` looks up environment variables; an empty value counts as unset.
    pub fn resolve(
        config: HostAgentConfig,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let env = |name: &str| env(name).filter(|v| !v.is_empty());
        let expand = |value: String| expand_with(&value, &env);

        let server = config.server.unwrap_or_default();
        let search = config.search.unwrap_or_default();
        let backup = config.backup.unwrap_or_default();

        let host = env(ENV_HOST)
            .or_else(|| server.host.map(&expand))
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match env(ENV_PORT) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv {
                    var: ENV_PORT,
                    value,
                })?,
            None => server.port.unwrap_or(DEFAULT_PORT),
        };

        let bearer_token = env(ENV_BEARER_TOKEN)
            .or_else(|| server.bearer_token.map(&expand))
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingBearerToken)?;

        let search_root = env(ENV_SEARCH_ROOT)
            .or_else(|| search.root.map(&expand))
            .unwrap_or_else(|| DEFAULT_SEARCH_ROOT.to_string());

        let rg_binary = search
            .rg_binary
            .map(&expand)
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_RG_BINARY.to_string());

        let backup_script = backup
            .script_path
            .map(&expand)
            .unwrap_or_else(|| DEFAULT_BACKUP_SCRIPT.to_string());

        Ok(Self {
            host,
            port,
            bearer_token,
            search_root: PathBuf::from(search_root),
            rg_binary,
            search_timeout: Duration::from_secs(
                search.timeout_secs.unwrap_or(DEFAULT_SEARCH_TIMEOUT_SECS),
            ),
            backup_script: PathBuf::from(backup_script),
            backup_timeout: Duration::from_secs(
                backup.timeout_secs.unwrap_or(DEFAULT_BACKUP_TIMEOUT_SECS),
            ),
        })
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
