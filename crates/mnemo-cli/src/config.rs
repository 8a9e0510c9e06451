//! Configuration Vault – reads/writes `~/.mnemo/config.toml`.

use mnemo_memory::GraphConfig;
use mnemo_memory::engine::{DEFAULT_BUSY_TIMEOUT, DEFAULT_GRAPH_URI, DEFAULT_GRAPH_USER};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted process configuration stored in `~/.mnemo/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Address the HTTP API binds to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP port for the memory API.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Graph endpoint, e.g. `sqlite:///var/lib/mnemo/graph.db`.
    #[serde(default = "default_graph_uri")]
    pub graph_uri: String,

    /// Principal used for graph sessions.
    #[serde(default = "default_graph_user")]
    pub graph_user: String,

    /// Credential for `graph_user` (stored as plain text – the file is
    /// written owner-only).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub graph_password: String,

    /// How long a graph session waits on a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("graph_uri", &self.graph_uri)
            .field("graph_user", &self.graph_user)
            .field(
                "graph_password",
                if self.graph_password.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("busy_timeout_ms", &self.busy_timeout_ms)
            .finish()
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    mnemo_server::DEFAULT_PORT
}
fn default_graph_uri() -> String {
    DEFAULT_GRAPH_URI.to_string()
}
fn default_graph_user() -> String {
    DEFAULT_GRAPH_USER.to_string()
}
fn default_busy_timeout_ms() -> u64 {
    u64::try_from(DEFAULT_BUSY_TIMEOUT.as_millis()).unwrap_or(u64::MAX)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            graph_uri: default_graph_uri(),
            graph_user: default_graph_user(),
            graph_password: String::new(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl Config {
    /// Connection settings for the graph engine.
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig::new(&self.graph_uri, &self.graph_user, &self.graph_password)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    /// Parse `host` into a bind address.
    pub fn bind_host(&self) -> Result<IpAddr, String> {
        self.host
            .parse()
            .map_err(|e| format!("Invalid host '{}': {}", self.host, e))
    }
}

/// Return the path to `~/.mnemo/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".mnemo").join("config.toml")
}

/// Resolve the effective configuration: the file when present, defaults
/// otherwise, with `MNEMO_*` overrides applied either way.
pub fn resolve() -> Result<Config, String> {
    resolve_from(&config_path())
}

pub(crate) fn resolve_from(path: &Path) -> Result<Config, String> {
    match load_from(path)? {
        Some(cfg) => Ok(cfg),
        None => {
            let mut cfg = Config::default();
            apply_env_overrides(&mut cfg);
            Ok(cfg)
        }
    }
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config = toml::from_str(&raw)
        .map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `MNEMO_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MNEMO_HOST` | `host` |
/// | `MNEMO_PORT` | `port` |
/// | `MNEMO_GRAPH_URI` | `graph_uri` |
/// | `MNEMO_GRAPH_USER` | `graph_user` |
/// | `MNEMO_GRAPH_PASSWORD` | `graph_password` |
/// | `MNEMO_BUSY_TIMEOUT_MS` | `busy_timeout_ms` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MNEMO_HOST") {
        cfg.host = v;
    }
    if let Ok(v) = std::env::var("MNEMO_PORT")
        && let Ok(port) = v.parse::<u16>() {
            cfg.port = port;
        }
    if let Ok(v) = std::env::var("MNEMO_GRAPH_URI") {
        cfg.graph_uri = v;
    }
    if let Ok(v) = std::env::var("MNEMO_GRAPH_USER") {
        cfg.graph_user = v;
    }
    if let Ok(v) = std::env::var("MNEMO_GRAPH_PASSWORD") {
        cfg.graph_password = v;
    }
    if let Ok(v) = std::env::var("MNEMO_BUSY_TIMEOUT_MS")
        && let Ok(ms) = v.parse::<u64>() {
            cfg.busy_timeout_ms = ms;
        }
}

/// Save the config to disk, creating `~/.mnemo/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Owner-only file (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
