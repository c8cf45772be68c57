//! Configuration parsing – reads a KEY=VALUE file (`qparchive.conf`) and
//! lets `QPARCHIVE_*` environment variables override individual keys.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Backend origin used when neither the file nor the environment sets one.
pub const DEFAULT_API_BASE_URL: &str = "https://qp-backend-sg1x.onrender.com";

/// Prefix for environment overrides, e.g. `QPARCHIVE_API_BASE_URL`.
const ENV_PREFIX: &str = "QPARCHIVE_";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct Config {
    // ── backend ──────────────────────────────────────────────────────
    /// Origin every request path is resolved against (no trailing `/`).
    pub api_base_url: String,
    /// Per-request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,

    // ── local state ──────────────────────────────────────────────────
    /// JSON file holding the persisted `token` / `user` entries.
    pub session_file: PathBuf,
    /// Directory downloaded papers are saved into.
    pub download_dir: PathBuf,
}

impl Config {
    /// Default config path.
    pub fn default_path() -> &'static str {
        "/etc/qparchive/qparchive.conf"
    }

    /// Build a config from defaults and environment overrides only.
    pub fn from_env() -> Config {
        from_map(&HashMap::new(), |key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }
}

impl Default for Config {
    fn default() -> Self {
        from_map(&HashMap::new(), |_| None)
    }
}

/// Parse a `KEY=VALUE` configuration file, then apply environment overrides.
///
/// Lines starting with `#` are comments.  Values may be optionally
/// double-quoted.  Unknown keys are silently ignored.
pub fn load(path: &Path) -> Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read config: {}", path.display()))?;

    let map = parse_conf(&text);
    info!("Loaded config from {}", path.display());

    Ok(from_map(&map, |key| {
        std::env::var(format!("{ENV_PREFIX}{key}")).ok()
    }))
}

/// Load `path` when it exists; otherwise fall back to defaults + environment.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load(path)
    } else {
        debug!("No config at {}, using defaults", path.display());
        Ok(Config::from_env())
    }
}

fn from_map(map: &HashMap<String, String>, env: impl Fn(&str) -> Option<String>) -> Config {
    let get = |key: &str| -> Option<String> {
        env(key)
            .or_else(|| map.get(key).cloned())
            .filter(|v| !v.is_empty())
    };

    let api_base_url = get("API_BASE_URL")
        .map(|u| normalize_base_url(&u))
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

    let timeout_secs: u64 = get("REQUEST_TIMEOUT_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(30);

    Config {
        api_base_url,
        request_timeout: (timeout_secs > 0).then(|| Duration::from_secs(timeout_secs)),
        session_file: get("SESSION_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(default_session_file),
        download_dir: PathBuf::from(get("DOWNLOAD_DIR").unwrap_or_else(|| ".".into())),
    }
}

fn default_session_file() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".qparchive")
        .join("session.json")
}

/// Strip trailing slashes so `format!("{base}{path}")` never doubles them.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Parse `KEY=VALUE` lines into a map, stripping optional double-quotes.
fn parse_conf(text: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, val)) = line.split_once('=') {
            let key = key.trim();
            let val = val.trim().trim_matches('"');
            map.insert(key.to_string(), val.to_string());
        }
    }
    map
}

// ─── tests ───────────────────────────────────────────────────────────────
