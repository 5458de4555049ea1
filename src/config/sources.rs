// src/config/sources.rs
//! Watch configuration: monitored sources, state location and the role
//! allow-list for manual checks.
//!
//! Loaded from TOML. Any `destination` or `allowed_roles` entry may be written
//! as `ENV:NAME` to pull the value from the environment (webhook URLs and
//! role ids usually live in `.env`, not in the repo).

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_WATCH_CONFIG_PATH: &str = "config/sources.toml";
pub const ENV_WATCH_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
/// Comma-separated role ids appended to `allowed_roles`.
pub const ENV_ALLOWED_ROLE_IDS: &str = "ALLOWED_ROLE_IDS";

const ENV_PREFIX: &str = "ENV:";

fn default_state_dir() -> PathBuf {
    PathBuf::from("shared")
}
fn default_request_timeout_secs() -> u64 {
    15
}
fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Upper bound for a single source fetch.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub allowed_roles: Vec<String>,
    pub sources: Vec<MonitoredSource>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MonitoredSource {
    pub id: String,
    /// Heading used in announcements and replies; defaults to `id`.
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub origin: Origin,
    /// Discord webhook URL of the destination channel.
    pub destination: String,
    pub interval_minutes: u64,
    /// Overrides `{state_dir}/{id}.json`.
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

/// Where and how a source is fetched.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Origin {
    /// HTML page; first heading inside `<main>`.
    Page { url: String },
    /// JSON news API queried with fixed parameters.
    Feed {
        url: String,
        app_id: u64,
        #[serde(default = "default_count")]
        count: u32,
        #[serde(default)]
        max_length: u32,
    },
}

impl Origin {
    pub fn url(&self) -> &str {
        match self {
            Origin::Page { url } | Origin::Feed { url, .. } => url,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Origin::Page { .. } => "page",
            Origin::Feed { .. } => "feed",
        }
    }
}

impl MonitoredSource {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.saturating_mul(60))
    }

    pub fn label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

impl WatchConfig {
    /// Parse, resolve `ENV:` indirections and validate.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: WatchConfig = toml::from_str(s).context("parsing watch config toml")?;

        for src in &mut cfg.sources {
            src.id = src.id.trim().to_string();
            src.label = src.label.trim().to_string();
            src.destination = resolve_env(&src.destination)
                .with_context(|| format!("destination of source '{}'", src.id))?;
        }

        let mut roles = Vec::with_capacity(cfg.allowed_roles.len());
        for r in &cfg.allowed_roles {
            match resolve_env(r) {
                Ok(v) => roles.push(v),
                // An unset role variable just shrinks the allow-list.
                Err(e) => tracing::warn!(error = %e, "skipping allowed role"),
            }
        }
        if let Ok(extra) = std::env::var(ENV_ALLOWED_ROLE_IDS) {
            roles.extend(extra.split(',').map(str::to_string));
        }
        cfg.allowed_roles = clean_list(roles);

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading watch config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load using env var + fallback:
    /// 1) $WATCH_CONFIG_PATH
    /// 2) config/sources.toml
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_WATCH_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("WATCH_CONFIG_PATH points to non-existent path");
            }
            return Self::load_from(&pb);
        }
        Self::load_from(Path::new(DEFAULT_WATCH_CONFIG_PATH))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("no sources configured");
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be > 0");
        }
        let mut seen = HashSet::new();
        for src in &self.sources {
            if src.id.is_empty() {
                bail!("source id must not be empty");
            }
            if !src
                .id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                bail!("source id '{}' may only contain [A-Za-z0-9_-]", src.id);
            }
            if !seen.insert(src.id.as_str()) {
                bail!("duplicate source id '{}'", src.id);
            }
            if src.interval_minutes == 0 {
                bail!("source '{}': interval_minutes must be > 0", src.id);
            }
            reqwest::Url::parse(src.origin.url())
                .with_context(|| format!("source '{}': invalid origin url", src.id))?;
            reqwest::Url::parse(&src.destination)
                .with_context(|| format!("source '{}': invalid destination url", src.id))?;
        }
        Ok(())
    }
}

fn resolve_env(raw: &str) -> Result<String> {
    let t = raw.trim();
    match t.get(..ENV_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(ENV_PREFIX) => {
            let name = t[ENV_PREFIX.len()..].trim();
            std::env::var(name).map_err(|_| anyhow!("Missing {name} env var"))
        }
        _ => Ok(t.to_string()),
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}
