// src/config/mod.rs
pub mod sources;

pub use sources::{
    MonitoredSource, Origin, WatchConfig, DEFAULT_WATCH_CONFIG_PATH, ENV_ALLOWED_ROLE_IDS,
    ENV_WATCH_CONFIG_PATH,
};
