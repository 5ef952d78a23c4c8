//! Deployment configuration.
//!
//! The origin override has three meaningful states and they are kept apart all the way from the
//! environment to the resolver:
//! - unset (`None`): local development, `http://localhost:8000`
//! - empty (`Some("")`): same-origin, every URL is path-only
//! - anything else: an explicit remote origin, used verbatim
//!
//! The process-wide copy is installed once at startup and never changes afterwards.

use std::path::PathBuf;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

pub const API_URL_ENV: &str = "CASHPER_API_URL";
pub const PAGE_ORIGIN_ENV: &str = "CASHPER_PAGE_ORIGIN";
pub const SESSION_DIR_ENV: &str = "CASHPER_SESSION_DIR";

pub const LOCAL_DEV_ORIGIN: &str = "http://localhost:8000";
pub const DEFAULT_SESSION_DIR: &str = ".cashper";

static GLOBAL: OnceCell<DeploymentConfig> = OnceCell::new();

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub configured_origin: Option<String>,
}

/// The three deployment modes derived from `configured_origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginMode {
    LocalDefault,
    SameOrigin,
    Remote(String),
}

impl DeploymentConfig {
    pub fn local_default() -> Self { Self { configured_origin: None } }
    pub fn same_origin() -> Self { Self { configured_origin: Some(String::new()) } }
    pub fn remote<S: Into<String>>(origin: S) -> Self { Self { configured_origin: Some(origin.into()) } }

    /// Read the override from the environment without collapsing unset into empty.
    pub fn from_env() -> Self {
        Self { configured_origin: read_env_tristate(API_URL_ENV) }
    }

    pub fn mode(&self) -> OriginMode {
        match self.configured_origin.as_deref() {
            None => OriginMode::LocalDefault,
            Some("") => OriginMode::SameOrigin,
            Some(o) => OriginMode::Remote(o.to_string()),
        }
    }

    /// Scheme+host prefix for HTTP URLs. Empty in same-origin mode.
    pub fn http_origin(&self) -> &str {
        match self.configured_origin.as_deref() {
            None => LOCAL_DEV_ORIGIN,
            Some(o) => o,
        }
    }
}

/// `None` when the variable is absent, `Some(value)` (possibly empty) when present.
/// A value that is not valid unicode is treated as absent.
pub fn read_env_tristate(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(v) => Some(v),
        Err(std::env::VarError::NotPresent) => None,
        Err(std::env::VarError::NotUnicode(_)) => {
            warn!(target: "config", var = name, "ignoring non-unicode value");
            None
        }
    }
}

/// Install the process-wide deployment config. Only the first call wins.
pub fn init_global(cfg: DeploymentConfig) -> &'static DeploymentConfig {
    if GLOBAL.set(cfg.clone()).is_err() {
        warn!(target: "config", "deployment config already initialised; ignoring {:?}", cfg);
    }
    global()
}

/// The installed config, or the environment's if nothing was installed yet.
pub fn global() -> &'static DeploymentConfig {
    GLOBAL.get_or_init(|| {
        let cfg = DeploymentConfig::from_env();
        debug!(target: "config", "deployment config from env: {:?}", cfg);
        cfg
    })
}

/// Settings of a non-browser client: where the "page" lives and where the session file is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub page_origin: Option<String>,
    pub session_dir: PathBuf,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self { page_origin: None, session_dir: PathBuf::from(DEFAULT_SESSION_DIR) }
    }
}

impl ClientSettings {
    pub fn from_env() -> Self {
        let page_origin = read_env_tristate(PAGE_ORIGIN_ENV).filter(|s| !s.trim().is_empty());
        let session_dir = read_env_tristate(SESSION_DIR_ENV)
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_DIR));
        Self { page_origin, session_dir }
    }
}
