//! Settings: defaults, then an optional TOML file, then the environment.

use std::path::{Path, PathBuf};

use patent_client_api::edis::EDIS_BASE_URL;
use patent_client_api::ptab::PTAB_BASE_URL;
use patent_client_api::EdisCredentials;
use serde::Deserialize;

use crate::error::PatentClientError;

pub const ENV_CACHE_DIR: &str = "PATENT_CLIENT_CACHE";
pub const ENV_SETTINGS_FILE: &str = "PATENT_CLIENT_SETTINGS";
pub const ENV_EDIS_USER: &str = "EDIS_USER";
pub const ENV_EDIS_PASS: &str = "EDIS_PASS";
pub const ENV_PTAB_BASE_URL: &str = "PTAB_BASE_URL";
pub const ENV_EDIS_BASE_URL: &str = "EDIS_BASE_URL";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PtabSettings {
    pub base_url: String,
}

impl Default for PtabSettings {
    fn default() -> Self {
        Self {
            base_url: PTAB_BASE_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EdisSettings {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for EdisSettings {
    fn default() -> Self {
        Self {
            base_url: EDIS_BASE_URL.to_string(),
            username: None,
            password: None,
        }
    }
}

/// Client settings.
///
/// ```toml
/// cache_dir = "/var/cache/patent_client"
///
/// [ptab]
/// base_url = "https://ptabdata.uspto.gov/ptab-api"
///
/// [itc_edis]
/// username = "me"
/// password = "secret"
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub ptab: PtabSettings,
    pub itc_edis: EdisSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            ptab: PtabSettings::default(),
            itc_edis: EdisSettings::default(),
        }
    }
}

/// `~/.patent_client`, or `.patent_client` when no home directory is known.
pub fn default_cache_dir() -> PathBuf {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".patent_client")
}

impl Settings {
    /// Loads settings from the process environment and, when present, the
    /// settings file it points to.
    pub fn load() -> Result<Self, PatentClientError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Like [`Settings::load`] with an explicit environment lookup.
    pub fn load_with<F>(env: F) -> Result<Self, PatentClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = env(ENV_CACHE_DIR)
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_dir);
        let path = env(ENV_SETTINGS_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join("settings.toml"));

        let settings = if path.exists() {
            tracing::debug!("Loading settings from {}", path.display());
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        Ok(settings.apply_env(env))
    }

    pub fn from_file(path: &Path) -> Result<Self, PatentClientError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PatentClientError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, PatentClientError> {
        toml::from_str(text).map_err(|e| PatentClientError::Config(e.to_string()))
    }

    /// Environment values override whatever is already set.
    pub fn apply_env<F>(mut self, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = env(ENV_CACHE_DIR) {
            self.cache_dir = PathBuf::from(dir);
        }
        if let Some(url) = env(ENV_PTAB_BASE_URL) {
            self.ptab.base_url = url;
        }
        if let Some(url) = env(ENV_EDIS_BASE_URL) {
            self.itc_edis.base_url = url;
        }
        if let Some(user) = env(ENV_EDIS_USER) {
            self.itc_edis.username = Some(user);
        }
        if let Some(pass) = env(ENV_EDIS_PASS) {
            self.itc_edis.password = Some(pass);
        }
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// EDIS credentials, when both halves are configured.
    pub fn edis_credentials(&self) -> Option<EdisCredentials> {
        match (&self.itc_edis.username, &self.itc_edis.password) {
            (Some(username), Some(password)) => Some(EdisCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }
}
