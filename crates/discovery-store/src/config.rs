use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use discovery_core::{OutboundLink, SubmissionGate};
use serde::Deserialize;

use crate::error::{Result, StoreError};

pub const CONFIG_FILE: &str = "config.toml";
pub const DATABASE_FILE: &str = "answers.db";

/// Default base directory for all discovery storage.
pub fn default_base_dir() -> PathBuf {
    dirs_home().join(".aro-discovery")
}

fn dirs_home() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Settings read from `<base>/config.toml`. Every field is optional.
///
/// ```toml
/// origin = "https://aromultiservices.com"
/// min_answered_ratio = 0.5
/// autosave_interval_secs = 30
/// debounce_ms = 500
///
/// [messaging]
/// domain = "wa.me"
/// recipient = "34614362100"
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    pub origin: String,
    pub min_answered_ratio: f64,
    pub autosave_interval_secs: u64,
    pub debounce_ms: u64,
    pub messaging: MessagingConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MessagingConfig {
    pub domain: String,
    pub recipient: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            origin: "https://aromultiservices.com".to_string(),
            min_answered_ratio: SubmissionGate::DEFAULT_RATIO,
            autosave_interval_secs: 30,
            debounce_ms: 500,
            messaging: MessagingConfig::default(),
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        let link = OutboundLink::default();
        Self {
            domain: link.domain,
            recipient: link.recipient,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| StoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `config.toml` from `base_dir`; a missing file yields defaults.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        match fs::read_to_string(&path) {
            Ok(content) => {
                tracing::debug!("reading {}", path.display());
                Self::from_toml_str(&content).map_err(|e| match e {
                    StoreError::Config(msg) => {
                        StoreError::Config(format!("{}: {msg}", path.display()))
                    }
                    other => other,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_answered_ratio) {
            return Err(StoreError::Config(format!(
                "min_answered_ratio must be between 0 and 1, got {}",
                self.min_answered_ratio
            )));
        }
        if self.autosave_interval_secs == 0 {
            return Err(StoreError::Config(
                "autosave_interval_secs must be positive".to_string(),
            ));
        }
        if self.origin.is_empty() || self.messaging.domain.is_empty() {
            return Err(StoreError::Config(
                "origin and messaging.domain must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn gate(&self) -> SubmissionGate {
        SubmissionGate::new(self.min_answered_ratio)
    }

    pub fn outbound_link(&self) -> OutboundLink {
        OutboundLink {
            domain: self.messaging.domain.clone(),
            recipient: self.messaging.recipient.clone(),
        }
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
