use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{ContainerCatalog, ContainerEnvelope, ContainerType, CostPolicy, RecommendationPolicy};

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "ImportEstimator";
const APP_NAME: &str = "ImportEstimator";
const CONFIG_FILENAME: &str = "config.json";

pub const DEFAULT_TARIFF_PERCENT: f64 = 8.0;

/// Tunable thresholds and reference data, persisted as JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EstimatorConfig {
    pub recommendation: RecommendationPolicy,
    pub cost: CostPolicy,
    /// Duty rate used when no candidate rates are supplied.
    pub default_tariff_percent: f64,
    /// Per-type replacements for the standard container envelopes.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub containers: BTreeMap<ContainerType, ContainerEnvelope>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            recommendation: RecommendationPolicy::default(),
            cost: CostPolicy::default(),
            default_tariff_percent: DEFAULT_TARIFF_PERCENT,
            containers: BTreeMap::new(),
        }
    }
}

impl EstimatorConfig {
    pub fn catalog(&self) -> ContainerCatalog {
        ContainerCatalog::standard().with_overrides(&self.containers)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config directory unavailable")]
    StorageUnavailable,
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed config {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config {}: defaultTariffPercent {value} must be a finite, non-negative percentage", path.display())]
    InvalidTariff { path: PathBuf, value: f64 },
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Loads `path`, or the platform default when `None`. A missing file yields
/// the defaults; an unreadable or malformed one is an error.
pub fn load_config(path: Option<&Path>) -> Result<EstimatorConfig, ConfigError> {
    let explicit = path.is_some();
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => {
                debug!("no config directory on this platform; using defaults");
                return Ok(EstimatorConfig::default());
            }
        },
    };

    let data = match fs::read_to_string(&path) {
        Ok(data) => data,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            if explicit {
                warn!(path = %path.display(), "config file not found; using defaults");
            } else {
                debug!(path = %path.display(), "no config file; using defaults");
            }
            return Ok(EstimatorConfig::default());
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let config: EstimatorConfig = serde_json::from_str(&data)
        .map_err(|source| ConfigError::Malformed { path: path.clone(), source })?;
    validate(&config, &path)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn validate(config: &EstimatorConfig, path: &Path) -> Result<(), ConfigError> {
    let value = config.default_tariff_percent;
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::InvalidTariff { path: path.to_path_buf(), value });
    }
    Ok(())
}

/// Writes `config` as pretty JSON and returns the path written.
pub fn save_config(config: &EstimatorConfig, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_config_path().ok_or(ConfigError::StorageUnavailable)?,
    };
    validate(config, &path)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(&path, json)?;
    debug!(path = %path.display(), "saved config");
    Ok(path)
}
