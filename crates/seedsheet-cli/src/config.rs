use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use seedsheet_core::NativeTypeMapping;

/// File picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "seedsheet.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeMappingKind {
    SqlServer,
    Postgres,
}

impl TypeMappingKind {
    pub fn mapping(self) -> NativeTypeMapping {
        match self {
            TypeMappingKind::SqlServer => NativeTypeMapping::default_sql_server().clone(),
            TypeMappingKind::Postgres => NativeTypeMapping::default_postgres().clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub export: ExportSettings,
    pub import: ImportSettings,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub sheet_seed: Option<u64>,
    pub type_mapping: Option<TypeMappingKind>,
    pub schemas: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    pub namespace: Option<String>,
    pub strict: Option<bool>,
    pub flavors: Vec<FlavorSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlavorSettings {
    pub name: String,
    pub path: PathBuf,
}

impl Settings {
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load settings from `explicit`, or from `seedsheet.toml` when it exists.
///
/// An explicitly named file must exist; the implicit one is optional.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !path.exists() {
                return Ok(Settings::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let settings = Settings::from_toml(&content, &path)?;
    tracing::debug!(event = "config_loaded", path = %path.display());
    Ok(settings)
}
