use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User configuration for discstats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the catalog and the uploads folder
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,

    #[serde(default)]
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Rows printed by `show` when `--rows` is not given
    #[serde(default = "default_preview_rows")]
    pub rows: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            preview: PreviewConfig::default(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            rows: default_preview_rows(),
        }
    }
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data")
}

fn default_preview_rows() -> usize {
    5
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path`, writing the defaults there first if it is missing
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "discstats", "discstats") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.discstats/config.toml")
        }
    }
}
