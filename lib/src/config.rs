use crate::error::Result;
use crate::favicon::FaviconMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// User-agent sent to the icon provider
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Favicon service; the site origin is appended to this prefix
    #[serde(default = "default_icon_provider_url")]
    pub icon_provider_url: String,

    /// How fetched icons are stored on the bookmark row
    #[serde(default)]
    pub favicon_mode: FaviconMode,

    /// Size of the background icon enrichment pool
    #[serde(default = "default_enrich_workers")]
    pub enrich_workers: usize,

    /// Queue every bookmark without an icon when the application starts
    #[serde(default)]
    pub enrich_on_startup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            icon_provider_url: default_icon_provider_url(),
            favicon_mode: FaviconMode::default(),
            enrich_workers: default_enrich_workers(),
            enrich_on_startup: false,
        }
    }
}

fn default_user_agent() -> String {
    concat!("bkmtree/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_icon_provider_url() -> String {
    "http://www.google.com/s2/favicons?domain_url=".to_string()
}

fn default_enrich_workers() -> usize {
    num_cpus::get().clamp(1, 4)
}

impl Config {
    pub fn default_path() -> PathBuf {
        crate::utils::get_config_dir().join("config.yml")
    }

    /// Load configuration from a file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        if config.enrich_workers == 0 {
            log::warn!("enrich_workers must be at least 1, using 1");
            config.enrich_workers = 1;
        }
        Ok(config)
    }

    /// Load configuration from default location (~/.config/bkmtree/config.yml)
    /// Falls back to default config if file doesn't exist or is unreadable
    pub fn load() -> Self {
        Self::load_or_default(&Self::default_path())
    }

    pub fn load_or_default(config_path: &Path) -> Self {
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from_path(config_path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!(
                    "Failed to load config from {:?}: {}. Using default configuration",
                    config_path,
                    e
                );
                Self::default()
            }
        }
    }

    /// Save configuration to a file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::default_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BkmError;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.user_agent.starts_with("bkmtree/"));
        assert!(config.icon_provider_url.ends_with("domain_url="));
        assert_eq!(config.favicon_mode, FaviconMode::DataUri);
        assert!((1..=4).contains(&config.enrich_workers));
        assert!(!config.enrich_on_startup);
    }

    #[test]
    fn test_save_and_load() {
        let temp_file = NamedTempFile::new().unwrap();
        let config_path = temp_file.path();

        let original = Config {
            user_agent: "Custom User Agent".to_string(),
            icon_provider_url: "http://icons.test/?u=".to_string(),
            favicon_mode: FaviconMode::Legacy,
            enrich_workers: 2,
            enrich_on_startup: true,
        };

        original.save_to_path(config_path).unwrap();
        let loaded = Config::load_from_path(config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let temp_file = NamedTempFile::new().unwrap();
        let config_path = temp_file.path();

        fs::write(config_path, "invalid: yaml: content:").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(result, Err(BkmError::Yaml(_))));
        assert_eq!(Config::load_or_default(config_path), Config::default());
    }

    #[test]
    fn test_load_partial_config() {
        let temp_file = NamedTempFile::new().unwrap();
        let config_path = temp_file.path();

        fs::write(config_path, "favicon_mode: legacy\nenrich_workers: 0\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.favicon_mode, FaviconMode::Legacy);
        assert_eq!(config.enrich_workers, 1);
        assert_eq!(config.user_agent, default_user_agent());
        assert_eq!(config.icon_provider_url, default_icon_provider_url());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.yml"));
        assert_eq!(config, Config::default());
    }
}
