//! Runtime configuration.
//!
//! Layers, later wins:
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory, or an explicit file
//! 3. `APIX_*` environment variables (`APIX_ROOT_DIR`, `APIX_TIMEOUT_SECS`, ...)

use std::path::{Path, PathBuf};
use std::time::Duration;

use apix_application::ExecuteOptions;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::{DEFAULT_MAX_REDIRECTS, DEFAULT_USER_AGENT};

const APP_DIR: &str = "apix";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "APIX";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A source could not be read or a value has the wrong type.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Settings fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApixConfig {
    /// Root directory of the record store.
    pub root_dir: PathBuf,
    /// Transport timeout in seconds.
    pub timeout_secs: u64,
    /// Prefix for URLs without a scheme.
    #[serde(default)]
    pub base_url: Option<String>,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Whether executed requests are kept in the history log.
    pub record_history: bool,
    /// Redirects followed before giving up.
    pub max_redirects: usize,
}

impl ApixConfig {
    /// Loads configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    /// Transport timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Base URL, ignoring a blank value.
    #[must_use]
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref().map(str::trim).filter(|url| !url.is_empty())
    }

    /// Execution settings derived from this configuration.
    #[must_use]
    pub const fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions {
            timeout: self.timeout(),
            record_history: self.record_history,
        }
    }
}

/// Default root of the record store: `<config dir>/apix`.
#[must_use]
pub fn default_root_dir() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from(".apix"), |dir| dir.join(APP_DIR))
}

/// Configuration loader with layered merging.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: Option<Map<String, String>>,
}

impl ConfigLoader {
    /// Creates a loader using the default file location and the process
    /// environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `path` instead of the default file; the file must exist.
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reads `APIX_*` variables from `vars` instead of the process
    /// environment.
    #[must_use]
    pub fn with_env(mut self, vars: Map<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Loads the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if an explicit file is missing,
    /// or [`ConfigError::Load`] if a source is malformed.
    pub fn load(&self) -> Result<ApixConfig, ConfigError> {
        let mut builder = Config::builder()
            .set_default("root_dir", default_root_dir().to_string_lossy().into_owned())?
            .set_default("timeout_secs", 30_i64)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("record_history", true)?
            .set_default("max_redirects", i64::try_from(DEFAULT_MAX_REDIRECTS).unwrap_or(10))?;

        builder = match &self.file {
            Some(path) if !path.exists() => return Err(ConfigError::FileNotFound(path.clone())),
            Some(path) => builder.add_source(File::from(path.as_path())),
            None => match dirs::config_dir() {
                Some(dir) => builder
                    .add_source(File::from(dir.join(APP_DIR).join(CONFIG_FILE)).required(false)),
                None => builder,
            },
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .try_parsing(true)
                .source(self.env.clone()),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn env(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let (_dir, path) = write_config("");
        let config = ConfigLoader::new()
            .with_file(&path)
            .with_env(Map::new())
            .load()
            .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.max_redirects, 10);
        assert!(config.record_history);
        assert_eq!(config.base_url(), None);
        assert_eq!(config.root_dir, default_root_dir());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let (_dir, path) = write_config(
            "root_dir = \"/tmp/apix-store\"\ntimeout_secs = 5\nbase_url = \"https://api.example.com\"\n",
        );
        let config = ConfigLoader::new()
            .with_file(&path)
            .with_env(Map::new())
            .load()
            .unwrap();
        assert_eq!(config.root_dir, PathBuf::from("/tmp/apix-store"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url(), Some("https://api.example.com"));
    }

    #[test]
    fn test_environment_overrides_file() {
        let (_dir, path) = write_config("timeout_secs = 5\nrecord_history = true\n");
        let config = ConfigLoader::new()
            .with_file(&path)
            .with_env(env(&[
                ("APIX_TIMEOUT_SECS", "12"),
                ("APIX_RECORD_HISTORY", "false"),
                ("OTHER_TIMEOUT_SECS", "99"),
            ]))
            .load()
            .unwrap();
        assert_eq!(config.timeout_secs, 12);
        assert!(!config.execute_options().record_history);
    }

    #[test]
    fn test_blank_base_url_is_none() {
        let (_dir, path) = write_config("base_url = \"  \"\n");
        let config = ConfigLoader::new()
            .with_file(&path)
            .with_env(Map::new())
            .load()
            .unwrap();
        assert_eq!(config.base_url(), None);
    }

    #[test]
    fn test_missing_explicit_file() {
        let result = ConfigLoader::new()
            .with_file("/definitely/missing/apix.toml")
            .with_env(Map::new())
            .load();
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_bad_value_type() {
        let (_dir, path) = write_config("timeout_secs = \"soon\"\n");
        let result = ConfigLoader::new()
            .with_file(&path)
            .with_env(Map::new())
            .load();
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }
}
