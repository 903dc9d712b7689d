use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

/// Default backend address.
fn default_backend_url() -> String {
    "http://127.0.0.1:4242".to_string()
}

/// Default task poll interval (500ms).
fn default_poll_interval() -> Duration {
    Duration::from_millis(500)
}

/// Default task timeout (10 minutes).
fn default_task_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend, without the `/api/1` suffix.
    pub url: String,

    /// How often a pending task is polled.
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub poll_interval: Duration,

    /// Give up on a task that has not completed after this long.
    #[serde(
        default = "default_task_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub task_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            poll_interval: default_poll_interval(),
            task_timeout: default_task_timeout(),
        }
    }
}

/// Optional backend modules that gate some queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Eth2,
    Loopring,
    Nfts,
}

fn default_currency_symbol() -> String {
    "USD".to_string()
}

/// User settings read while computing views.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Include staking validators in the breakdown of the native chain asset.
    pub treat_eth2_as_eth: bool,

    /// Currency that location totals are converted to.
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Backend modules the user has enabled.
    pub active_modules: Vec<Module>,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            treat_eth2_as_eth: false,
            currency_symbol: default_currency_symbol(),
            active_modules: Vec::new(),
        }
    }
}

impl GeneralSettings {
    pub fn is_module_active(&self, module: Module) -> bool {
        self.active_modules.contains(&module)
    }
}

/// Asset aliasing and ignore configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Maps an asset to the asset it is merged into (e.g. `SAI = "DAI"`).
    pub aliases: BTreeMap<String, String>,

    /// Assets hidden from every aggregate.
    pub ignored: Vec<String>,

    /// Regexes matched against asset identifiers; a match hides the asset.
    pub ignored_patterns: Vec<String>,

    /// Identifiers of assets known to be ethereum tokens.
    pub ethereum_tokens: Vec<String>,
}

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend connection settings.
    pub backend: BackendConfig,

    /// General user settings.
    pub settings: GeneralSettings,

    /// Asset alias and ignore settings.
    pub assets: AssetsConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Returns the default config path.
///
/// Prefers `./chainfolio.toml` when present, otherwise the per-user config directory.
pub fn default_config_path() -> PathBuf {
    let local = PathBuf::from("chainfolio.toml");
    if local.exists() {
        return local;
    }

    dirs::config_dir()
        .map(|dir| dir.join("chainfolio").join("chainfolio.toml"))
        .unwrap_or(local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.url, "http://127.0.0.1:4242");
        assert_eq!(config.backend.poll_interval, Duration::from_millis(500));
        assert_eq!(config.settings.currency_symbol, "USD");
        assert!(!config.settings.treat_eth2_as_eth);
        assert!(config.assets.aliases.is_empty());
    }

    #[test]
    fn test_load_full_config() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[backend]
url = "http://localhost:5042"
poll_interval = "2s"
task_timeout = "1m"

[settings]
treat_eth2_as_eth = true
currency_symbol = "EUR"
active_modules = ["eth2", "loopring"]

[assets]
ignored = ["SPAM"]
ignored_patterns = ["^SCAM-"]
ethereum_tokens = ["DAI"]

[assets.aliases]
SAI = "DAI"
"#
        )?;

        let config = Config::load(file.path())?;
        assert_eq!(config.backend.url, "http://localhost:5042");
        assert_eq!(config.backend.poll_interval, Duration::from_secs(2));
        assert_eq!(config.backend.task_timeout, Duration::from_secs(60));
        assert!(config.settings.treat_eth2_as_eth);
        assert_eq!(config.settings.currency_symbol, "EUR");
        assert!(config.settings.is_module_active(Module::Loopring));
        assert!(!config.settings.is_module_active(Module::Nfts));
        assert_eq!(config.assets.aliases.get("SAI").map(String::as_str), Some("DAI"));
        assert_eq!(config.assets.ignored, vec!["SPAM".to_string()]);
        Ok(())
    }

    #[test]
    fn test_partial_config_keeps_defaults() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            r#"
[settings]
treat_eth2_as_eth = true
"#
        )?;

        let config = Config::load(file.path())?;
        assert!(config.settings.treat_eth2_as_eth);
        assert_eq!(config.settings.currency_symbol, "USD");
        assert_eq!(config.backend.task_timeout, Duration::from_secs(600));
        Ok(())
    }

    #[test]
    fn test_load_or_default_missing_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = Config::load_or_default(&dir.path().join("missing.toml"))?;
        assert_eq!(config.backend.url, "http://127.0.0.1:4242");
        Ok(())
    }
}
