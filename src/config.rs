use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::Pricing;
use crate::error::{AppError, Result};
use crate::pipeline::DEFAULT_ARTICLE_LIMIT;
use crate::sources::nextias::DEFAULT_LOOKBACK_DAYS;
use crate::sources::SettleDelays;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub openai_api_key: Option<String>,

    #[serde(default = "default_openai_base_url")]
    pub openai_base_url: String,

    #[serde(default = "default_model_name")]
    pub model_name: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_input_rate")]
    pub input_rate_per_1k: f64,

    #[serde(default = "default_output_rate")]
    pub output_rate_per_1k: f64,

    #[serde(default = "default_article_limit")]
    pub article_limit: usize,

    #[serde(default = "default_listing_settle_secs")]
    pub listing_settle_secs: u64,

    #[serde(default = "default_article_settle_secs")]
    pub article_settle_secs: u64,

    #[serde(default = "default_lookback_days")]
    pub lookback_days: u64,

    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default)]
    pub no_sandbox: bool,

    pub chrome_path: Option<PathBuf>,

    pub secret_token: Option<String>,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ca-digest");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model_name() -> String {
    "gpt-4o".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_input_rate() -> f64 {
    Pricing::default().input_per_1k
}

fn default_output_rate() -> f64 {
    Pricing::default().output_per_1k
}

fn default_article_limit() -> usize {
    DEFAULT_ARTICLE_LIMIT
}

fn default_listing_settle_secs() -> u64 {
    3
}

fn default_article_settle_secs() -> u64 {
    2
}

fn default_lookback_days() -> u64 {
    DEFAULT_LOOKBACK_DAYS
}

fn default_true() -> bool {
    true
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            openai_api_key: None,
            openai_base_url: default_openai_base_url(),
            model_name: default_model_name(),
            temperature: default_temperature(),
            input_rate_per_1k: default_input_rate(),
            output_rate_per_1k: default_output_rate(),
            article_limit: default_article_limit(),
            listing_settle_secs: default_listing_settle_secs(),
            article_settle_secs: default_article_settle_secs(),
            lookback_days: default_lookback_days(),
            headless: true,
            no_sandbox: false,
            chrome_path: None,
            secret_token: None,
            bind_addr: default_bind_addr(),
        }
    }
}

impl Config {
    /// Load from `path` (or the default location), writing defaults on first
    /// run, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            config
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ca-digest")
            .join("config.toml")
    }

    /// Secrets and the database location can come from the environment.
    /// Blank values are ignored.
    fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| var(key).filter(|value| !value.trim().is_empty());

        if let Some(key) = non_blank("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }
        if let Some(token) = non_blank("SECRET_TOKEN") {
            self.secret_token = Some(token);
        }
        if let Some(path) = non_blank("DATABASE_PATH") {
            self.db_path = path;
        }
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("OPENAI_API_KEY is not set".to_string()))
    }

    pub fn pricing(&self) -> Pricing {
        Pricing {
            input_per_1k: self.input_rate_per_1k,
            output_per_1k: self.output_rate_per_1k,
        }
    }

    pub fn settle_delays(&self) -> SettleDelays {
        SettleDelays {
            listing: Duration::from_secs(self.listing_settle_secs),
            article: Duration::from_secs(self.article_settle_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert!(path.exists());
        assert_eq!(config.model_name, "gpt-4o");
        assert_eq!(config.article_limit, 10);
        assert_eq!(config.lookback_days, 5);
        assert_eq!(config.bind_addr, "127.0.0.1:5000");
        assert!(config.headless);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "article_limit = 3\nmodel_name = \"gpt-4o-mini\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.article_limit, 3);
        assert_eq!(config.model_name, "gpt-4o-mini");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.pricing(), Pricing::default());
        assert_eq!(config.settle_delays(), SettleDelays::default());
    }

    #[test]
    fn test_env_overrides_file() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-env"),
            ("SECRET_TOKEN", "  "),
            ("DATABASE_PATH", "/tmp/news.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config {
            secret_token: Some("from-file".to_string()),
            ..Config::default()
        };
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.require_api_key().unwrap(), "sk-env");
        assert_eq!(config.secret_token.as_deref(), Some("from-file"));
        assert_eq!(config.db_path, "/tmp/news.db");
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let config = Config::default();
        assert!(matches!(config.require_api_key(), Err(AppError::Config(_))));
    }
}
