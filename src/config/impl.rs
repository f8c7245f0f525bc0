use std::path::Path;
use std::sync::OnceLock;

use tracing::warn;

use super::StaticConfig;
use crate::errors::Result;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

static CONFIG: OnceLock<StaticConfig> = OnceLock::new();

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：旧版环境变量 > SL__* 环境变量 > 配置文件 > 默认值
    /// 示例：SL__SERVER__PORT=9999
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: StaticConfig = settings.try_deserialize()?;
        if Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }

        config.apply_legacy_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies the flat variables understood by earlier deployments
    /// (`DATABASE_PATH`, `BASE_URL`, `CACHE_SIZE`, `RATE_LIMIT_REQUESTS`,
    /// `RATE_LIMIT_WINDOW`).
    pub fn apply_legacy_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("DATABASE_PATH") {
            let dir = dir.trim_end_matches('/');
            self.database.database_url = if dir.is_empty() {
                "/urls.db".to_string()
            } else {
                format!("{}/urls.db", dir)
            };
        }

        if let Some(base_url) = lookup("BASE_URL") {
            self.server.base_url = base_url;
        }

        if let Some(raw) = lookup("CACHE_SIZE") {
            match raw.parse() {
                Ok(size) => self.cache.max_capacity = size,
                Err(_) => warn!("Ignoring invalid CACHE_SIZE: {}", raw),
            }
        }

        if let Some(raw) = lookup("RATE_LIMIT_REQUESTS") {
            match raw.parse() {
                Ok(requests) => self.rate_limit.requests = requests,
                Err(_) => warn!("Ignoring invalid RATE_LIMIT_REQUESTS: {}", raw),
            }
        }

        if let Some(raw) = lookup("RATE_LIMIT_WINDOW") {
            match raw.parse() {
                Ok(window) => self.rate_limit.window_secs = window,
                Err(_) => warn!("Ignoring invalid RATE_LIMIT_WINDOW: {}", raw),
            }
        }
    }

    /// `base_url` without a trailing slash
    pub fn base_url(&self) -> &str {
        self.server.base_url.trim_end_matches('/')
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::errors::SnaplinkError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Initialize the global configuration
///
/// Subsequent calls keep the first loaded value.
pub fn init_config(path: Option<&str>) -> Result<&'static StaticConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }
    let loaded = StaticConfig::load(path)?;
    Ok(CONFIG.get_or_init(|| loaded))
}

/// Get the global configuration instance
///
/// Falls back to defaults when `init_config` has not run (unit tests,
/// embedded use).
pub fn get_config() -> &'static StaticConfig {
    CONFIG.get_or_init(StaticConfig::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StaticConfig::default();
        assert_eq!(config.cache.max_capacity, 1000);
        assert_eq!(config.rate_limit.requests, 60);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.shortener.code_length, 6);
        assert_eq!(config.shortener.max_attempts, 10_000);
        assert_eq!(config.server.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_legacy_env_overrides() {
        let mut config = StaticConfig::default();
        config.apply_legacy_env(lookup_from(&[
            ("DATABASE_PATH", "/data/"),
            ("BASE_URL", "https://sn.ap"),
            ("CACHE_SIZE", "250"),
            ("RATE_LIMIT_REQUESTS", "5"),
            ("RATE_LIMIT_WINDOW", "10"),
        ]));

        assert_eq!(config.database.database_url, "/data/urls.db");
        assert_eq!(config.server.base_url, "https://sn.ap");
        assert_eq!(config.cache.max_capacity, 250);
        assert_eq!(config.rate_limit.requests, 5);
        assert_eq!(config.rate_limit.window_secs, 10);
    }

    #[test]
    fn test_legacy_env_ignores_garbage() {
        let mut config = StaticConfig::default();
        config.apply_legacy_env(lookup_from(&[("CACHE_SIZE", "lots")]));
        assert_eq!(config.cache.max_capacity, 1000);
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let mut config = StaticConfig::default();
        config.server.base_url = "http://localhost:8000/".to_string();
        assert_eq!(config.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snaplink.toml");
        std::fs::write(
            &path,
            "[cache]\nmax_capacity = 42\n\n[shortener]\ncode_length = 8\n",
        )
        .unwrap();

        let config = StaticConfig::load(path.to_str()).unwrap();
        assert_eq!(config.cache.max_capacity, 42);
        assert_eq!(config.shortener.code_length, 8);
        assert_eq!(config.rate_limit.requests, 60);
    }

    #[test]
    fn test_sample_config_round_trips() {
        let sample = StaticConfig::generate_sample_config();
        assert!(sample.contains("[rate_limit]"));
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.cache.max_capacity, 1000);
    }
}
