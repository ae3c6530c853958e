use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TRANSLATE_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_TRANSLATE_MAX_TOKENS: u32 = 8000;
pub const DEFAULT_LINKS_PATH: &str = "image_links.json";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub translate_url: Option<String>,
    pub translate_model: String,
    pub translate_max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StorageBackend {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub concurrency: usize,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub validator: ValidatorConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            base_url: None,
            api_key: None,
            translate_url: None,
            translate_model: DEFAULT_TRANSLATE_MODEL.to_string(),
            translate_max_tokens: DEFAULT_TRANSLATE_MAX_TOKENS,
        }
    }
}

impl ApiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let base_url = env::var("OPEN_AI_BASE").ok();
        let api_key = env::var("OPEN_AI_KEY").ok();
        let translate_url = env::var("OPEN_AI_TRANSLATE_URL").ok();
        let translate_model =
            env::var("TRANSLATE_MODEL").unwrap_or_else(|_| DEFAULT_TRANSLATE_MODEL.to_string());
        let translate_max_tokens = env::var("TRANSLATE_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TRANSLATE_MAX_TOKENS);

        ApiConfig {
            base_url,
            api_key,
            translate_url,
            translate_model,
            translate_max_tokens,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_translate_url(mut self, url: impl Into<String>) -> Self {
        self.translate_url = Some(url.into());
        self
    }

    pub fn with_translate_model(mut self, model: impl Into<String>) -> Self {
        self.translate_model = model.into();
        self
    }

    /// Chat-completion endpoint used for translation, falling back to the
    /// image API's own `/v1/chat/completions`.
    pub fn chat_completions_url(&self) -> Option<String> {
        self.translate_url.clone().or_else(|| {
            self.base_url
                .as_deref()
                .map(|base| format!("{}/v1/chat/completions", base.trim_end_matches('/')))
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            backend: StorageBackend::File(PathBuf::from(DEFAULT_LINKS_PATH)),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let path = env::var("IMAGE_LINKS_PATH").unwrap_or_else(|_| DEFAULT_LINKS_PATH.to_string());
        StorageConfig {
            backend: StorageBackend::File(PathBuf::from(path)),
        }
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.backend = StorageBackend::File(path.into());
        self
    }

    pub fn in_memory(mut self) -> Self {
        self.backend = StorageBackend::Memory;
        self
    }
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        ValidatorConfig {
            concurrency: 8,
            timeout: Duration::from_secs(10),
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let defaults = Self::default();
        let concurrency = env::var("LINK_CHECK_CONCURRENCY")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &usize| *n > 0)
            .unwrap_or(defaults.concurrency);
        let timeout = env::var("LINK_CHECK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|secs: &u64| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        ValidatorConfig {
            concurrency,
            timeout,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// A zero timeout would fail every check, so it falls back to the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = if timeout.is_zero() {
            Self::default().timeout
        } else {
            timeout
        };
        self
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Config {
            api: ApiConfig::from_env(),
            storage: StorageConfig::from_env(),
            validator: ValidatorConfig::from_env(),
        }
    }

    pub fn with_api(mut self, config: ApiConfig) -> Self {
        self.api = config;
        self
    }

    pub fn with_storage(mut self, config: StorageConfig) -> Self {
        self.storage = config;
        self
    }

    pub fn with_validator(mut self, config: ValidatorConfig) -> Self {
        self.validator = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_defaults_to_base() {
        let config = ApiConfig::new().with_base_url("https://api.example.com/");
        assert_eq!(
            config.chat_completions_url().as_deref(),
            Some("https://api.example.com/v1/chat/completions")
        );

        let config = config.with_translate_url("https://translate.example.com/chat");
        assert_eq!(
            config.chat_completions_url().as_deref(),
            Some("https://translate.example.com/chat")
        );

        assert!(ApiConfig::new().chat_completions_url().is_none());
    }

    #[test]
    fn validator_concurrency_is_at_least_one() {
        assert_eq!(ValidatorConfig::new().with_concurrency(0).concurrency, 1);
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let config = ValidatorConfig::new().with_timeout(Duration::ZERO);
        assert_eq!(config.timeout, Duration::from_secs(10));

        let config = ValidatorConfig::new().with_timeout(Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_millis(250));
    }
}
