//! Categorizer configuration. Credentials are passed in explicitly; nothing
//! here reads the environment.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_MAX_TOKENS: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "openai")]
    OpenAI,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Anthropic => "claude-3-5-haiku-latest",
            Provider::OpenAI => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Anthropic => "https://api.anthropic.com",
            Provider::OpenAI => "https://api.openai.com",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Provider::Anthropic => "anthropic",
            Provider::OpenAI => "openai",
        })
    }
}

/// Remote classification provider settings.
#[derive(Clone)]
pub struct RemoteConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// None leaves the HTTP client's default in place
    pub timeout: Option<Duration>,
}

impl RemoteConfig {
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: provider.default_model().to_string(),
            base_url: provider.default_base_url().to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: None,
        }
    }

    /// `base_url` joined with `path`, tolerating a trailing slash.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CategorizerConfig {
    pub remote: Option<RemoteConfig>,
}

impl CategorizerConfig {
    pub fn rules_only() -> Self {
        Self { remote: None }
    }

    /// Select the provider by which credential is present. Anthropic wins
    /// when both are set; blank keys count as absent.
    pub fn from_credentials(anthropic_key: Option<&str>, openai_key: Option<&str>) -> Self {
        let present = |k: Option<&str>| k.map(str::trim).filter(|k| !k.is_empty()).map(str::to_string);

        let remote = match (present(anthropic_key), present(openai_key)) {
            (Some(key), _) => Some(RemoteConfig::new(Provider::Anthropic, key)),
            (None, Some(key)) => Some(RemoteConfig::new(Provider::OpenAI, key)),
            (None, None) => None,
        };
        Self { remote }
    }
}
