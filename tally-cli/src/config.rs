use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tally_finance::config::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE};
use tally_finance::import::DEFAULT_CONCURRENCY;
use tally_finance::{CategorizerConfig, Provider, RemoteConfig};
use tracing::warn;

use crate::auth::Credentials;
use crate::state::ensure_tally_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub import: ImportSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// "auto" picks whichever provider has a key (Anthropic first),
    /// otherwise "anthropic" or "openai".
    pub provider: String,
    /// Provider default when unset
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    pub concurrency: usize,
    /// Set false to never call a remote classifier
    pub remote: bool,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            model: None,
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_secs: Some(30),
        }
    }
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            remote: true,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}

impl Config {
    /// Turn file settings plus credentials into categorizer configuration.
    ///
    /// A provider pinned in the config but lacking its key degrades to
    /// rules-only with a warning rather than failing the command.
    pub fn categorizer_config(&self, creds: &Credentials, allow_remote: bool) -> Result<CategorizerConfig> {
        if !allow_remote || !self.import.remote {
            return Ok(CategorizerConfig::rules_only());
        }

        let base = match self.llm.provider.trim().to_lowercase().as_str() {
            "auto" | "" => CategorizerConfig::from_credentials(
                creds.anthropic_api_key.as_deref(),
                creds.openai_api_key.as_deref(),
            ),
            "anthropic" => pinned(Provider::Anthropic, creds.anthropic_api_key.as_deref()),
            "openai" => pinned(Provider::OpenAI, creds.openai_api_key.as_deref()),
            other => bail!("unknown llm.provider '{other}' (expected auto, anthropic or openai)"),
        };

        Ok(CategorizerConfig {
            remote: base.remote.map(|r| self.apply_llm_overrides(r)),
        })
    }

    fn apply_llm_overrides(&self, mut remote: RemoteConfig) -> RemoteConfig {
        if let Some(model) = self.llm.model.as_ref().filter(|m| !m.trim().is_empty()) {
            remote.model = model.trim().to_string();
        }
        if let Some(url) = self.llm.base_url.as_ref().filter(|u| !u.trim().is_empty()) {
            remote.base_url = url.trim().to_string();
        }
        remote.temperature = self.llm.temperature;
        remote.max_tokens = self.llm.max_tokens;
        remote.timeout = self.llm.timeout_secs.map(Duration::from_secs);
        remote
    }
}

fn pinned(provider: Provider, key: Option<&str>) -> CategorizerConfig {
    match key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => CategorizerConfig {
            remote: Some(RemoteConfig::new(provider, key)),
        },
        None => {
            warn!(%provider, "llm.provider is set but no API key is configured; using rules only");
            CategorizerConfig::rules_only()
        }
    }
}
