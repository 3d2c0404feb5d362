use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::state::ensure_tally_home;

pub const ANTHROPIC_ENV: &str = "ANTHROPIC_API_KEY";
pub const OPENAI_ENV: &str = "OPENAI_API_KEY";

/// API keys as stored in `auth.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Credentials {
    pub anthropic_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Credentials {
    /// Environment values win over file values; blank values are ignored.
    pub fn with_overrides(mut self, anthropic: Option<String>, openai: Option<String>) -> Self {
        let present = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        if let Some(k) = present(anthropic) {
            self.anthropic_api_key = Some(k);
        }
        if let Some(k) = present(openai) {
            self.openai_api_key = Some(k);
        }
        self
    }

    pub fn with_env(self) -> Self {
        self.with_overrides(std::env::var(ANTHROPIC_ENV).ok(), std::env::var(OPENAI_ENV).ok())
    }
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_tally_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<Credentials> {
    load_auth_from(&auth_path()?)
}

pub fn load_auth_from(p: &Path) -> Result<Credentials> {
    if !p.exists() {
        return Ok(Credentials::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_auth_to(auth: &Credentials, p: &Path) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn set_anthropic_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let key = prompt_secret("Paste Anthropic API key (starts with sk-ant-)")?;
    if !key.starts_with("sk-ant-") {
        bail!("key didn't look like an Anthropic API key (expected prefix sk-ant-)");
    }
    auth.anthropic_api_key = Some(key);
    save_auth_to(&auth, &p)?;
    println!("Saved Anthropic API key to {}", p.display());
    Ok(())
}

pub fn set_openai_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth_to(&auth, &p)?;
    println!("Saved OpenAI API key to {}", p.display());
    Ok(())
}

pub fn print_status() -> Result<()> {
    let creds = load_auth()?.with_env();
    let show = |k: &Option<String>| if k.is_some() { "set" } else { "not set" };
    println!("anthropic: {}", show(&creds.anthropic_api_key));
    println!("openai:    {}", show(&creds.openai_api_key));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_file_values() {
        let file = Credentials {
            anthropic_api_key: Some("sk-ant-file".to_string()),
            openai_api_key: None,
        };
        let merged = file.with_overrides(Some("  ".to_string()), Some("sk-env".to_string()));
        assert_eq!(merged.anthropic_api_key.as_deref(), Some("sk-ant-file"));
        assert_eq!(merged.openai_api_key.as_deref(), Some("sk-env"));
    }

    #[test]
    fn test_auth_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("auth.json");
        assert_eq!(load_auth_from(&p).unwrap(), Credentials::default());

        let creds = Credentials {
            anthropic_api_key: None,
            openai_api_key: Some("sk-test".to_string()),
        };
        save_auth_to(&creds, &p).unwrap();
        assert_eq!(load_auth_from(&p).unwrap(), creds);
    }
}
