use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::TaxonError;

pub const DEFAULT_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/";
pub const DEFAULT_CONFIG_FILE: &str = "kira-taxon.json";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_SECONDS: f64 = 10.0;

pub const EMAIL_ENV: &str = "NCBI_EMAIL_ADDR";
pub const TOOL_ENV: &str = "NCBI_TOOL_NAME";
pub const API_KEY_ENV: &str = "NCBI_API_KEY";

/// Validated settings for one [`crate::client::TaxonomyClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    contact_email: String,
    tool_name: String,
    api_key: Option<String>,
    accepted_ranks: Option<BTreeSet<String>>,
    max_attempts: u32,
    timeout: Duration,
    base_url: String,
}

impl ClientConfig {
    pub fn new(contact_email: &str, tool_name: &str) -> Result<Self, TaxonError> {
        Ok(Self {
            contact_email: check_entrez_param(contact_email, "email")?,
            tool_name: check_entrez_param(tool_name, "tool")?,
            api_key: None,
            accepted_ranks: None,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECONDS),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_api_key(mut self, api_key: &str) -> Result<Self, TaxonError> {
        let trimmed = api_key.trim();
        self.api_key = if trimmed.is_empty() {
            None
        } else {
            Some(check_entrez_param(trimmed, "api_key")?)
        };
        Ok(self)
    }

    pub fn with_accepted_ranks<I, S>(mut self, ranks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted_ranks = Some(ranks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout_seconds(mut self, seconds: f64) -> Result<Self, TaxonError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(TaxonError::InvalidConfig(format!(
                "timeout must be a positive number of seconds, got {seconds}"
            )));
        }
        self.timeout = Duration::try_from_secs_f64(seconds).map_err(|err| {
            TaxonError::InvalidConfig(format!("timeout of {seconds} seconds: {err}"))
        })?;
        Ok(self)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, TaxonError> {
        let trimmed = base_url.trim();
        if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
            return Err(TaxonError::InvalidConfig(format!(
                "base url must be http(s), got {base_url:?}"
            )));
        }
        self.base_url = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{trimmed}/")
        };
        Ok(self)
    }

    pub fn contact_email(&self) -> &str {
        &self.contact_email
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn accepted_ranks(&self) -> Option<&BTreeSet<String>> {
        self.accepted_ranks.as_ref()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// Entrez asks for `email` and `tool` values without internal spaces.
fn check_entrez_param(value: &str, name: &str) -> Result<String, TaxonError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaxonError::InvalidConfig(format!("{name} must not be empty")));
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(TaxonError::InvalidConfig(format!(
            "{name} must not contain internal whitespace, got {value:?}"
        )));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub accepted_ranks: Option<Vec<String>>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub timeout_seconds: Option<f64>,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvDefaults {
    pub email: Option<String>,
    pub tool: Option<String>,
    pub api_key: Option<String>,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        Self {
            email: std::env::var(EMAIL_ENV).ok(),
            tool: std::env::var(TOOL_ENV).ok(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        }
    }
}

/// Builds a [`ClientConfig`] from an optional JSON file layered over the
/// `NCBI_*` environment variables.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ClientConfig, TaxonError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        let file = if path.is_none() && !config_path.exists() {
            ConfigFile::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| TaxonError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| TaxonError::ConfigParse(err.to_string()))?
        };

        Self::resolve_config(file, EnvDefaults::from_env())
    }

    pub fn resolve_config(file: ConfigFile, env: EnvDefaults) -> Result<ClientConfig, TaxonError> {
        let email = file.email.or(env.email).ok_or_else(|| {
            TaxonError::InvalidConfig(format!("contact email missing; set {EMAIL_ENV}"))
        })?;
        let tool = file.tool.or(env.tool).ok_or_else(|| {
            TaxonError::InvalidConfig(format!("tool name missing; set {TOOL_ENV}"))
        })?;

        let mut config = ClientConfig::new(&email, &tool)?;
        if let Some(api_key) = file.api_key.or(env.api_key) {
            config = config.with_api_key(&api_key)?;
        }
        if let Some(ranks) = file.accepted_ranks {
            config = config.with_accepted_ranks(ranks);
        }
        if let Some(max_attempts) = file.max_attempts {
            config = config.with_max_attempts(max_attempts);
        }
        if let Some(seconds) = file.timeout_seconds {
            config = config.with_timeout_seconds(seconds)?;
        }
        if let Some(base_url) = file.base_url {
            config = config.with_base_url(&base_url)?;
        }
        Ok(config)
    }
}
