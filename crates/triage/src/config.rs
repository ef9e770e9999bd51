//! Triage configuration.
//!
//! Resolution order: built-in defaults, then an optional TOML file, then
//! `TRIAGE_*` environment variables.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

use crate::cache::DEFAULT_TTL_MINUTES;
use crate::completion::{DEFAULT_BASE_URL, DEFAULT_MAX_OUTPUT_TOKENS};
use crate::error::ConfigError;
use crate::prompt::PromptConfig;
use crate::taxonomy::Severity;

/// Completion backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionSettings {
    /// Whether any backend request is made
    pub enabled: bool,
    /// OpenAI-compatible API base URL
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub max_output_tokens: u32,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Least severe fault that is sent to the backend
    pub min_severity: Severity,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            min_severity: Severity::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub ttl_minutes: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: DEFAULT_TTL_MINUTES,
        }
    }
}

impl CacheSettings {
    /// Entry lifetime as a duration.
    pub fn ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_minutes(self.ttl_minutes).ok_or_else(|| ConfigError::Invalid {
            key: "cache.ttl_minutes".to_string(),
            reason: format!("{} minutes is out of range", self.ttl_minutes),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Correlation groups diagnosed in parallel
    pub concurrency: usize,
    /// Log lines requested per resource
    pub log_tail_lines: u32,
    /// Tag every fault with this cluster identifier
    pub cluster_id: Option<String>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            concurrency: 4,
            log_tail_lines: 100,
            cluster_id: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    pub completion: CompletionSettings,
    pub prompt: PromptSettings,
    pub cache: CacheSettings,
    pub scan: ScanSettings,
}

impl TriageConfig {
    /// Load configuration from an optional file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without environment overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = env::var("TRIAGE_COMPLETION_ENABLED") {
            self.completion.enabled = parse_bool("TRIAGE_COMPLETION_ENABLED", &value)?;
        }
        if let Some(url) = non_empty_var("TRIAGE_COMPLETION_URL") {
            self.completion.base_url = url;
        }
        if let Some(model) = non_empty_var("TRIAGE_MODEL") {
            self.completion.model = model;
        }
        if let Some(value) = non_empty_var("TRIAGE_MIN_SEVERITY") {
            self.prompt.min_severity =
                value.parse().map_err(|reason| ConfigError::Invalid {
                    key: "TRIAGE_MIN_SEVERITY".to_string(),
                    reason,
                })?;
        }
        if let Some(value) = non_empty_var("TRIAGE_CACHE_TTL_MINUTES") {
            self.cache.ttl_minutes = value.parse().map_err(|e| ConfigError::Invalid {
                key: "TRIAGE_CACHE_TTL_MINUTES".to_string(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(cluster_id) = non_empty_var("TRIAGE_CLUSTER_ID") {
            self.scan.cluster_id = Some(cluster_id);
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cache.ttl_minutes < 0 {
            return Err(ConfigError::Invalid {
                key: "cache.ttl_minutes".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        self.cache.ttl()?;
        if self.scan.concurrency == 0 {
            return Err(ConfigError::Invalid {
                key: "scan.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Prompt builder settings derived from this configuration.
    #[must_use]
    pub fn prompt_config(&self) -> PromptConfig {
        PromptConfig {
            enabled: self.completion.enabled,
            min_severity: self.prompt.min_severity,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Invalid {
            key: key.to_string(),
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}
