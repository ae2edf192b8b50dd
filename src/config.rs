//! Configuration handling for web-analyzer

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::core::Severity;
use crate::error::{AnalyzerError, Result};

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = ".webanalyzer.json";

pub const DEFAULT_PORT: u16 = 3000;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Rule-specific configuration
    #[serde(default)]
    pub rules: RulesConfig,

    /// File patterns to exclude from review
    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub server: ServerSettings,
}

/// Rule-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    /// Rules to enable (supports wildcards like "aria-*")
    #[serde(default)]
    pub enable: Vec<String>,

    /// Rules to disable (supports wildcards)
    #[serde(default)]
    pub disable: Vec<String>,

    /// Override severity for specific rules
    #[serde(default)]
    pub severity: HashMap<String, String>,
}

/// HTTP server settings as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    /// Shared secret for `X-Hub-Signature-256`
    #[serde(default)]
    pub webhook_secret: Option<String>,

    /// Accept webhook deliveries without a signature when no secret is set
    #[serde(default)]
    pub allow_unsigned_webhooks: bool,

    #[serde(default)]
    pub github_token: Option<String>,

    /// Base URL of the GitHub REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Only pushes to this branch are analyzed
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: None,
            webhook_secret: None,
            allow_unsigned_webhooks: false,
            github_token: None,
            api_url: default_api_url(),
            default_branch: default_branch(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AnalyzerError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| {
            AnalyzerError::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Find and load configuration from the given directory or its parents
    pub fn find_and_load(start_dir: &Path) -> Option<Self> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("Ignoring {}: {}", config_path.display(), e);
                        None
                    }
                };
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Check if a rule should be enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        if matches_pattern(rule_id, &self.rules.disable) {
            return false;
        }

        if self.rules.enable.is_empty() {
            return true;
        }

        matches_pattern(rule_id, &self.rules.enable)
    }

    /// Check if a file should be excluded
    pub fn is_excluded(&self, path: &str) -> bool {
        self.exclude
            .iter()
            .filter_map(|pattern| glob::Pattern::new(pattern).ok())
            .any(|glob| glob.matches(path))
    }

    /// Overridden severity for a rule, if configured and recognised
    pub fn severity_override(&self, rule_id: &str) -> Option<Severity> {
        self.rules
            .severity
            .get(rule_id)
            .and_then(|s| Severity::from_name(s))
    }
}

fn matches_pattern(rule_id: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => rule_id.starts_with(prefix),
        None => pattern == rule_id,
    })
}

/// How webhook deliveries are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAuth {
    Secret(String),
    /// Explicit opt-in; every unsigned delivery is logged
    Unsigned,
}

/// Fully resolved server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub webhook_auth: WebhookAuth,
    pub github_token: Option<String>,
    pub api_url: String,
    pub default_branch: String,
}

/// Values that override the config file (environment, then CLI flags)
#[derive(Debug, Clone, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub webhook_secret: Option<String>,
    pub github_token: Option<String>,
    pub allow_unsigned_webhooks: bool,
}

impl ServerOverrides {
    /// Read `PORT`, `WEBHOOK_SECRET` and `GITHUB_TOKEN`
    pub fn from_env() -> Result<Self> {
        let port = match std::env::var("PORT") {
            Ok(value) => Some(value.trim().parse::<u16>().map_err(|_| {
                AnalyzerError::Config(format!("PORT must be a port number, got '{}'", value))
            })?),
            Err(_) => None,
        };
        Ok(Self {
            host: None,
            port,
            webhook_secret: non_empty_env("WEBHOOK_SECRET"),
            github_token: non_empty_env("GITHUB_TOKEN"),
            allow_unsigned_webhooks: false,
        })
    }

    /// Layer `other` on top of `self`
    pub fn merge(self, other: ServerOverrides) -> Self {
        Self {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            webhook_secret: other.webhook_secret.or(self.webhook_secret),
            github_token: other.github_token.or(self.github_token),
            allow_unsigned_webhooks: self.allow_unsigned_webhooks || other.allow_unsigned_webhooks,
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Resolve file settings and overrides into a runnable configuration
    ///
    /// Fails when no webhook secret is available and unsigned deliveries were
    /// not explicitly allowed.
    pub fn resolve(settings: &ServerSettings, overrides: ServerOverrides) -> Result<Self> {
        let secret = overrides
            .webhook_secret
            .or_else(|| settings.webhook_secret.clone())
            .filter(|s| !s.is_empty());
        let allow_unsigned = overrides.allow_unsigned_webhooks || settings.allow_unsigned_webhooks;

        let webhook_auth = match (secret, allow_unsigned) {
            (Some(secret), _) => WebhookAuth::Secret(secret),
            (None, true) => WebhookAuth::Unsigned,
            (None, false) => {
                return Err(AnalyzerError::Config(
                    "no webhook secret configured; set WEBHOOK_SECRET or enable allowUnsignedWebhooks"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            host: overrides
                .host
                .or_else(|| settings.host.clone())
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            port: overrides.port.or(settings.port).unwrap_or(DEFAULT_PORT),
            webhook_auth,
            github_token: overrides.github_token.or_else(|| settings.github_token.clone()),
            api_url: settings.api_url.clone(),
            default_branch: settings.default_branch.clone(),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
