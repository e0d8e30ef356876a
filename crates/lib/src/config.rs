//! Configuration types and loading.
//!
//! Config is loaded once per process from a JSON file (e.g. `~/.parley/config.json`) and
//! the environment, then passed by reference to the gateway and the turn dispatcher.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Dialog engine identity and endpoint.
    #[serde(default)]
    pub dialog: DialogConfig,
}

/// Gateway bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 15152).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    15152
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// Which dialog engine API generation the upstream speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiGeneration {
    /// Previous generation: single `message` + `messageFormat` replies.
    V1,
    /// Current generation: `messages` list, compressed on session calls.
    #[default]
    V2,
}

/// Dialog engine bot identity, start intent, and endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogConfig {
    /// Base URL of the runtime endpoint (a signing proxy or local emulator). Overridden by PARLEY_DIALOG_ENDPOINT.
    #[serde(default = "default_dialog_endpoint")]
    pub endpoint: String,

    /// API generation used for request paths and bodies.
    #[serde(default)]
    pub api_generation: ApiGeneration,

    /// Bot id (v2) or bot name (v1). Overridden by LEXBOT_ID.
    #[serde(default)]
    pub bot_id: String,

    /// Bot alias id. Overridden by LEXBOT_ALIAS_ID.
    #[serde(default)]
    pub bot_alias_id: String,

    /// Locale (v2 only). Overridden by LEXBOT_LOCALE_ID.
    #[serde(default = "default_locale_id")]
    pub locale_id: String,

    /// Intent the engine is delegated to on a session-start turn. Overridden by WELCOME_INTENT.
    #[serde(default)]
    pub welcome_intent: String,
}

fn default_dialog_endpoint() -> String {
    "http://127.0.0.1:4566".to_string()
}

fn default_locale_id() -> String {
    "en_US".to_string()
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            endpoint: default_dialog_endpoint(),
            api_generation: ApiGeneration::default(),
            bot_id: String::new(),
            bot_alias_id: String::new(),
            locale_id: default_locale_id(),
            welcome_intent: String::new(),
        }
    }
}

/// Non-empty, trimmed value of an environment variable.
fn env_override(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

impl DialogConfig {
    /// Apply LEXBOT_ID, LEXBOT_ALIAS_ID, LEXBOT_LOCALE_ID, WELCOME_INTENT and PARLEY_DIALOG_ENDPOINT.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_override("LEXBOT_ID") {
            self.bot_id = v;
        }
        if let Some(v) = env_override("LEXBOT_ALIAS_ID") {
            self.bot_alias_id = v;
        }
        if let Some(v) = env_override("LEXBOT_LOCALE_ID") {
            self.locale_id = v;
        }
        if let Some(v) = env_override("WELCOME_INTENT") {
            self.welcome_intent = v;
        }
        if let Some(v) = env_override("PARLEY_DIALOG_ENDPOINT") {
            self.endpoint = v;
        }
    }

    /// Names of required settings that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.bot_id.trim().is_empty() {
            missing.push("dialog.botId");
        }
        if self.bot_alias_id.trim().is_empty() {
            missing.push("dialog.botAliasId");
        }
        if self.welcome_intent.trim().is_empty() {
            missing.push("dialog.welcomeIntent");
        }
        missing
    }
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("PARLEY_CONFIG_PATH").map(PathBuf::from).unwrap_or_else(|_| {
        dirs::home_dir()
            .map(|h| h.join(".parley").join("config.json"))
            .unwrap_or_else(|| PathBuf::from("config.json"))
    })
}

/// Load config from the default path (or PARLEY_CONFIG_PATH), then apply environment overrides.
/// Missing file => default config. Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let mut config: Config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    config.dialog.apply_env_overrides();
    Ok((config, path))
}
