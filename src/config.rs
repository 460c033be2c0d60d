use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_WEBHOOK_URL: &str =
    "https://8f12498ee627.ngrok-free.app/webhook/e321d96c-a2fe-48c1-96cf-3ceadf97016a";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay_config: RelayConfig,
    #[serde(default)]
    pub client_config: ClientConfig,
}

/// Relay server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// External automation webhook every request is forwarded to.
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    /// Ceiling for inbound JSON bodies; sized for embedded images.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
}

/// Chat client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    /// Used by the direct transport only.
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    #[serde(default)]
    pub transport: TransportKind,
    #[serde(default = "default_farmer_name")]
    pub farmer_name: String,
    #[serde(default = "default_crop")]
    pub crop: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Relay,
    Direct,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5678
}

fn default_webhook_url() -> String {
    DEFAULT_WEBHOOK_URL.to_string()
}

fn default_body_limit_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_relay_url() -> String {
    "http://localhost:5678/webhook".to_string()
}

fn default_farmer_name() -> String {
    "Smart Kissan User".to_string()
}

fn default_crop() -> String {
    "General".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_url: default_webhook_url(),
            body_limit_bytes: default_body_limit_bytes(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            relay_url: default_relay_url(),
            webhook_url: default_webhook_url(),
            transport: TransportKind::default(),
            farmer_name: default_farmer_name(),
            crop: default_crop(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse config text, picking JSON or YAML by the file extension.
    pub fn parse(content: &str, path: &str) -> Result<Self> {
        let content = substitute_env_vars(content)?;

        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Try each candidate in order; fall back to built-in defaults.
    pub fn discover() -> Self {
        let candidates: Vec<String> = vec![
            std::env::var("CONFIG_PATH").ok(),
            Some("conf.yaml".to_string()),
            Some("conf.json".to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        for path in &candidates {
            match Config::load(path) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from: {}", path);
                    return cfg;
                }
                Err(e) => {
                    tracing::debug!("Failed to load config from {}: {}", path, e);
                }
            }
        }

        tracing::info!("No configuration file found (tried {:?}), using defaults", candidates);
        Config::default()
    }
}

/// Replace `${VAR_NAME}` with the environment value; unknown vars are left as-is.
fn substitute_env_vars(content: &str) -> Result<String> {
    let pattern = Regex::new(r"\$\{(\w+)\}")?;
    let replaced = pattern.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    Ok(replaced.into_owned())
}
