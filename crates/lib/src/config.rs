//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.courier/config.json`) and environment.
//! Kept minimal: the relay target, flush timing, and the Telegram channel token.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Relay settings (owner chat, flush delay).
    #[serde(default)]
    pub relay: RelayConfig,

    /// Channel settings (Telegram).
    #[serde(default)]
    pub channels: ChannelsConfig,
}

/// Relay target and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayConfig {
    /// Chat id every message is forwarded to. Overridden by COURIER_ADMIN_CHAT_ID env when set.
    pub admin_chat_id: Option<i64>,

    /// Seconds to wait for further album parts before flushing a batch (default 3).
    /// Must outlast the gap between parts of one album but stay short enough to feel instant.
    #[serde(default = "default_flush_delay_secs")]
    pub flush_delay_secs: u64,
}

fn default_flush_delay_secs() -> u64 {
    3
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            admin_chat_id: None,
            flush_delay_secs: default_flush_delay_secs(),
        }
    }
}

/// Per-channel config (Telegram bot token).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub telegram: TelegramChannelConfig,
}

/// Telegram channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramChannelConfig {
    /// Bot token from BotFather. Overridden by TELEGRAM_BOT_TOKEN env when set.
    pub bot_token: Option<String>,
}

/// Resolve the Telegram bot token: env TELEGRAM_BOT_TOKEN overrides config.
pub fn resolve_telegram_token(config: &Config) -> Option<String> {
    std::env::var("TELEGRAM_BOT_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .channels
                .telegram
                .bot_token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the owner chat id: an explicit override (e.g. the --admin flag)
/// wins, then the COURIER_ADMIN_CHAT_ID env, then config.
pub fn resolve_admin_chat_id(config: &Config, override_id: Option<i64>) -> Option<i64> {
    override_id
        .or_else(|| {
            std::env::var("COURIER_ADMIN_CHAT_ID")
                .ok()
                .and_then(|s| s.trim().parse::<i64>().ok())
        })
        .or(config.relay.admin_chat_id)
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("COURIER_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".courier").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or COURIER_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

/// Create the config directory and a starter config file if none exists.
/// Returns the directory that holds the config file.
pub fn init_config_file(path: &Path) -> Result<PathBuf> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating config directory {}", dir.display()))?;
    if !path.exists() {
        let starter = serde_json::to_string_pretty(&Config::default())
            .context("serializing default config")?;
        std::fs::write(path, starter)
            .with_context(|| format!("writing starter config to {}", path.display()))?;
    }
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flush_delay() {
        let r = RelayConfig::default();
        assert_eq!(r.flush_delay_secs, 3);
        assert!(r.admin_chat_id.is_none());
    }

    #[test]
    fn parse_camel_case_config() {
        let json = r#"{
            "relay": { "adminChatId": 42, "flushDelaySecs": 5 },
            "channels": { "telegram": { "botToken": "abc:def" } }
        }"#;
        let config: Config = serde_json::from_str(json).expect("parse config");
        assert_eq!(config.relay.admin_chat_id, Some(42));
        assert_eq!(config.relay.flush_delay_secs, 5);
        assert_eq!(config.channels.telegram.bot_token.as_deref(), Some("abc:def"));
    }

    #[test]
    fn admin_chat_id_from_config() {
        let mut config = Config::default();
        config.relay.admin_chat_id = Some(7);
        assert_eq!(resolve_admin_chat_id(&config, None), Some(7));
    }

    #[test]
    fn explicit_admin_override_beats_config() {
        let mut config = Config::default();
        config.relay.admin_chat_id = Some(7);
        assert_eq!(resolve_admin_chat_id(&config, Some(5)), Some(5));
    }

    #[test]
    fn missing_config_file_is_defaults() {
        let (config, _path) =
            load_config(Some(PathBuf::from("/nonexistent/courier/config.json"))).expect("load");
        assert!(config.channels.telegram.bot_token.is_none());
    }
}
