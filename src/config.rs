//! Runtime settings for the live chat core.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;

use crate::error::{LiveChatError, Result};

/// Amount (in sats) at which a zap is rendered with the "big zap" style.
pub const BIG_ZAP_THRESHOLD: u64 = 50_000;

/// One week in seconds, the look-back used when a stream has no `starts` tag.
pub const WEEK: u64 = 60 * 60 * 24 * 7;

/// BTC/USD rate used when no live rate is available.
pub const DEFAULT_USD_RATE: f64 = 26_000.0;

/// Maximum number of chat messages requested from relays.
pub const DEFAULT_CHAT_LIMIT: usize = 100;

#[derive(Clone, Debug, PartialEq)]
pub struct LiveChatConfig {
    /// Directory for application logs
    pub logs_dir: PathBuf,

    /// Zaps at or above this many sats are classified as big
    pub big_zap_threshold_sats: u64,

    /// Window start fallback (seconds before now) when the stream has no `starts` tag
    pub fallback_window_secs: u64,

    /// BTC/USD rate used for fiat zap amounts when no live rate is known
    pub default_usd_rate: f64,

    /// Relays placed in the `relays` tag of outgoing zap requests
    pub zap_relays: Vec<String>,

    /// Chat message limit for the feed request
    pub chat_limit: usize,

    /// Whether to log each step of the feed pipeline
    pub enable_debug_logging: bool,
}

impl LiveChatConfig {
    pub fn new(logs_dir: &Path) -> Self {
        let env_suffix = if cfg!(debug_assertions) {
            "dev"
        } else {
            "release"
        };

        Self {
            logs_dir: logs_dir.join(env_suffix),
            ..Self::default()
        }
    }

    /// Load settings from a `.env` file.
    ///
    /// Variables that are absent keep their defaults; variables that are present
    /// but malformed are reported as [`LiveChatError::Configuration`].
    pub fn from_env_file(path: &Path) -> Result<Self> {
        dotenvy::from_filename(path)
            .with_context(|| format!("Failed to read env file: {:?}", path))
            .map_err(LiveChatError::from)?;
        Self::from_env()
    }

    /// Load settings from the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = match env::var("LIVECHAT_LOGS_DIR") {
            Ok(dir) if !dir.is_empty() => Self::new(Path::new(&dir)),
            _ => Self::default(),
        };

        if let Some(threshold) = parse_var::<u64>("LIVECHAT_BIG_ZAP_THRESHOLD")? {
            config.big_zap_threshold_sats = threshold;
        }
        if let Some(window) = parse_var::<u64>("LIVECHAT_FALLBACK_WINDOW_SECS")? {
            config.fallback_window_secs = window;
        }
        if let Some(rate) = parse_var::<f64>("LIVECHAT_DEFAULT_USD_RATE")? {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(LiveChatError::Configuration(format!(
                    "LIVECHAT_DEFAULT_USD_RATE must be positive, got {rate}"
                )));
            }
            config.default_usd_rate = rate;
        }
        if let Ok(relays) = env::var("LIVECHAT_ZAP_RELAYS") {
            config.zap_relays = csv_strings(&relays);
        }
        if let Some(limit) = parse_var::<usize>("LIVECHAT_CHAT_LIMIT")? {
            config.chat_limit = limit;
        }
        if let Ok(debug) = env::var("LIVECHAT_DEBUG") {
            config.enable_debug_logging = matches!(debug.as_str(), "1" | "true");
        }

        Ok(config)
    }
}

impl Default for LiveChatConfig {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            big_zap_threshold_sats: BIG_ZAP_THRESHOLD,
            fallback_window_secs: WEEK,
            default_usd_rate: DEFAULT_USD_RATE,
            zap_relays: vec![
                "wss://relay.damus.io".to_string(),
                "wss://nos.lol".to_string(),
                "wss://relay.snort.social".to_string(),
            ],
            chat_limit: DEFAULT_CHAT_LIMIT,
            enable_debug_logging: false,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| LiveChatError::Configuration(format!("{name} is malformed: {value}"))),
        _ => Ok(None),
    }
}

fn csv_strings(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
