//! Live stream chat for Nostr (NIP-53): feed merging and moderation, zap
//! parsing and sending, badges, emoji packs and streaming provider helpers.

use std::path::Path;
use std::sync::{Mutex, OnceLock};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt::Layer, prelude::*, registry::Registry};

pub mod badges;
pub mod config;
pub mod emoji;
pub mod error;
pub mod feed;
pub mod live_chat;
pub mod mute;
pub mod provider;
pub mod stream;
pub mod tags;
pub mod types;
pub mod zaps;

pub use crate::config::{BIG_ZAP_THRESHOLD, LiveChatConfig};
pub use crate::error::{LiveChatError, Result};
pub use crate::feed::{ChatFeedView, FeedInputs, FeedItem, merge_feed, render_feed};
pub use crate::live_chat::{
    FeedRequest, FeedSnapshot, FeedSource, FeedStreamManager, FeedUpdate, LiveChat,
    LiveChatSession, UpdateTrigger, Viewer,
};
pub use crate::mute::MutedSet;
pub use crate::types::{ChatEvent, StreamWindow};
pub use crate::zaps::{ZapError, ZapInfo};

static TRACING_GUARDS: OnceLock<Mutex<Option<(WorkerGuard, WorkerGuard)>>> = OnceLock::new();

/// Installs the global tracing subscriber: stdout plus a daily `livechat.log`
/// in `logs_dir`. Later calls are no-ops.
pub fn init_tracing(logs_dir: &Path) -> Result<()> {
    if TRACING_GUARDS.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(logs_dir)?;
    let file_appender = tracing_appender::rolling::RollingFileAppender::builder()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix("livechat")
        .filename_suffix("log")
        .build(logs_dir)
        .context("Failed to create file appender")?;

    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);
    let (non_blocking_stdout, stdout_guard) = tracing_appender::non_blocking(std::io::stdout());

    let stdout_layer = Layer::new()
        .with_writer(non_blocking_stdout)
        .with_ansi(true)
        .with_target(true);

    let file_layer = Layer::new()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_target(true);

    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    TRACING_GUARDS
        .set(Mutex::new(Some((file_guard, stdout_guard))))
        .ok();

    tracing::debug!(target: "livechat::init_tracing", "Logging initialized in directory: {:?}", logs_dir);
    Ok(())
}
