use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use nostr_sdk::prelude::*;
use serde::Deserialize;

use livechat::stream::{host_of, stream_link, stream_link_or_author};
use livechat::zaps::{ReactionAggregator, ReceiptAggregator, format_sats};
use livechat::{FeedInputs, FeedItem, LiveChatConfig, MutedSet, init_tracing, merge_feed, render_feed};

/// Replays a captured stream chat and prints the feed as it would be shown
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// JSON capture with `root`, `messages`, `reactions`, `badge_awards`,
    /// `muted_by_viewer` and `muted_by_host`
    #[clap(value_name = "FILE")]
    input: PathBuf,

    /// Print the rendered feed as JSON
    #[clap(long)]
    json: bool,

    /// Load LIVECHAT_* settings from this .env file
    #[clap(long, value_name = "PATH")]
    env_file: Option<PathBuf>,

    /// Write logs to this directory
    #[clap(long, value_name = "PATH")]
    logs_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Capture {
    root: Event,
    #[serde(default)]
    messages: Vec<Event>,
    #[serde(default)]
    reactions: Vec<Event>,
    #[serde(default)]
    badge_awards: Vec<Event>,
    #[serde(default)]
    muted_by_viewer: HashSet<PublicKey>,
    #[serde(default)]
    muted_by_host: HashSet<PublicKey>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.env_file {
        Some(path) => LiveChatConfig::from_env_file(path)?,
        None => LiveChatConfig::from_env()?,
    };
    if let Some(logs_dir) = &args.logs_dir {
        init_tracing(&LiveChatConfig::new(logs_dir).logs_dir)?;
    }

    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read capture {:?}", args.input))?;
    let capture: Capture = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse capture {:?}", args.input))?;

    let host = host_of(&capture.root);
    if stream_link(&capture.root).is_none() {
        tracing::warn!("Stream root has no d tag, using its author as the stream link");
    }
    let link = stream_link_or_author(&capture.root);
    let aggregate = ReceiptAggregator {
        enable_debug_logging: config.enable_debug_logging,
    }
    .aggregate(&link, &capture.reactions);

    let inputs = FeedInputs {
        root: Some(&capture.root),
        messages: &capture.messages,
        reactions: &capture.reactions,
        badge_awards: &capture.badge_awards,
    };
    let muted = MutedSet::new(capture.muted_by_viewer, capture.muted_by_host);
    let feed = merge_feed(&inputs, &muted);
    let items = render_feed(&feed, &aggregate, &host, config.big_zap_threshold_sats);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else {
        for item in &items {
            println!("{} {}", format_time(item.timestamp()), describe(item));
        }
    }

    Ok(())
}

fn format_time(timestamp: Timestamp) -> String {
    i64::try_from(timestamp.as_u64())
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.as_u64().to_string())
}

fn short(pubkey: &PublicKey) -> String {
    pubkey.to_hex()[..8].to_string()
}

fn describe(item: &FeedItem) -> String {
    match item {
        FeedItem::StreamStarted { .. } => "--- STREAM STARTED ---".to_string(),
        FeedItem::StreamEnded { .. } => "--- STREAM ENDED ---".to_string(),
        FeedItem::BadgeAward { award } => {
            let awardees: Vec<String> = award.awardees.iter().map(short).collect();
            format!(
                "[badge] {} awarded to {}",
                award.badge.identifier,
                awardees.join(", ")
            )
        }
        FeedItem::Message { event, reactions } => {
            let mut line = format!("{}: {}", short(&event.pubkey), event.content);
            for reaction in reactions {
                line.push_str(&format!(" [{} {}]", reaction.emoji, reaction.count));
            }
            line
        }
        FeedItem::Zap { zap, big, .. } => {
            let sender = match (zap.is_anonymous, zap.sender) {
                (false, Some(sender)) => short(&sender),
                _ => "anon".to_string(),
            };
            let mut line = format!(
                "{}{} zapped {} sats",
                if *big { "[BIG] " } else { "" },
                sender,
                format_sats(zap.amount)
            );
            if let Some(comment) = &zap.comment {
                line.push_str(&format!(": {comment}"));
            }
            line
        }
    }
}
