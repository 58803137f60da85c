use nostr_sdk::prelude::*;
use serde::Serialize;

use crate::badges::BadgeAward;
use crate::types::ChatEvent;
use crate::zaps::{EmojiReaction, ReactionAggregate, ZapInfo};

/// A displayable line of the chat.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedItem {
    StreamStarted {
        at: Timestamp,
    },
    StreamEnded {
        at: Timestamp,
    },
    BadgeAward {
        award: BadgeAward,
    },
    Message {
        event: Event,
        reactions: Vec<EmojiReaction>,
    },
    Zap {
        at: Timestamp,
        zap: ZapInfo,
        /// Rendered with the big-zap style
        big: bool,
    },
}

/// Maps the merged feed to displayable items.
///
/// Zap receipts render only when the aggregate holds a valid zap with the same
/// id paid to `host`; plain reactions and unmatched receipts render nothing.
pub fn render_feed(
    feed: &[ChatEvent],
    aggregate: &ReactionAggregate,
    host: &PublicKey,
    big_zap_threshold: u64,
) -> Vec<FeedItem> {
    feed.iter()
        .filter_map(|entry| render_entry(entry, aggregate, host, big_zap_threshold))
        .collect()
}

fn render_entry(
    entry: &ChatEvent,
    aggregate: &ReactionAggregate,
    host: &PublicKey,
    big_zap_threshold: u64,
) -> Option<FeedItem> {
    match entry {
        ChatEvent::StreamStart { timestamp } => Some(FeedItem::StreamStarted { at: *timestamp }),
        ChatEvent::StreamEnd { timestamp } => Some(FeedItem::StreamEnded { at: *timestamp }),
        ChatEvent::BadgeAward(event) => {
            BadgeAward::from_event(event).map(|award| FeedItem::BadgeAward { award })
        }
        ChatEvent::Message(event) => Some(FeedItem::Message {
            event: event.clone(),
            reactions: aggregate.reactions_to(&event.id).to_vec(),
        }),
        ChatEvent::ZapReceipt(event) => aggregate.zap_for(&event.id, host).map(|zap| FeedItem::Zap {
            at: event.created_at,
            zap: zap.clone(),
            big: zap.is_big(big_zap_threshold),
        }),
        ChatEvent::Reaction(_) => None,
    }
}

impl FeedItem {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            FeedItem::StreamStarted { at }
            | FeedItem::StreamEnded { at }
            | FeedItem::Zap { at, .. } => *at,
            FeedItem::BadgeAward { award } => award.created_at,
            FeedItem::Message { event, .. } => event.created_at,
        }
    }
}
