//! Reaction aggregation over a stream's related events.

use std::collections::{HashMap, HashSet};

use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};

use super::ZapInfo;
use super::emoji_utils;
use crate::types::{REACTION, ZAP_RECEIPT};

/// Details for a specific emoji reaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmojiReaction {
    /// The emoji or custom emoji shortcode
    pub emoji: String,

    /// Count of users who used this reaction
    pub count: usize,

    /// List of users who used this reaction
    pub users: Vec<PublicKey>,
}

/// Parsed aggregates for the reaction set of one stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReactionAggregate {
    /// Every zap receipt in the set, parsed, largest first
    pub zaps: Vec<ZapInfo>,

    /// Emoji reactions keyed by the event they react to, most used first
    pub reactions: HashMap<EventId, Vec<EmojiReaction>>,
}

impl ReactionAggregate {
    /// Finds the zap for a receipt id, provided it was paid to `host` and is valid.
    pub fn zap_for(&self, receipt_id: &EventId, host: &PublicKey) -> Option<&ZapInfo> {
        self.zaps
            .iter()
            .find(|zap| zap.id == *receipt_id && zap.receiver.as_ref() == Some(host))
            .filter(|zap| zap.valid)
    }

    pub fn reactions_to(&self, event_id: &EventId) -> &[EmojiReaction] {
        self.reactions
            .get(event_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Turns a stream's raw reaction events into [`ReactionAggregate`]s.
pub trait ReactionAggregator: Send + Sync {
    fn aggregate(&self, link: &Coordinate, reactions: &[Event]) -> ReactionAggregate;
}

/// Local aggregator: parses zap receipts and tallies NIP-25 reactions.
#[derive(Debug, Clone, Default)]
pub struct ReceiptAggregator {
    pub enable_debug_logging: bool,
}

impl ReceiptAggregator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReactionAggregator for ReceiptAggregator {
    fn aggregate(&self, link: &Coordinate, reactions: &[Event]) -> ReactionAggregate {
        let mut seen: HashSet<EventId> = HashSet::new();
        let mut zaps: Vec<ZapInfo> = reactions
            .iter()
            .filter(|event| event.kind.as_u16() == ZAP_RECEIPT && seen.insert(event.id))
            .map(ZapInfo::parse)
            .collect();
        zaps.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.id.cmp(&b.id)));

        let mut tallies: HashMap<EventId, HashMap<String, EmojiReaction>> = HashMap::new();
        for event in reactions.iter().filter(|e| e.kind.as_u16() == REACTION) {
            let Some(target) = reaction_target(event) else {
                continue;
            };
            let Some(emoji) = emoji_utils::normalize_reaction(&event.content) else {
                tracing::debug!(
                    target: "livechat::zaps",
                    "Skipping reaction {} with unsupported content",
                    event.id.to_hex()
                );
                continue;
            };

            let entry = tallies
                .entry(target)
                .or_default()
                .entry(emoji.clone())
                .or_insert_with(|| EmojiReaction {
                    emoji,
                    count: 0,
                    users: Vec::new(),
                });
            if !entry.users.contains(&event.pubkey) {
                entry.users.push(event.pubkey);
                entry.count += 1;
            }
        }

        let reactions = tallies
            .into_iter()
            .map(|(target, by_emoji)| {
                let mut summary: Vec<EmojiReaction> = by_emoji.into_values().collect();
                summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.emoji.cmp(&b.emoji)));
                (target, summary)
            })
            .collect();

        if self.enable_debug_logging {
            tracing::debug!(
                target: "livechat::zaps",
                "Aggregated {} zaps for {}",
                zaps.len(),
                link
            );
        }

        ReactionAggregate { zaps, reactions }
    }
}

/// NIP-25: the last `e` tag names the reacted-to event.
fn reaction_target(event: &Event) -> Option<EventId> {
    event
        .tags
        .iter()
        .filter_map(|tag| match tag.as_slice() {
            [name, id, ..] if name == "e" => EventId::parse(id).ok(),
            _ => None,
        })
        .last()
}
