//! Custom emoji packs (NIP-30 emoji sets, kind 30030).

use std::collections::HashSet;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tags::find_tag;
use crate::types::EMOJI_SET;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomEmoji {
    pub shortcode: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmojiPack {
    pub author: PublicKey,
    /// The set's `d` tag
    pub name: String,
    pub emojis: Vec<CustomEmoji>,
}

impl EmojiPack {
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.kind.as_u16() != EMOJI_SET {
            return None;
        }
        let name = find_tag(&event.tags, "d").found()?;
        let emojis = event
            .tags
            .iter()
            .filter_map(|tag| match tag.as_slice() {
                [kind, shortcode, url, ..] if kind == "emoji" && !shortcode.is_empty() => {
                    Some(CustomEmoji {
                        shortcode: shortcode.clone(),
                        url: url.clone(),
                    })
                }
                _ => None,
            })
            .collect();

        Some(Self {
            author: event.pubkey,
            name: name.to_string(),
            emojis,
        })
    }

    /// `author:name`, unique per pack.
    pub fn pack_id(&self) -> String {
        format!("{}:{}", self.author.to_hex(), self.name)
    }

    pub fn find(&self, shortcode: &str) -> Option<&CustomEmoji> {
        self.emojis.iter().find(|emoji| emoji.shortcode == shortcode)
    }
}

/// Merges viewer and channel packs, dropping later packs with an already seen id.
pub fn merge_emoji_packs(viewer: Vec<EmojiPack>, channel: Vec<EmojiPack>) -> Vec<EmojiPack> {
    let mut seen = HashSet::new();
    viewer
        .into_iter()
        .chain(channel)
        .filter(|pack| seen.insert(pack.pack_id()))
        .collect()
}

/// Resolves a `:shortcode:` (with or without colons) against merged packs.
pub fn resolve_shortcode<'a>(packs: &'a [EmojiPack], shortcode: &str) -> Option<&'a CustomEmoji> {
    let bare = shortcode
        .strip_prefix(':')
        .and_then(|s| s.strip_suffix(':'))
        .unwrap_or(shortcode);
    packs.iter().find_map(|pack| pack.find(bare))
}

/// Loads the emoji packs a pubkey uses.
#[async_trait]
pub trait EmojiPackSource: Send + Sync {
    async fn emoji_packs(&self, pubkey: &PublicKey) -> Result<Vec<EmojiPack>>;
}
