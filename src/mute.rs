//! Mute lists (NIP-51, kind 10000).

use std::collections::HashSet;

use async_trait::async_trait;
use nostr_sdk::prelude::*;

use crate::error::Result;
use crate::tags::tag_values;

/// Extracts the muted pubkeys from a mute list event.
///
/// Malformed `p` values are skipped.
pub fn muted_pubkeys_from_list(list: &Event) -> HashSet<PublicKey> {
    tag_values(&list.tags, "p")
        .filter_map(|pk| PublicKey::parse(pk).ok())
        .collect()
}

/// Pubkeys hidden from the chat: the viewer's own mutes plus the host's.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MutedSet {
    pub viewer: HashSet<PublicKey>,
    pub host: HashSet<PublicKey>,
}

impl MutedSet {
    pub fn new(viewer: HashSet<PublicKey>, host: HashSet<PublicKey>) -> Self {
        Self { viewer, host }
    }

    pub fn contains(&self, pubkey: &PublicKey) -> bool {
        self.viewer.contains(pubkey) || self.host.contains(pubkey)
    }

    pub fn is_empty(&self) -> bool {
        self.viewer.is_empty() && self.host.is_empty()
    }

    pub fn len(&self) -> usize {
        self.viewer.union(&self.host).count()
    }
}

/// Looks up the mute list of a pubkey.
#[async_trait]
pub trait MuteListSource: Send + Sync {
    /// `use_host_list` selects the list the pubkey publishes as a stream host.
    async fn muted_pubkeys(
        &self,
        pubkey: &PublicKey,
        use_host_list: bool,
    ) -> Result<HashSet<PublicKey>>;
}
