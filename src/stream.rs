//! Helpers over the stream root event (kind 30311).

use nostr_sdk::prelude::*;

use crate::tags::{find_tag, parse_timestamp_tag};
use crate::types::StreamWindow;

/// Resolves the stream host: the `p` tag marked `host`, falling back to the author.
pub fn host_of(root: &Event) -> PublicKey {
    root.tags
        .iter()
        .find_map(|tag| match tag.as_slice() {
            [name, pubkey, _, marker, ..] if name == "p" && marker == "host" => {
                PublicKey::parse(pubkey).ok()
            }
            _ => None,
        })
        .unwrap_or(root.pubkey)
}

/// The addressable link (`kind:author:d`) chat events use to reference the stream.
pub fn stream_link(root: &Event) -> Option<Coordinate> {
    let identifier = find_tag(&root.tags, "d").found()?;
    Some(Coordinate::new(root.kind, root.pubkey).identifier(identifier))
}

/// [`stream_link`], or the bare `kind:author:` coordinate for a root without a `d` tag.
pub fn stream_link_or_author(root: &Event) -> Coordinate {
    stream_link(root).unwrap_or_else(|| Coordinate::new(root.kind, root.pubkey))
}

impl StreamWindow {
    /// Derives the window from the root's `starts`/`ends` tags.
    ///
    /// Without a usable `starts` tag the window opens `fallback_secs` before `now`.
    pub fn from_root(root: Option<&Event>, now: Timestamp, fallback_secs: u64) -> Self {
        let starts = root.and_then(|ev| parse_timestamp_tag(&ev.tags, "starts"));
        let ends = root.and_then(|ev| parse_timestamp_tag(&ev.tags, "ends"));
        Self {
            started_at: starts
                .unwrap_or_else(|| Timestamp::from(now.as_u64().saturating_sub(fallback_secs))),
            ended_at: ends,
        }
    }
}
