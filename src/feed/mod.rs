//! Chat feed merge and filter.
//!
//! Chat messages, reactions (zap receipts included), badge awards and the two
//! stream boundary markers are merged into one newest-first sequence, then
//! entries from muted pubkeys are dropped.
//!
//! Ordering is total so that identical inputs always produce the same feed:
//! entries sort by timestamp descending; at equal timestamps the end marker
//! comes first, then real events by ascending event id, then the start marker.

mod render;
mod view;


pub use render::{FeedItem, render_feed};
pub use view::ChatFeedView;

use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

use nostr_sdk::prelude::*;

use crate::mute::MutedSet;
use crate::tags::parse_timestamp_tag;
use crate::types::ChatEvent;

/// Snapshot of everything the merged feed is derived from.
#[derive(Debug, Clone, Copy)]
pub struct FeedInputs<'a> {
    pub root: Option<&'a Event>,
    pub messages: &'a [Event],
    pub reactions: &'a [Event],
    pub badge_awards: &'a [Event],
}

/// Start/end markers announced by the root's `starts`/`ends` tags.
///
/// A tag that does not parse as a timestamp produces no marker.
pub fn boundary_markers(root: Option<&Event>) -> Vec<ChatEvent> {
    let Some(root) = root else {
        return Vec::new();
    };
    let mut markers = Vec::with_capacity(2);
    if let Some(timestamp) = parse_timestamp_tag(&root.tags, "starts") {
        markers.push(ChatEvent::StreamStart { timestamp });
    }
    if let Some(timestamp) = parse_timestamp_tag(&root.tags, "ends") {
        markers.push(ChatEvent::StreamEnd { timestamp });
    }
    markers
}

/// Concatenates and orders the feed, before mute filtering.
///
/// An event id seen twice keeps its first occurrence in
/// messages, reactions, badge awards order.
pub fn collect_feed(inputs: &FeedInputs<'_>) -> Vec<ChatEvent> {
    let mut seen: HashSet<EventId> = HashSet::new();
    let mut feed: Vec<ChatEvent> = inputs
        .messages
        .iter()
        .chain(inputs.reactions)
        .chain(inputs.badge_awards)
        .filter(|event| seen.insert(event.id))
        .cloned()
        .map(ChatEvent::from_event)
        .collect();

    feed.extend(boundary_markers(inputs.root));
    feed.sort_by(compare_entries);
    feed
}

/// Drops every entry authored by a muted pubkey. Markers always pass.
pub fn filter_muted(feed: &[ChatEvent], muted: &MutedSet) -> Vec<ChatEvent> {
    feed.iter()
        .filter(|entry| entry.pubkey().is_none_or(|pubkey| !muted.contains(pubkey)))
        .cloned()
        .collect()
}

/// The displayed feed: [`collect_feed`] followed by [`filter_muted`].
pub fn merge_feed(inputs: &FeedInputs<'_>, muted: &MutedSet) -> Vec<ChatEvent> {
    filter_muted(&collect_feed(inputs), muted)
}

fn compare_entries(a: &ChatEvent, b: &ChatEvent) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

fn sort_key(entry: &ChatEvent) -> (Reverse<Timestamp>, u8, Option<&EventId>) {
    let rank = match entry {
        ChatEvent::StreamEnd { .. } => 0,
        ChatEvent::StreamStart { .. } => 2,
        _ => 1,
    };
    (Reverse(entry.timestamp()), rank, entry.id())
}
