//! Per-stream broadcast channels for rendered feed updates.
//!
//! Channels are created on first subscribe and dropped on the first emit
//! after every receiver has gone away.

use dashmap::DashMap;
use nostr_sdk::prelude::*;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::feed::FeedItem;

const BUFFER_SIZE: usize = 100;

/// What caused the feed to be re-rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateTrigger {
    /// A new feed snapshot brought new messages, reactions or awards.
    FeedChanged,

    /// The viewer's or the host's mute list changed.
    MutesChanged,

    /// The stream root event was replaced (new title, start or end).
    RootChanged,
}

/// The complete rendered feed after a change.
#[derive(Debug, Clone)]
pub struct FeedUpdate {
    pub link: Coordinate,
    pub trigger: UpdateTrigger,
    pub items: Vec<FeedItem>,
}

pub struct FeedStreamManager {
    streams: DashMap<Coordinate, broadcast::Sender<FeedUpdate>>,
}

impl FeedStreamManager {
    pub fn new() -> Self {
        Self {
            streams: DashMap::new(),
        }
    }

    pub fn subscribe(&self, link: &Coordinate) -> broadcast::Receiver<FeedUpdate> {
        self.streams
            .entry(link.clone())
            .or_insert_with(|| broadcast::channel(BUFFER_SIZE).0)
            .subscribe()
    }

    pub fn emit(&self, update: FeedUpdate) {
        let link = update.link.clone();
        if let Some(sender) = self.streams.get(&link) {
            if sender.send(update).is_err() && sender.receiver_count() == 0 {
                drop(sender);
                self.streams.remove(&link);
                tracing::debug!(
                    target: "livechat::live_chat::streaming",
                    "Dropped feed stream for {} with no subscribers",
                    link
                );
            }
        }
    }

    pub fn is_streaming(&self, link: &Coordinate) -> bool {
        self.streams.contains_key(link)
    }
}

impl Default for FeedStreamManager {
    fn default() -> Self {
        Self::new()
    }
}
