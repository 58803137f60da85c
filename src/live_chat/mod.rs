//! Opening a stream's chat: collaborator lookups composed into a session.
//!
//! Everything a chat needs (feed, badges, mute lists, emoji packs) comes from
//! collaborator traits, so the session itself never touches the network. The
//! viewer is passed explicitly; a missing viewer means a logged-out visitor.

mod session;
mod streaming;

#[cfg(test)]
mod tests;

pub use session::LiveChatSession;
pub use streaming::{FeedStreamManager, FeedUpdate, UpdateTrigger};

use std::sync::Arc;

use async_trait::async_trait;
use nostr_sdk::prelude::*;

use crate::badges::BadgeSource;
use crate::config::LiveChatConfig;
use crate::emoji::{EmojiPackSource, merge_emoji_packs};
use crate::error::{LiveChatError, Result};
use crate::mute::{MuteListSource, MutedSet, muted_pubkeys_from_list};
use crate::stream::{host_of, stream_link};
use crate::types::{LIVE_STREAM_CHAT, REACTION, StreamWindow, ZAP_RECEIPT};
use crate::zaps::{ReactionAggregator, ReceiptAggregator};

/// What to ask the relays for when following a stream's chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub link: Coordinate,
    /// Extra events (e.g. a funding goal) whose zaps show up in the chat
    pub goal_ids: Vec<EventId>,
    pub limit: usize,
}

impl FeedRequest {
    pub fn new(link: Coordinate, goal_ids: Vec<EventId>, limit: usize) -> Self {
        Self {
            link,
            goal_ids,
            limit,
        }
    }

    pub fn filters(&self) -> Vec<Filter> {
        let a_tag = SingleLetterTag::lowercase(Alphabet::A);
        let mut filters = vec![
            Filter::new()
                .kind(Kind::from(LIVE_STREAM_CHAT))
                .custom_tags(a_tag, [self.link.to_string()])
                .limit(self.limit),
            Filter::new()
                .kinds([Kind::from(REACTION), Kind::from(ZAP_RECEIPT)])
                .custom_tags(a_tag, [self.link.to_string()]),
        ];
        if !self.goal_ids.is_empty() {
            filters.push(
                Filter::new()
                    .kind(Kind::from(ZAP_RECEIPT))
                    .events(self.goal_ids.iter().copied()),
            );
        }
        filters
    }
}

/// Chat events delivered for a [`FeedRequest`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedSnapshot {
    /// Chat messages (kind 1311)
    pub messages: Vec<Event>,
    /// Reactions and zap receipts
    pub reactions: Vec<Event>,
}

/// Delivers chat events for a stream.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, request: &FeedRequest) -> Result<FeedSnapshot>;
}

/// The logged-in user looking at the chat.
#[derive(Debug, Clone)]
pub struct Viewer {
    pub pubkey: PublicKey,
    /// The viewer's own mute list event, if they have one
    pub mute_list: Option<Event>,
    /// Signs zap requests; without it zaps are sent anonymously
    pub signer: Option<Arc<dyn NostrSigner>>,
}

impl Viewer {
    pub fn new(pubkey: PublicKey) -> Self {
        Self {
            pubkey,
            mute_list: None,
            signer: None,
        }
    }

    pub fn with_keys(keys: Keys) -> Self {
        Self {
            pubkey: keys.public_key(),
            mute_list: None,
            signer: Some(Arc::new(keys)),
        }
    }

    pub fn muted_pubkeys(&self) -> std::collections::HashSet<PublicKey> {
        self.mute_list
            .as_ref()
            .map(muted_pubkeys_from_list)
            .unwrap_or_default()
    }
}

/// Entry point holding the collaborators shared by every open chat.
pub struct LiveChat {
    config: LiveChatConfig,
    feed: Arc<dyn FeedSource>,
    badges: Arc<dyn BadgeSource>,
    mutes: Arc<dyn MuteListSource>,
    emojis: Arc<dyn EmojiPackSource>,
    aggregator: Arc<dyn ReactionAggregator>,
    streams: Arc<FeedStreamManager>,
}

impl LiveChat {
    pub fn new(
        config: LiveChatConfig,
        feed: Arc<dyn FeedSource>,
        badges: Arc<dyn BadgeSource>,
        mutes: Arc<dyn MuteListSource>,
        emojis: Arc<dyn EmojiPackSource>,
    ) -> Self {
        let aggregator = Arc::new(ReceiptAggregator {
            enable_debug_logging: config.enable_debug_logging,
        });
        Self {
            config,
            feed,
            badges,
            mutes,
            emojis,
            aggregator,
            streams: Arc::new(FeedStreamManager::new()),
        }
    }

    /// Replaces the default receipt aggregator.
    pub fn with_aggregator(mut self, aggregator: Arc<dyn ReactionAggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn config(&self) -> &LiveChatConfig {
        &self.config
    }

    pub fn feed_source(&self) -> &dyn FeedSource {
        self.feed.as_ref()
    }

    /// Receives every re-rendered feed of the stream at `link`.
    pub fn subscribe(&self, link: &Coordinate) -> tokio::sync::broadcast::Receiver<FeedUpdate> {
        self.streams.subscribe(link)
    }

    /// Opens the chat of the stream described by `root`.
    ///
    /// The feed, badges, host mute list and emoji packs are fetched concurrently;
    /// any collaborator failure fails the open.
    pub async fn open(
        &self,
        root: Event,
        viewer: Option<&Viewer>,
        goal: Option<&Event>,
    ) -> Result<LiveChatSession> {
        let link = stream_link(&root).ok_or(LiveChatError::MissingStreamLink)?;
        let host = host_of(&root);
        let window = StreamWindow::from_root(
            Some(&root),
            Timestamp::now(),
            self.config.fallback_window_secs,
        );
        let request = FeedRequest::new(
            link.clone(),
            goal.map(|g| vec![g.id]).unwrap_or_default(),
            self.config.chat_limit,
        );

        tracing::info!(
            target: "livechat::live_chat",
            "Opening chat for {} hosted by {}",
            link,
            host.to_hex()
        );

        let viewer_packs = async {
            match viewer {
                Some(viewer) => self.emojis.emoji_packs(&viewer.pubkey).await,
                None => Ok(Vec::new()),
            }
        };

        let (snapshot, badges, host_muted, viewer_packs, channel_packs) = futures::try_join!(
            self.feed.fetch(&request),
            self.badges.badges(&host, window.started_at),
            self.mutes.muted_pubkeys(&host, true),
            viewer_packs,
            self.emojis.emoji_packs(&host),
        )?;

        let muted = MutedSet::new(
            viewer.map(Viewer::muted_pubkeys).unwrap_or_default(),
            host_muted,
        );

        if self.config.enable_debug_logging {
            tracing::debug!(
                target: "livechat::live_chat",
                "Loaded {} messages, {} reactions, {} awards, {} muted for {}",
                snapshot.messages.len(),
                snapshot.reactions.len(),
                badges.awards.len(),
                muted.len(),
                link
            );
        }

        Ok(LiveChatSession::new(
            root,
            link,
            host,
            window,
            request,
            goal.cloned(),
            snapshot,
            badges,
            muted,
            merge_emoji_packs(viewer_packs, channel_packs),
            self.aggregator.clone(),
            self.streams.clone(),
            &self.config,
        ))
    }
}
