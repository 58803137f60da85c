use std::collections::HashSet;
use std::sync::Arc;

use nostr_sdk::prelude::*;

use super::streaming::{FeedStreamManager, FeedUpdate, UpdateTrigger};
use super::{FeedRequest, FeedSnapshot, FeedSource, LiveChat};
use crate::badges::{BadgeDefinition, BadgeSet};
use crate::config::LiveChatConfig;
use crate::emoji::EmojiPack;
use crate::error::Result;
use crate::feed::{ChatFeedView, FeedItem, render_feed};
use crate::mute::MutedSet;
use crate::stream::host_of;
use crate::types::{ChatEvent, StreamWindow};
use crate::zaps::{
    LnurlService, ReactionAggregate, ReactionAggregator, SendZap, TopZapper, top_zappers,
};

/// An open stream chat.
///
/// Holds the latest inputs and the memoized feed; callers push new snapshots
/// with [`apply_feed`](Self::apply_feed) and read the rendered feed back.
pub struct LiveChatSession {
    link: Coordinate,
    host: PublicKey,
    window: StreamWindow,
    request: FeedRequest,
    goal: Option<Event>,
    badges: BadgeSet,
    emoji_packs: Vec<EmojiPack>,
    /// Badges and host mutes belong to an earlier host or window
    host_inputs_stale: bool,

    view: ChatFeedView,
    aggregator: Arc<dyn ReactionAggregator>,
    aggregate: Option<ReactionAggregate>,
    streams: Arc<FeedStreamManager>,

    big_zap_threshold: u64,
    fallback_window_secs: u64,
    zap_relays: Vec<String>,
    usd_rate: f64,
}

impl LiveChatSession {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        root: Event,
        link: Coordinate,
        host: PublicKey,
        window: StreamWindow,
        request: FeedRequest,
        goal: Option<Event>,
        snapshot: FeedSnapshot,
        badges: BadgeSet,
        muted: MutedSet,
        emoji_packs: Vec<EmojiPack>,
        aggregator: Arc<dyn ReactionAggregator>,
        streams: Arc<FeedStreamManager>,
        config: &LiveChatConfig,
    ) -> Self {
        let mut view = ChatFeedView::new(Some(root), muted);
        view.set_messages(snapshot.messages);
        view.set_reactions(snapshot.reactions);
        view.set_badge_awards(badges.awards.clone());

        Self {
            link,
            host,
            window,
            request,
            goal,
            badges,
            emoji_packs,
            host_inputs_stale: false,
            view,
            aggregator,
            aggregate: None,
            streams,
            big_zap_threshold: config.big_zap_threshold_sats,
            fallback_window_secs: config.fallback_window_secs,
            zap_relays: config.zap_relays.clone(),
            usd_rate: config.default_usd_rate,
        }
    }

    pub fn link(&self) -> &Coordinate {
        &self.link
    }

    pub fn host(&self) -> &PublicKey {
        &self.host
    }

    pub fn window(&self) -> &StreamWindow {
        &self.window
    }

    pub fn request(&self) -> &FeedRequest {
        &self.request
    }

    pub fn goal(&self) -> Option<&Event> {
        self.goal.as_ref()
    }

    pub fn emoji_packs(&self) -> &[EmojiPack] {
        &self.emoji_packs
    }

    pub fn badges(&self) -> &BadgeSet {
        &self.badges
    }

    /// Badges to show next to `pubkey`'s messages.
    pub fn badges_for(&self, pubkey: &PublicKey) -> Vec<&BadgeDefinition> {
        self.badges.badges_for(pubkey)
    }

    /// Applies a new feed snapshot. Returns whether the feed changed.
    pub fn apply_feed(&mut self, snapshot: FeedSnapshot) -> bool {
        let messages_changed = self.view.set_messages(snapshot.messages);
        let reactions_changed = self.view.set_reactions(snapshot.reactions);
        if reactions_changed {
            self.aggregate = None;
        }
        let changed = messages_changed || reactions_changed;
        if changed {
            self.publish(UpdateTrigger::FeedChanged);
        }
        changed
    }

    /// Fetches the current snapshot from `source` and applies it.
    pub async fn refresh(&mut self, source: &dyn FeedSource) -> Result<bool> {
        let snapshot = source.fetch(&self.request).await?;
        Ok(self.apply_feed(snapshot))
    }

    pub fn set_muted(&mut self, muted: MutedSet) -> bool {
        let changed = self.view.set_muted(muted);
        if changed {
            self.publish(UpdateTrigger::MutesChanged);
        }
        changed
    }

    /// Replaces the root event, e.g. after the host edits or ends the stream.
    ///
    /// When the host or the window start moves, the badges and the host's mute
    /// list no longer apply: they are cleared and
    /// [`needs_host_reload`](Self::needs_host_reload) turns on until
    /// [`reload_host`](Self::reload_host) fetches them again.
    pub fn set_root(&mut self, root: Event) -> bool {
        let host = host_of(&root);
        let window = StreamWindow::from_root(
            Some(&root),
            Timestamp::now(),
            self.fallback_window_secs,
        );
        let changed = self.view.set_root(Some(root));
        if changed {
            let host_changed = host != self.host;
            if host_changed || window.started_at != self.window.started_at {
                self.clear_host_inputs(host_changed);
            }
            self.host = host;
            self.window = window;
            self.publish(UpdateTrigger::RootChanged);
        }
        changed
    }

    /// Whether badges or host mutes must be fetched again after a root change.
    pub fn needs_host_reload(&self) -> bool {
        self.host_inputs_stale
    }

    /// Fetches the badges and mute list of the current host and applies them.
    pub async fn reload_host(&mut self, chat: &LiveChat) -> Result<bool> {
        let (badges, host_muted) = futures::try_join!(
            chat.badges.badges(&self.host, self.window.started_at),
            chat.mutes.muted_pubkeys(&self.host, true),
        )?;
        self.host_inputs_stale = false;

        let badges_changed = self.set_badges(badges);
        let mutes_changed = self.set_host_muted(host_muted);
        Ok(badges_changed || mutes_changed)
    }

    /// Applies a new badge set. Returns whether the shown awards changed.
    pub fn set_badges(&mut self, badges: BadgeSet) -> bool {
        let changed = self.view.set_badge_awards(badges.awards.clone());
        self.badges = badges;
        if changed {
            self.publish(UpdateTrigger::FeedChanged);
        }
        changed
    }

    /// Replaces the host's mute list, keeping the viewer's.
    pub fn set_host_muted(&mut self, host: HashSet<PublicKey>) -> bool {
        let muted = MutedSet::new(self.view.muted().viewer.clone(), host);
        self.set_muted(muted)
    }

    /// The merged and mute-filtered feed.
    pub fn events(&mut self) -> &[ChatEvent] {
        self.view.events()
    }

    /// Parsed zaps and reaction tallies for the current reaction set.
    pub fn aggregate(&mut self) -> &ReactionAggregate {
        let aggregator = &self.aggregator;
        let link = &self.link;
        let reactions = self.view.reactions();
        self.aggregate
            .get_or_insert_with(|| aggregator.aggregate(link, reactions))
    }

    pub fn render(&mut self) -> Vec<FeedItem> {
        let aggregator = &self.aggregator;
        let link = &self.link;
        let reactions = self.view.reactions();
        let aggregate = self
            .aggregate
            .get_or_insert_with(|| aggregator.aggregate(link, reactions));
        render_feed(
            self.view.events(),
            aggregate,
            &self.host,
            self.big_zap_threshold,
        )
    }

    pub fn top_zappers(&mut self, limit: usize) -> Vec<TopZapper> {
        top_zappers(&self.aggregate().zaps, limit)
    }

    /// A zap dialog aimed at the host, tagged with this stream and its goal.
    pub fn zap_dialog(
        &self,
        service: Arc<dyn LnurlService>,
        signer: Option<Arc<dyn NostrSigner>>,
    ) -> SendZap {
        let mut dialog = SendZap::new(service, self.zap_relays.clone(), self.usd_rate)
            .with_recipient(self.host);
        dialog.a_tag = Some(self.link.clone());
        dialog.e_tag = self.goal.as_ref().map(|goal| goal.id);
        match signer {
            Some(signer) => dialog.with_signer(signer),
            None => dialog,
        }
    }

    fn clear_host_inputs(&mut self, host_changed: bool) {
        tracing::info!(
            target: "livechat::live_chat",
            "Host inputs for {} are stale, awaiting reload",
            self.link
        );
        self.badges = BadgeSet::default();
        self.view.set_badge_awards(Vec::new());
        if host_changed {
            let viewer = self.view.muted().viewer.clone();
            self.view.set_muted(MutedSet::new(viewer, HashSet::new()));
        }
        self.host_inputs_stale = true;
    }

    fn publish(&mut self, trigger: UpdateTrigger) {
        if !self.streams.is_streaming(&self.link) {
            return;
        }
        let items = self.render();
        self.streams.emit(FeedUpdate {
            link: self.link.clone(),
            trigger,
            items,
        });
    }
}
