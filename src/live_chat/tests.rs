use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use nostr_sdk::prelude::*;

use super::*;
use crate::error::Result;
use crate::badges::BadgeSet;
use crate::config::WEEK;
use crate::emoji::EmojiPack;
use crate::feed::FeedItem;
use crate::types::{
    BADGE_AWARD, BADGE_DEFINITION, EMOJI_SET, LIVE_STREAM, LIVE_STREAM_CHAT, MUTE_LIST,
};
use crate::zaps::test_fixtures::*;
use crate::zaps::{LnurlService, ZapperId};

#[derive(Default)]
struct MockFeed {
    snapshot: Mutex<FeedSnapshot>,
    requests: Mutex<Vec<FeedRequest>>,
    fail: bool,
}

#[async_trait]
impl FeedSource for MockFeed {
    async fn fetch(&self, request: &FeedRequest) -> Result<FeedSnapshot> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(LiveChatError::Collaborator("relay unreachable".to_string()));
        }
        Ok(self.snapshot.lock().unwrap().clone())
    }
}

#[derive(Default)]
struct MockBadges {
    events: Vec<Event>,
    since: Mutex<Option<Timestamp>>,
}

#[async_trait]
impl BadgeSource for MockBadges {
    async fn badges(&self, host: &PublicKey, since: Timestamp) -> Result<BadgeSet> {
        *self.since.lock().unwrap() = Some(since);
        let recent = self
            .events
            .iter()
            .filter(|event| event.kind.as_u16() == BADGE_DEFINITION || event.created_at >= since);
        Ok(BadgeSet::from_events(host, recent))
    }
}

#[derive(Default)]
struct MockMutes {
    lists: HashMap<PublicKey, HashSet<PublicKey>>,
}

#[async_trait]
impl MuteListSource for MockMutes {
    async fn muted_pubkeys(
        &self,
        pubkey: &PublicKey,
        _use_host_list: bool,
    ) -> Result<HashSet<PublicKey>> {
        Ok(self.lists.get(pubkey).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct MockEmojis {
    packs: HashMap<PublicKey, Vec<EmojiPack>>,
}

#[async_trait]
impl EmojiPackSource for MockEmojis {
    async fn emoji_packs(&self, pubkey: &PublicKey) -> Result<Vec<EmojiPack>> {
        Ok(self.packs.get(pubkey).cloned().unwrap_or_default())
    }
}

struct Fixture {
    author: Keys,
    host: Keys,
    chatters: Vec<Keys>,
    root: Event,
    feed: Arc<MockFeed>,
    badges: Arc<MockBadges>,
    mutes: MockMutes,
    emojis: MockEmojis,
}

fn root_event(author: &Keys, host: &PublicKey, extra: &[(&str, &str)]) -> Event {
    let host_hex = host.to_hex();
    EventBuilder::new(Kind::from(LIVE_STREAM), "")
        .tag(Tag::identifier("stream-1"))
        .tag(Tag::parse(["p", host_hex.as_str(), "", "host"]).unwrap())
        .tags(
            extra
                .iter()
                .map(|(name, value)| Tag::parse([*name, *value]).unwrap()),
        )
        .sign_with_keys(author)
        .unwrap()
}

fn chat(keys: &Keys, created_at: u64, content: &str) -> Event {
    EventBuilder::new(Kind::from(LIVE_STREAM_CHAT), content)
        .custom_created_at(Timestamp::from(created_at))
        .sign_with_keys(keys)
        .unwrap()
}

fn emoji_pack(keys: &Keys, name: &str) -> EmojiPack {
    let event = EventBuilder::new(Kind::from(EMOJI_SET), "")
        .tag(Tag::identifier(name))
        .tag(Tag::parse(["emoji", name, "https://example.com/e.png"]).unwrap())
        .sign_with_keys(keys)
        .unwrap();
    EmojiPack::from_event(&event).unwrap()
}

fn badge_events(host: &Keys, awardee: &PublicKey) -> Vec<Event> {
    let definition = EventBuilder::new(Kind::from(BADGE_DEFINITION), "")
        .tags([
            Tag::identifier("og"),
            Tag::parse(["name", "OG"]).unwrap(),
        ])
        .sign_with_keys(host)
        .unwrap();
    let address = format!("{}:{}:og", BADGE_DEFINITION, host.public_key().to_hex());
    let award = EventBuilder::new(Kind::from(BADGE_AWARD), "")
        .tag(Tag::parse(["a", address.as_str()]).unwrap())
        .tag(Tag::public_key(*awardee))
        .custom_created_at(Timestamp::from(1_700_000_050))
        .sign_with_keys(host)
        .unwrap();
    vec![definition, award]
}

fn fixture() -> Fixture {
    let author = Keys::generate();
    let host = host_keys();
    let chatters: Vec<Keys> = (0..3).map(|_| Keys::generate()).collect();
    let root = root_event(
        &author,
        &host.public_key(),
        &[("starts", "1700000000"), ("title", "Live coding")],
    );

    let feed = Arc::new(MockFeed::default());
    *feed.snapshot.lock().unwrap() = FeedSnapshot {
        messages: vec![
            chat(&chatters[0], 1_700_000_010, "gm"),
            chat(&chatters[1], 1_700_000_020, "hello"),
            chat(&chatters[2], 1_700_000_030, "spam"),
        ],
        reactions: vec![receipt_21k(1_700_000_040), receipt_anon_50k(1_700_000_060)],
    };

    let badges = Arc::new(MockBadges {
        events: badge_events(&host, &chatters[0].public_key()),
        ..Default::default()
    });

    let mut mutes = MockMutes::default();
    mutes.lists.insert(
        host.public_key(),
        HashSet::from([chatters[2].public_key()]),
    );

    Fixture {
        author,
        host,
        chatters,
        root,
        feed,
        badges,
        mutes,
        emojis: MockEmojis::default(),
    }
}

fn live_chat(fixture: Fixture) -> (LiveChat, Fixture) {
    let chat = LiveChat::new(
        LiveChatConfig::default(),
        fixture.feed.clone(),
        fixture.badges.clone(),
        Arc::new(MockMutes {
            lists: fixture.mutes.lists.clone(),
        }),
        Arc::new(MockEmojis {
            packs: fixture.emojis.packs.clone(),
        }),
    );
    (chat, fixture)
}

#[tokio::test]
async fn open_renders_merged_filtered_feed() {
    let (chat, fx) = live_chat(fixture());

    let mut session = chat.open(fx.root.clone(), None, None).await.unwrap();

    assert_eq!(session.host(), &fx.host.public_key());
    assert_eq!(session.window().started_at, Timestamp::from(1_700_000_000));
    assert!(session.window().ended_at.is_none());

    let items = session.render();
    let kinds: Vec<&str> = items
        .iter()
        .map(|item| match item {
            FeedItem::StreamStarted { .. } => "start",
            FeedItem::StreamEnded { .. } => "end",
            FeedItem::BadgeAward { .. } => "award",
            FeedItem::Message { .. } => "message",
            FeedItem::Zap { .. } => "zap",
        })
        .collect();
    // chatter 2 is muted by the host
    assert_eq!(
        kinds,
        vec!["zap", "award", "zap", "message", "message", "start"]
    );

    match &items[0] {
        FeedItem::Zap { zap, big, .. } => {
            assert_eq!(zap.amount, 50_000);
            assert!(*big);
        }
        other => panic!("expected the big zap first, got {other:?}"),
    }

    assert_eq!(session.badges_for(&fx.chatters[0].public_key()).len(), 1);
    assert!(session.badges_for(&fx.chatters[1].public_key()).is_empty());
}

#[tokio::test]
async fn open_applies_viewer_mute_list_and_packs() {
    let mut fx = fixture();
    let viewer_keys = Keys::generate();
    let mute_list = EventBuilder::new(Kind::from(MUTE_LIST), "")
        .tag(Tag::public_key(fx.chatters[0].public_key()))
        .sign_with_keys(&viewer_keys)
        .unwrap();
    let shared = emoji_pack(&fx.author, "shared");
    fx.emojis.packs.insert(
        viewer_keys.public_key(),
        vec![shared.clone(), emoji_pack(&viewer_keys, "mine")],
    );
    fx.emojis.packs.insert(
        fx.host.public_key(),
        vec![shared, emoji_pack(&fx.host, "channel")],
    );
    let (chat, fx) = live_chat(fx);

    let mut viewer = Viewer::with_keys(viewer_keys);
    viewer.mute_list = Some(mute_list);
    let mut session = chat.open(fx.root.clone(), Some(&viewer), None).await.unwrap();

    let authors: HashSet<PublicKey> = session
        .events()
        .iter()
        .filter_map(|entry| entry.pubkey().copied())
        .collect();
    assert!(!authors.contains(&fx.chatters[0].public_key()));
    assert!(!authors.contains(&fx.chatters[2].public_key()));
    assert!(authors.contains(&fx.chatters[1].public_key()));

    let names: Vec<&str> = session
        .emoji_packs()
        .iter()
        .map(|pack| pack.name.as_str())
        .collect();
    assert_eq!(names, vec!["shared", "mine", "channel"]);
}

#[tokio::test]
async fn open_without_stream_link_fails() {
    let (chat, fx) = live_chat(fixture());
    let unlinked = EventBuilder::new(Kind::from(LIVE_STREAM), "")
        .sign_with_keys(&fx.author)
        .unwrap();

    let result = chat.open(unlinked, None, None).await;

    assert!(matches!(result, Err(LiveChatError::MissingStreamLink)));
}

#[tokio::test]
async fn collaborator_failure_fails_open() {
    let fx = fixture();
    let chat = LiveChat::new(
        LiveChatConfig::default(),
        Arc::new(MockFeed {
            fail: true,
            ..Default::default()
        }),
        fx.badges.clone(),
        Arc::new(MockMutes::default()),
        Arc::new(MockEmojis::default()),
    );

    let result = chat.open(fx.root.clone(), None, None).await;

    assert!(matches!(result, Err(LiveChatError::Collaborator(_))));
}

#[tokio::test]
async fn badge_window_falls_back_to_a_week() {
    let (chat, fx) = live_chat(fixture());
    let root = root_event(&fx.author, &fx.host.public_key(), &[]);

    let before = Timestamp::now().as_u64();
    let session = chat.open(root, None, None).await.unwrap();

    let since = fx.badges.since.lock().unwrap().unwrap().as_u64();
    assert!(since + WEEK >= before);
    assert!(since + WEEK <= Timestamp::now().as_u64());
    assert_eq!(session.window().started_at.as_u64(), since);
}

#[tokio::test]
async fn goal_adds_zap_filter() {
    let (chat, fx) = live_chat(fixture());
    let goal = EventBuilder::new(Kind::from(9041), "new mic")
        .sign_with_keys(&fx.host)
        .unwrap();

    let session = chat.open(fx.root.clone(), None, Some(&goal)).await.unwrap();

    assert_eq!(session.request().goal_ids, vec![goal.id]);
    assert_eq!(session.request().filters().len(), 3);
    assert_eq!(session.request().limit, chat.config().chat_limit);
    assert_eq!(fx.feed.requests.lock().unwrap().len(), 1);

    let no_goal = FeedRequest::new(session.link().clone(), vec![], 100);
    assert_eq!(no_goal.filters().len(), 2);
}

#[tokio::test]
async fn apply_feed_publishes_updates() {
    let (chat, fx) = live_chat(fixture());
    let mut session = chat.open(fx.root.clone(), None, None).await.unwrap();
    let mut updates = chat.subscribe(session.link());

    let mut snapshot = fx.feed.snapshot.lock().unwrap().clone();
    assert!(!session.apply_feed(snapshot.clone()));
    assert!(updates.try_recv().is_err());

    snapshot
        .messages
        .push(chat_message_late(&fx.chatters[1]));
    assert!(session.apply_feed(snapshot));

    let update = updates.try_recv().unwrap();
    assert_eq!(update.trigger, UpdateTrigger::FeedChanged);
    assert!(matches!(
        update.items.first(),
        Some(FeedItem::Message { event, .. }) if event.content == "late"
    ));

    assert!(session.set_muted(MutedSet::default()));
    assert_eq!(updates.try_recv().unwrap().trigger, UpdateTrigger::MutesChanged);
}

fn chat_message_late(keys: &Keys) -> Event {
    chat(keys, 1_700_000_100, "late")
}

#[tokio::test]
async fn refresh_pulls_from_source() {
    let (chat, fx) = live_chat(fixture());
    let mut session = chat.open(fx.root.clone(), None, None).await.unwrap();

    fx.feed
        .snapshot
        .lock()
        .unwrap()
        .messages
        .push(chat_message_late(&fx.chatters[0]));

    assert!(session.refresh(chat.feed_source()).await.unwrap());
    assert!(!session.refresh(chat.feed_source()).await.unwrap());
    assert_eq!(fx.feed.requests.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn ended_root_adds_end_marker() {
    let (chat, fx) = live_chat(fixture());
    let mut session = chat.open(fx.root.clone(), None, None).await.unwrap();

    let ended = root_event(
        &fx.author,
        &fx.host.public_key(),
        &[("starts", "1700000000"), ("ends", "1700000500")],
    );
    assert!(session.set_root(ended));

    assert_eq!(session.window().ended_at, Some(Timestamp::from(1_700_000_500)));
    assert!(matches!(
        session.render().first(),
        Some(FeedItem::StreamEnded { .. })
    ));
}

fn awards_in(items: &[FeedItem]) -> Vec<PublicKey> {
    items
        .iter()
        .filter_map(|item| match item {
            FeedItem::BadgeAward { award } => Some(award.awarded_by),
            _ => None,
        })
        .collect()
}

fn authors_in(items: &[FeedItem]) -> Vec<PublicKey> {
    items
        .iter()
        .filter_map(|item| match item {
            FeedItem::Message { event, .. } => Some(event.pubkey),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn host_change_drops_and_reloads_host_inputs() {
    let mut fx = fixture();
    let new_host = Keys::generate();
    let events = [
        badge_events(&fx.host, &fx.chatters[0].public_key()),
        badge_events(&new_host, &fx.chatters[1].public_key()),
    ]
    .concat();
    fx.badges = Arc::new(MockBadges {
        events,
        ..Default::default()
    });
    fx.mutes.lists.insert(
        new_host.public_key(),
        HashSet::from([fx.chatters[1].public_key()]),
    );
    let (chat, fx) = live_chat(fx);
    let mut session = chat.open(fx.root.clone(), None, None).await.unwrap();

    assert_eq!(awards_in(&session.render()), vec![fx.host.public_key()]);
    assert!(!session.needs_host_reload());

    let handed_over = root_event(
        &fx.author,
        &new_host.public_key(),
        &[("starts", "1700000000")],
    );
    assert!(session.set_root(handed_over));
    assert_eq!(session.host(), &new_host.public_key());
    assert!(session.needs_host_reload());

    // The previous host's award and mute list no longer apply
    let items = session.render();
    assert!(awards_in(&items).is_empty());
    assert!(session.badges().badges.is_empty());
    assert!(authors_in(&items).contains(&fx.chatters[2].public_key()));

    assert!(session.reload_host(&chat).await.unwrap());
    assert!(!session.needs_host_reload());

    let items = session.render();
    assert_eq!(awards_in(&items), vec![new_host.public_key()]);
    assert_eq!(session.badges_for(&fx.chatters[1].public_key()).len(), 1);
    let authors = authors_in(&items);
    assert!(!authors.contains(&fx.chatters[1].public_key()));
    assert!(authors.contains(&fx.chatters[2].public_key()));
}

#[tokio::test]
async fn set_badges_recomputes_feed() {
    let (chat, fx) = live_chat(fixture());
    let mut session = chat.open(fx.root.clone(), None, None).await.unwrap();
    let mut updates = chat.subscribe(session.link());

    let same = session.badges().clone();
    assert!(!session.set_badges(same));
    assert!(updates.try_recv().is_err());

    let mut events = badge_events(&fx.host, &fx.chatters[0].public_key());
    let second_award = badge_events(&fx.host, &fx.chatters[1].public_key()).remove(1);
    events.push(second_award);
    let badges = BadgeSet::from_events(&fx.host.public_key(), &events);
    assert_eq!(badges.awards.len(), 2);
    assert!(session.set_badges(badges));

    let update = updates.try_recv().unwrap();
    assert_eq!(update.trigger, UpdateTrigger::FeedChanged);
    assert_eq!(awards_in(&update.items).len(), 2);
    assert_eq!(session.badges_for(&fx.chatters[1].public_key()).len(), 1);
}

#[tokio::test]
async fn top_zappers_from_session() {
    let (chat, fx) = live_chat(fixture());
    let mut session = chat.open(fx.root.clone(), None, None).await.unwrap();

    let top = session.top_zappers(10);

    assert_eq!(top.len(), 2);
    assert_eq!(top[0].zapper, ZapperId::Anonymous);
    assert_eq!(
        top[1].zapper,
        ZapperId::Sender(PublicKey::parse(SENDER_PUBKEY).unwrap())
    );
}

struct StaticInvoice;

#[async_trait]
impl LnurlService for StaticInvoice {
    fn name(&self) -> String {
        "host".to_string()
    }

    fn max_comment_length(&self) -> usize {
        100
    }

    fn can_zap(&self) -> bool {
        true
    }

    async fn get_invoice(
        &self,
        _amount_sats: u64,
        _comment: Option<&str>,
        _zap_request: Option<&Event>,
    ) -> Result<Option<String>> {
        Ok(Some(INVOICE_21K.to_string()))
    }
}

#[tokio::test]
async fn zap_dialog_targets_stream_and_goal() {
    let (chat, fx) = live_chat(fixture());
    let goal = EventBuilder::new(Kind::from(9041), "new mic")
        .sign_with_keys(&fx.host)
        .unwrap();
    let session = chat.open(fx.root.clone(), None, Some(&goal)).await.unwrap();
    let viewer = Keys::generate();

    let dialog = session.zap_dialog(Arc::new(StaticInvoice), Some(Arc::new(viewer.clone())));
    assert_eq!(dialog.recipient, Some(fx.host.public_key()));
    assert_eq!(dialog.a_tag.as_ref(), Some(session.link()));
    assert_eq!(dialog.e_tag, Some(goal.id));

    let request = dialog.zap_request(21_000, "gm").await.unwrap().unwrap();
    assert_eq!(request.pubkey, viewer.public_key());
    let invoice = dialog
        .send(crate::zaps::ZapAmount::Sats(21_000), "gm")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.amount_msats, Some(21_000_000));
}
