use nostr_sdk::prelude::*;

use super::{FeedInputs, collect_feed, filter_muted};
use crate::mute::MutedSet;
use crate::types::ChatEvent;

/// Memoized feed state for one open chat.
///
/// The ordered feed is rebuilt only after messages, reactions, badge awards or
/// the root event change; the mute filter is re-run only after that or after
/// the mute sets change. Setters given equal inputs keep the cache.
#[derive(Debug, Default)]
pub struct ChatFeedView {
    root: Option<Event>,
    messages: Vec<Event>,
    reactions: Vec<Event>,
    badge_awards: Vec<Event>,
    muted: MutedSet,

    ordered: Option<Vec<ChatEvent>>,
    visible: Option<Vec<ChatEvent>>,
    merges: usize,
    filters: usize,
}

impl ChatFeedView {
    pub fn new(root: Option<Event>, muted: MutedSet) -> Self {
        Self {
            root,
            muted,
            ..Self::default()
        }
    }

    pub fn root(&self) -> Option<&Event> {
        self.root.as_ref()
    }

    pub fn messages(&self) -> &[Event] {
        &self.messages
    }

    pub fn reactions(&self) -> &[Event] {
        &self.reactions
    }

    pub fn badge_awards(&self) -> &[Event] {
        &self.badge_awards
    }

    pub fn muted(&self) -> &MutedSet {
        &self.muted
    }

    /// Returns whether the root changed.
    pub fn set_root(&mut self, root: Option<Event>) -> bool {
        let changed = match (&self.root, &root) {
            (Some(current), Some(new)) => current.id != new.id,
            (None, None) => false,
            _ => true,
        };
        if changed {
            self.root = root;
            self.invalidate_order();
        }
        changed
    }

    pub fn set_messages(&mut self, messages: Vec<Event>) -> bool {
        Self::replace(&mut self.messages, messages) && self.invalidate_order()
    }

    pub fn set_reactions(&mut self, reactions: Vec<Event>) -> bool {
        Self::replace(&mut self.reactions, reactions) && self.invalidate_order()
    }

    pub fn set_badge_awards(&mut self, awards: Vec<Event>) -> bool {
        Self::replace(&mut self.badge_awards, awards) && self.invalidate_order()
    }

    pub fn set_muted(&mut self, muted: MutedSet) -> bool {
        if self.muted == muted {
            return false;
        }
        self.muted = muted;
        self.visible = None;
        true
    }

    /// The merged, mute-filtered feed.
    pub fn events(&mut self) -> &[ChatEvent] {
        if self.ordered.is_none() {
            let inputs = FeedInputs {
                root: self.root.as_ref(),
                messages: &self.messages,
                reactions: &self.reactions,
                badge_awards: &self.badge_awards,
            };
            self.ordered = Some(collect_feed(&inputs));
            self.merges += 1;
        }

        let ordered = self.ordered.as_deref().unwrap_or_default();
        let muted = &self.muted;
        let filters = &mut self.filters;
        self.visible.get_or_insert_with(|| {
            *filters += 1;
            filter_muted(ordered, muted)
        })
    }

    /// How many times the ordered feed was rebuilt.
    pub fn merge_count(&self) -> usize {
        self.merges
    }

    /// How many times the mute filter ran.
    pub fn filter_count(&self) -> usize {
        self.filters
    }

    fn replace(slot: &mut Vec<Event>, events: Vec<Event>) -> bool {
        let unchanged = slot.len() == events.len()
            && slot.iter().zip(&events).all(|(old, new)| old.id == new.id);
        if !unchanged {
            *slot = events;
        }
        !unchanged
    }

    fn invalidate_order(&mut self) -> bool {
        self.ordered = None;
        self.visible = None;
        true
    }
}
