use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};

/// Live stream root event (NIP-53).
pub const LIVE_STREAM: u16 = 30311;
/// Live stream chat message (NIP-53).
pub const LIVE_STREAM_CHAT: u16 = 1311;
/// Reaction (NIP-25).
pub const REACTION: u16 = 7;
/// Badge award (NIP-58).
pub const BADGE_AWARD: u16 = 8;
/// Badge definition (NIP-58).
pub const BADGE_DEFINITION: u16 = 30009;
/// Zap request (NIP-57).
pub const ZAP_REQUEST: u16 = 9734;
/// Zap receipt (NIP-57).
pub const ZAP_RECEIPT: u16 = 9735;
/// Mute list (NIP-51).
pub const MUTE_LIST: u16 = 10000;
/// Emoji set (NIP-30).
pub const EMOJI_SET: u16 = 30030;

/// One entry of the merged chat feed.
///
/// Real entries wrap the event delivered by the feed; the two boundary
/// markers are synthesized from the stream root event and carry no author.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    StreamStart { timestamp: Timestamp },
    StreamEnd { timestamp: Timestamp },
    Message(Event),
    BadgeAward(Event),
    ZapReceipt(Event),
    /// Any other related event (plain reactions); kept in the merge, renders nothing.
    Reaction(Event),
}

impl ChatEvent {
    /// Classifies a feed event by its kind.
    pub fn from_event(event: Event) -> Self {
        match event.kind.as_u16() {
            LIVE_STREAM_CHAT => ChatEvent::Message(event),
            BADGE_AWARD => ChatEvent::BadgeAward(event),
            ZAP_RECEIPT => ChatEvent::ZapReceipt(event),
            _ => ChatEvent::Reaction(event),
        }
    }

    pub fn timestamp(&self) -> Timestamp {
        match self {
            ChatEvent::StreamStart { timestamp } | ChatEvent::StreamEnd { timestamp } => *timestamp,
            ChatEvent::Message(event)
            | ChatEvent::BadgeAward(event)
            | ChatEvent::ZapReceipt(event)
            | ChatEvent::Reaction(event) => event.created_at,
        }
    }

    /// The underlying event, `None` for boundary markers.
    pub fn event(&self) -> Option<&Event> {
        match self {
            ChatEvent::StreamStart { .. } | ChatEvent::StreamEnd { .. } => None,
            ChatEvent::Message(event)
            | ChatEvent::BadgeAward(event)
            | ChatEvent::ZapReceipt(event)
            | ChatEvent::Reaction(event) => Some(event),
        }
    }

    pub fn id(&self) -> Option<&EventId> {
        self.event().map(|event| &event.id)
    }

    pub fn pubkey(&self) -> Option<&PublicKey> {
        self.event().map(|event| &event.pubkey)
    }

    pub fn is_marker(&self) -> bool {
        self.event().is_none()
    }
}

/// Time range of a stream as announced by its root event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamWindow {
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
}
