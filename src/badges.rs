//! Stream badges (NIP-58): definitions issued by the host and their awards.

use std::collections::HashSet;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::tags::{find_tag, tag_values};
use crate::types::{BADGE_AWARD, BADGE_DEFINITION};

/// A badge definition event (kind 30009).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeDefinition {
    pub id: EventId,
    pub author: PublicKey,
    /// The `d` tag
    pub identifier: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub description: Option<String>,
}

impl BadgeDefinition {
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.kind.as_u16() != BADGE_DEFINITION {
            return None;
        }
        let identifier = find_tag(&event.tags, "d").found()?;
        let optional = |name: &str| find_tag(&event.tags, name).found().map(str::to_string);

        Some(Self {
            id: event.id,
            author: event.pubkey,
            identifier: identifier.to_string(),
            name: optional("name"),
            image: optional("image"),
            description: optional("description"),
        })
    }

    /// The `kind:pubkey:d` address awards use to reference this badge.
    pub fn address(&self) -> BadgeAddress {
        BadgeAddress {
            kind: BADGE_DEFINITION,
            pubkey: self.author,
            identifier: self.identifier.clone(),
        }
    }
}

/// Reference to a badge definition from an award's `a` tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BadgeAddress {
    pub kind: u16,
    pub pubkey: PublicKey,
    pub identifier: String,
}

impl BadgeAddress {
    /// Splits `kind:pubkey:d`. The identifier may itself contain `:`.
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.splitn(3, ':');
        let kind = parts.next()?.parse::<u16>().ok()?;
        let pubkey = PublicKey::parse(parts.next()?).ok()?;
        let identifier = parts.next()?.to_string();
        Some(Self {
            kind,
            pubkey,
            identifier,
        })
    }
}

/// A badge award event (kind 8).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAward {
    pub id: EventId,
    pub awarded_by: PublicKey,
    pub badge: BadgeAddress,
    pub awardees: Vec<PublicKey>,
    pub created_at: Timestamp,
}

impl BadgeAward {
    pub fn from_event(event: &Event) -> Option<Self> {
        if event.kind.as_u16() != BADGE_AWARD {
            return None;
        }
        let badge = BadgeAddress::parse(find_tag(&event.tags, "a").found()?)?;
        let awardees = tag_values(&event.tags, "p")
            .filter_map(|pk| PublicKey::parse(pk).ok())
            .collect();

        Some(Self {
            id: event.id,
            awarded_by: event.pubkey,
            badge,
            awardees,
            created_at: event.created_at,
        })
    }
}

/// Badges of one host: what the badge collaborator hands to the chat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BadgeSet {
    pub badges: Vec<BadgeDefinition>,
    /// Raw award events, merged into the chat feed
    pub awards: Vec<Event>,
}

impl BadgeSet {
    /// Keeps definitions issued by `host` and awards by `host` for one of them.
    pub fn from_events<'a, I>(host: &PublicKey, events: I) -> Self
    where
        I: IntoIterator<Item = &'a Event>,
    {
        let mut badges = Vec::new();
        let mut candidate_awards = Vec::new();
        for event in events {
            if event.pubkey != *host {
                continue;
            }
            match event.kind.as_u16() {
                BADGE_DEFINITION => {
                    if let Some(definition) = BadgeDefinition::from_event(event) {
                        badges.push(definition);
                    }
                }
                BADGE_AWARD => candidate_awards.push(event),
                _ => {}
            }
        }

        let known: HashSet<BadgeAddress> = badges.iter().map(BadgeDefinition::address).collect();
        let awards = candidate_awards
            .into_iter()
            .filter(|event| {
                BadgeAward::from_event(event).is_some_and(|award| known.contains(&award.badge))
            })
            .cloned()
            .collect();

        Self { badges, awards }
    }

    /// Badges awarded to `pubkey`, in definition order.
    pub fn badges_for(&self, pubkey: &PublicKey) -> Vec<&BadgeDefinition> {
        let held: HashSet<BadgeAddress> = self
            .awards
            .iter()
            .filter_map(BadgeAward::from_event)
            .filter(|award| award.awardees.contains(pubkey))
            .map(|award| award.badge)
            .collect();

        self.badges
            .iter()
            .filter(|badge| held.contains(&badge.address()))
            .collect()
    }
}

/// Loads the badges a host has defined and awarded since a point in time.
#[async_trait]
pub trait BadgeSource: Send + Sync {
    async fn badges(&self, host: &PublicKey, since: Timestamp) -> Result<BadgeSet>;
}
