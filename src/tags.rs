//! Typed lookups over Nostr tag arrays.

use nostr_sdk::prelude::*;

/// Result of looking up a single-valued tag by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagValue<'a> {
    Found(&'a str),
    Missing,
}

impl<'a> TagValue<'a> {
    pub fn found(self) -> Option<&'a str> {
        match self {
            TagValue::Found(value) => Some(value),
            TagValue::Missing => None,
        }
    }
}

/// Finds the first tag named `name` and returns its first value.
///
/// A tag that is present but empty is reported as [`TagValue::Missing`].
pub fn find_tag<'a>(tags: &'a Tags, name: &str) -> TagValue<'a> {
    tags.iter()
        .find_map(|tag| match tag.as_slice() {
            [tag_name, value, ..] if tag_name == name => Some(value.as_str()),
            _ => None,
        })
        .filter(|value| !value.is_empty())
        .map_or(TagValue::Missing, TagValue::Found)
}

/// Iterates over the first value of every tag named `name`.
pub fn tag_values<'a>(tags: &'a Tags, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    tags.iter().filter_map(move |tag| match tag.as_slice() {
        [tag_name, value, ..] if tag_name == name => Some(value.as_str()),
        _ => None,
    })
}

/// Parses a unix timestamp stored as a decimal string in tag `name`.
///
/// Integers are taken as-is; finite non-negative decimals are floored.
/// Anything else yields `None`.
pub fn parse_timestamp_tag(tags: &Tags, name: &str) -> Option<Timestamp> {
    let raw = find_tag(tags, name).found()?;
    let parsed = parse_unix_seconds(raw);
    if parsed.is_none() {
        tracing::warn!(
            target: "livechat::tags",
            "Ignoring unparseable `{}` tag value: {:?}",
            name,
            raw
        );
    }
    parsed.map(Timestamp::from)
}

fn parse_unix_seconds(raw: &str) -> Option<u64> {
    let trimmed = raw.trim();
    if let Ok(secs) = trimmed.parse::<u64>() {
        return Some(secs);
    }
    match trimmed.parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 && secs <= u64::MAX as f64 => {
            Some(secs.floor() as u64)
        }
        _ => None,
    }
}
