use std::collections::HashMap;

use nostr_sdk::PublicKey;
use serde::{Deserialize, Serialize};

use super::ZapInfo;

/// Who a zap total is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ZapperId {
    /// All anonymous zaps share one bucket
    Anonymous,
    Sender(PublicKey),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopZapper {
    pub zapper: ZapperId,
    pub total_sats: u64,
    pub zap_count: usize,
}

/// Sums valid zaps per sender, largest total first.
pub fn top_zappers(zaps: &[ZapInfo], limit: usize) -> Vec<TopZapper> {
    let mut totals: HashMap<ZapperId, TopZapper> = HashMap::new();

    for zap in zaps.iter().filter(|zap| zap.valid) {
        let zapper = match (zap.is_anonymous, zap.sender) {
            (false, Some(sender)) => ZapperId::Sender(sender),
            _ => ZapperId::Anonymous,
        };
        let entry = totals.entry(zapper).or_insert(TopZapper {
            zapper,
            total_sats: 0,
            zap_count: 0,
        });
        entry.total_sats = entry.total_sats.saturating_add(zap.amount);
        entry.zap_count += 1;
    }

    let mut ranked: Vec<TopZapper> = totals.into_values().collect();
    ranked.sort_by(|a, b| {
        b.total_sats
            .cmp(&a.total_sats)
            .then_with(|| a.zapper.cmp(&b.zapper))
    });
    ranked.truncate(limit);
    ranked
}
