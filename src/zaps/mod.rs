//! Zaps: receipt parsing, display classification and aggregation.
//!
//! Receipts (NIP-57, kind 9735) are parsed into [`ZapInfo`]. Validity is a
//! derived property: a receipt that fails any check is still returned, with
//! `valid == false` and the reasons in `errors`, so the feed can silently drop it.

mod aggregator;
mod emoji_utils;
mod parser;
mod request;
mod send;
mod top_zappers;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use aggregator::{EmojiReaction, ReactionAggregate, ReactionAggregator, ReceiptAggregator};
pub use request::{SATS_AMOUNTS, USD_AMOUNTS, ZapAmount, ZapRequest};
pub use send::{LnurlService, SendZap, ZapInvoice};
pub use top_zappers::{TopZapper, ZapperId, top_zappers};

use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};

/// A zap receipt after its payment proof has been checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZapInfo {
    /// Id of the receipt event
    pub id: EventId,

    /// Author of the receipt (the recipient's LNURL server)
    pub zap_service: PublicKey,

    /// Amount in sats, taken from the bolt11 invoice
    pub amount: u64,

    /// Author of the embedded zap request
    pub sender: Option<PublicKey>,

    /// Pubkey from the receipt's `p` tag
    pub receiver: Option<PublicKey>,

    /// Event the zap was aimed at (`e` tag of the zap request)
    pub event: Option<EventId>,

    /// Whether the zap request was marked `anon`
    pub is_anonymous: bool,

    /// Comment from the zap request content
    pub comment: Option<String>,

    pub valid: bool,

    pub errors: Vec<ZapError>,
}

impl ZapInfo {
    /// Whether this zap should be rendered in the big style.
    pub fn is_big(&self, threshold_sats: u64) -> bool {
        is_big_zap(self.amount, threshold_sats)
    }
}

/// Reasons a zap receipt is considered invalid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ZapError {
    #[error("Event is not a zap receipt")]
    NotAReceipt,

    #[error("Missing receiver p-tag")]
    MissingReceiver,

    #[error("Missing description tag")]
    MissingDescription,

    #[error("Invalid zap request: {0}")]
    InvalidZapRequest(String),

    #[error("Missing bolt11 tag")]
    MissingInvoice,

    #[error("Invalid bolt11 invoice: {0}")]
    InvalidInvoice(String),

    #[error("Invoice has no amount")]
    MissingAmount,

    #[error("Invoice description hash does not match zap request")]
    DescriptionHashMismatch,

    #[error("Zap request amount {requested} msats does not match invoice amount {invoiced} msats")]
    AmountMismatch { requested: u64, invoiced: u64 },
}

/// Zaps at or above `threshold_sats` use the big-zap style.
pub fn is_big_zap(amount_sats: u64, threshold_sats: u64) -> bool {
    amount_sats >= threshold_sats
}

/// Compact sats formatting: `950`, `2.1K`, `21K`, `1.5M`.
pub fn format_sats(amount: u64) -> String {
    fn compact(value: f64, suffix: &str) -> String {
        let formatted = format!("{:.1}", value);
        let trimmed = formatted.strip_suffix(".0").unwrap_or(&formatted);
        format!("{trimmed}{suffix}")
    }

    match amount {
        0..1_000 => amount.to_string(),
        1_000..1_000_000 => compact(amount as f64 / 1_000.0, "K"),
        _ => compact(amount as f64 / 1_000_000.0, "M"),
    }
}
