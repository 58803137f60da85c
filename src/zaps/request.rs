//! Zap request construction (NIP-57, kind 9734).

use nostr_sdk::prelude::*;

use crate::error::{LiveChatError, Result};
use crate::types::ZAP_REQUEST;

/// Preset zap amounts in sats.
pub const SATS_AMOUNTS: [u64; 15] = [
    21, 69, 121, 420, 1_000, 2_100, 4_200, 10_000, 21_000, 42_000, 69_000, 100_000, 210_000,
    500_000, 1_000_000,
];

/// Preset zap amounts in USD.
pub const USD_AMOUNTS: [f64; 8] = [0.05, 0.5, 2.0, 5.0, 10.0, 50.0, 100.0, 200.0];

const SATS_PER_BTC: f64 = 100_000_000.0;

/// An amount chosen in the zap dialog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZapAmount {
    Sats(u64),
    Usd(f64),
}

impl ZapAmount {
    /// Converts to whole sats, flooring fiat amounts at `usd_rate` (USD per BTC).
    pub fn to_sats(self, usd_rate: f64) -> Result<u64> {
        match self {
            ZapAmount::Sats(sats) => Ok(sats),
            ZapAmount::Usd(usd) => {
                if !usd_rate.is_finite() || usd_rate <= 0.0 {
                    return Err(LiveChatError::InvalidAmount(format!(
                        "unusable BTC/USD rate {usd_rate}"
                    )));
                }
                if !usd.is_finite() || usd < 0.0 {
                    return Err(LiveChatError::InvalidAmount(format!("{usd} USD")));
                }
                Ok((usd / usd_rate * SATS_PER_BTC).floor() as u64)
            }
        }
    }
}

/// Parameters of a zap request to a stream host.
#[derive(Debug, Clone, PartialEq)]
pub struct ZapRequest {
    pub recipient: PublicKey,
    pub amount_msats: u64,
    pub comment: String,
    pub relays: Vec<String>,
    /// Stream being zapped
    pub a_tag: Option<Coordinate>,
    /// Event being zapped (e.g. a funding goal)
    pub e_tag: Option<EventId>,
    pub anonymous: bool,
}

impl ZapRequest {
    pub fn new(recipient: PublicKey, amount_sats: u64, relays: Vec<String>) -> Self {
        Self {
            recipient,
            amount_msats: amount_sats.saturating_mul(1000),
            comment: String::new(),
            relays,
            a_tag: None,
            e_tag: None,
            anonymous: false,
        }
    }

    fn tags(&self, anonymous: bool) -> Vec<Tag> {
        let mut tags = vec![
            Tag::public_key(self.recipient),
            Tag::custom(
                TagKind::Custom("amount".into()),
                [self.amount_msats.to_string()],
            ),
            Tag::custom(TagKind::Custom("relays".into()), self.relays.clone()),
        ];
        if let Some(coordinate) = &self.a_tag {
            tags.push(Tag::custom(
                TagKind::SingleLetter(SingleLetterTag::lowercase(Alphabet::A)),
                [coordinate.to_string()],
            ));
        }
        if let Some(event_id) = self.e_tag {
            tags.push(Tag::event(event_id));
        }
        if anonymous {
            tags.push(Tag::custom(TagKind::Custom("anon".into()), [""]));
        }
        tags
    }

    /// Signs the request with `signer`, or with throwaway keys when there is no
    /// signer or the request is anonymous.
    pub async fn sign(&self, signer: Option<&dyn NostrSigner>) -> Result<Event> {
        match signer {
            Some(signer) if !self.anonymous => {
                let builder =
                    EventBuilder::new(Kind::from(ZAP_REQUEST), &self.comment).tags(self.tags(false));
                let pubkey = signer.get_public_key().await?;
                Ok(signer.sign_event(builder.build(pubkey)).await?)
            }
            _ => {
                let keys = Keys::generate();
                let builder =
                    EventBuilder::new(Kind::from(ZAP_REQUEST), &self.comment).tags(self.tags(true));
                Ok(builder.sign_with_keys(&keys)?)
            }
        }
    }
}
