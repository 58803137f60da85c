//! Zap receipt parsing (NIP-57).

use lightning_invoice::{Bolt11Invoice, Bolt11InvoiceDescriptionRef};
use nostr_sdk::prelude::*;
use sha2::{Digest, Sha256};

use super::{ZapError, ZapInfo};
use crate::tags::find_tag;
use crate::types::{ZAP_RECEIPT, ZAP_REQUEST};

impl ZapInfo {
    /// Parses a zap receipt and checks its payment proof.
    ///
    /// Never fails: every problem is recorded in `errors` and clears `valid`.
    pub fn parse(receipt: &Event) -> Self {
        let mut errors = Vec::new();

        if receipt.kind.as_u16() != ZAP_RECEIPT {
            errors.push(ZapError::NotAReceipt);
        }

        let receiver = find_tag(&receipt.tags, "p")
            .found()
            .and_then(|pk| PublicKey::parse(pk).ok());
        if receiver.is_none() {
            errors.push(ZapError::MissingReceiver);
        }

        let description = find_tag(&receipt.tags, "description").found();
        let request = match description {
            Some(json) => match parse_zap_request(json) {
                Ok(request) => Some(request),
                Err(e) => {
                    errors.push(e);
                    None
                }
            },
            None => {
                errors.push(ZapError::MissingDescription);
                None
            }
        };

        let invoiced_msats = match find_tag(&receipt.tags, "bolt11").found() {
            Some(bolt11) => match bolt11.parse::<Bolt11Invoice>() {
                Ok(invoice) => {
                    if let Some(json) = description
                        && !description_hash_matches(&invoice, json)
                    {
                        errors.push(ZapError::DescriptionHashMismatch);
                    }
                    let amount = invoice.amount_milli_satoshis();
                    if amount.is_none() {
                        errors.push(ZapError::MissingAmount);
                    }
                    amount
                }
                Err(e) => {
                    errors.push(ZapError::InvalidInvoice(e.to_string()));
                    None
                }
            },
            None => {
                errors.push(ZapError::MissingInvoice);
                None
            }
        };

        if let (Some(request), Some(invoiced)) = (&request, invoiced_msats)
            && let Some(requested) = find_tag(&request.tags, "amount")
                .found()
                .and_then(|amount| amount.parse::<u64>().ok())
            && requested != invoiced
        {
            errors.push(ZapError::AmountMismatch {
                requested,
                invoiced,
            });
        }

        let valid = errors.is_empty();
        if !valid {
            tracing::warn!(
                target: "livechat::zaps",
                "Zap receipt {} is invalid: {:?}",
                receipt.id.to_hex(),
                errors
            );
        }

        Self {
            id: receipt.id,
            zap_service: receipt.pubkey,
            amount: invoiced_msats.unwrap_or(0) / 1000,
            sender: request.as_ref().map(|r| r.pubkey),
            receiver,
            event: request
                .as_ref()
                .and_then(|r| find_tag(&r.tags, "e").found())
                .and_then(|id| EventId::parse(id).ok()),
            is_anonymous: request.as_ref().is_some_and(is_anonymous_request),
            comment: request
                .as_ref()
                .map(|r| r.content.clone())
                .filter(|content| !content.is_empty()),
            valid,
            errors,
        }
    }
}

fn parse_zap_request(json: &str) -> Result<Event, ZapError> {
    let request =
        Event::from_json(json).map_err(|e| ZapError::InvalidZapRequest(e.to_string()))?;
    if request.kind.as_u16() != ZAP_REQUEST {
        return Err(ZapError::InvalidZapRequest(format!(
            "unexpected kind {}",
            request.kind.as_u16()
        )));
    }
    Ok(request)
}

fn is_anonymous_request(request: &Event) -> bool {
    request
        .tags
        .iter()
        .any(|tag| tag.as_slice().first().is_some_and(|name| name == "anon"))
}

fn description_hash_matches(invoice: &Bolt11Invoice, description: &str) -> bool {
    let expected = hex::encode(Sha256::digest(description.as_bytes()));
    match invoice.description() {
        Bolt11InvoiceDescriptionRef::Hash(hash) => hash.0.to_string() == expected,
        // NIP-57 receipts must commit to the request by hash
        Bolt11InvoiceDescriptionRef::Direct(_) => false,
    }
}
