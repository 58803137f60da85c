//! Sending a zap: zap request, invoice retrieval and invoice checks.

use std::sync::Arc;

use async_trait::async_trait;
use lightning_invoice::Bolt11Invoice;
use nostr_sdk::prelude::*;

use super::request::{ZapAmount, ZapRequest};
use crate::error::Result;

/// Anything that can hand out a lightning invoice for an amount.
///
/// Implemented by LNURL-pay endpoints and by stream providers accepting top-ups.
#[async_trait]
pub trait LnurlService: Send + Sync {
    /// Display name of the payee.
    fn name(&self) -> String;

    /// Longest comment the service accepts, 0 when comments are not supported.
    fn max_comment_length(&self) -> usize;

    /// Whether the service accepts NIP-57 zap requests.
    fn can_zap(&self) -> bool;

    /// Returns a bolt11 payment request, or `None` when the service declined.
    async fn get_invoice(
        &self,
        amount_sats: u64,
        comment: Option<&str>,
        zap_request: Option<&Event>,
    ) -> Result<Option<String>>;
}

/// An invoice ready to be paid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZapInvoice {
    /// The bolt11 payment request
    pub pr: String,
    pub amount_msats: Option<u64>,
    /// The zap request the invoice commits to, if one was sent
    pub zap_request: Option<Event>,
}

/// One zap dialog: a payee service and the target of the zap.
pub struct SendZap {
    service: Arc<dyn LnurlService>,
    /// Pubkey receiving the zap; without it a plain payment is made
    pub recipient: Option<PublicKey>,
    pub a_tag: Option<Coordinate>,
    pub e_tag: Option<EventId>,
    pub relays: Vec<String>,
    pub usd_rate: f64,
    signer: Option<Arc<dyn NostrSigner>>,
}

impl SendZap {
    pub fn new(service: Arc<dyn LnurlService>, relays: Vec<String>, usd_rate: f64) -> Self {
        Self {
            service,
            recipient: None,
            a_tag: None,
            e_tag: None,
            relays,
            usd_rate,
            signer: None,
        }
    }

    pub fn with_recipient(mut self, recipient: PublicKey) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn with_signer(mut self, signer: Arc<dyn NostrSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Name shown in the dialog title.
    pub fn payee_name(&self) -> String {
        self.service.name()
    }

    /// Whether the dialog offers a comment field.
    pub fn accepts_comment(&self) -> bool {
        self.service.max_comment_length() > 0 || self.service.can_zap()
    }

    /// Builds and signs the zap request for `amount_sats`, if the recipient is known.
    pub async fn zap_request(&self, amount_sats: u64, comment: &str) -> Result<Option<Event>> {
        let Some(recipient) = self.recipient else {
            return Ok(None);
        };

        let mut request = ZapRequest::new(recipient, amount_sats, self.relays.clone());
        request.comment = comment.to_string();
        request.a_tag = self.a_tag.clone();
        request.e_tag = self.e_tag;
        request.anonymous = self.signer.is_none();

        let event = request.sign(self.signer.as_deref()).await?;
        Ok(Some(event))
    }

    /// Runs the zap flow and returns the invoice to pay.
    ///
    /// Returns `Ok(None)` when the service produced no invoice.
    pub async fn send(&self, amount: ZapAmount, comment: &str) -> Result<Option<ZapInvoice>> {
        let amount_sats = amount.to_sats(self.usd_rate)?;
        let comment = if self.accepts_comment() { comment } else { "" };

        let zap_request = self.zap_request(amount_sats, comment).await?;
        let pr = self
            .service
            .get_invoice(
                amount_sats,
                Some(comment).filter(|c| !c.is_empty()),
                zap_request.as_ref(),
            )
            .await?;

        let Some(pr) = pr.filter(|pr| !pr.is_empty()) else {
            tracing::info!(
                target: "livechat::zaps::send",
                "{} returned no invoice for {} sats",
                self.service.name(),
                amount_sats
            );
            return Ok(None);
        };

        let invoice: Bolt11Invoice = pr.parse()?;
        tracing::debug!(
            target: "livechat::zaps::send",
            "Got invoice for {} sats from {}",
            amount_sats,
            self.service.name()
        );

        Ok(Some(ZapInvoice {
            pr,
            amount_msats: invoice.amount_milli_satoshis(),
            zap_request,
        }))
    }
}
