//! Streaming provider account helpers: endpoints, balance estimates, stream
//! info and forwards, plus a top-up adapter for the zap flow.

use std::sync::Arc;

use async_trait::async_trait;
use nostr_sdk::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::Result;
use crate::zaps::LnurlService;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Terms of service have not been accepted")]
    TosNotAccepted,

    #[error("Provider has no stream endpoints")]
    NoEndpoints,

    #[error("Invalid forward destination: {0}")]
    InvalidForward(String),

    #[error("Provider API error: {0}")]
    Api(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamProviderEndpoint {
    pub name: String,
    pub url: String,
    pub key: String,
    /// Price in sats per `unit`
    #[serde(default)]
    pub rate: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub content_warning: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardDest {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamProviderInfo {
    pub name: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub balance: Option<u64>,
    #[serde(default)]
    pub endpoints: Vec<StreamProviderEndpoint>,
    #[serde(default)]
    pub tos_accepted: Option<bool>,
    #[serde(default)]
    pub tos_link: Option<String>,
    #[serde(default)]
    pub forwards: Vec<ForwardDest>,
    #[serde(default)]
    pub stream_info: Option<StreamInfo>,
}

impl StreamProviderInfo {
    /// Providers that never mention terms count as accepted.
    pub fn tos_accepted(&self) -> bool {
        self.tos_accepted.unwrap_or(true)
    }

    pub fn ensure_tos_accepted(&self) -> core::result::Result<(), ProviderError> {
        if self.tos_accepted() {
            Ok(())
        } else {
            Err(ProviderError::TosNotAccepted)
        }
    }
}

/// Most expensive endpoint first. Endpoints without a rate count as free.
pub fn sort_endpoints(mut endpoints: Vec<StreamProviderEndpoint>) -> Vec<StreamProviderEndpoint> {
    endpoints.sort_by(|a, b| {
        b.rate
            .unwrap_or(0.0)
            .total_cmp(&a.rate.unwrap_or(0.0))
    });
    endpoints
}

/// The endpoint preselected in the dialog.
pub fn default_endpoint(
    info: &StreamProviderInfo,
) -> core::result::Result<StreamProviderEndpoint, ProviderError> {
    sort_endpoints(info.endpoints.clone())
        .into_iter()
        .next()
        .ok_or(ProviderError::NoEndpoints)
}

/// How long the balance lasts on `endpoint`, e.g. `2 hour @ 10 sats/min`.
///
/// `None` when the balance, the rate or the unit is unknown or zero.
pub fn estimate(balance: Option<u64>, endpoint: &StreamProviderEndpoint) -> Option<String> {
    let rate = endpoint.rate.filter(|rate| *rate > 0.0 && rate.is_finite())?;
    let unit = endpoint.unit.as_deref().filter(|unit| !unit.is_empty())?;
    let balance = balance.filter(|balance| *balance > 0)?;

    let raw = (balance as f64 / rate).max(0.0);
    if unit == "min" && raw > 60.0 {
        return Some(format!("{} hour @ {} sats/{}", (raw / 60.0).round(), rate, unit));
    }
    Some(format!("{} {} @ {} sats/{}", raw.round(), unit, rate, unit))
}

/// Human label for an endpoint capability.
///
/// `variant:720h` becomes `720p`, `variant:source` stays `source`,
/// `output:hls` becomes `hls`; anything else is shown as is.
pub fn parse_capability(capability: &str) -> String {
    let mut parts = capability.split(':');
    match (parts.next(), parts.next()) {
        (Some("variant"), Some("source")) => "source".to_string(),
        (Some("variant"), Some(height)) if !height.is_empty() => {
            let mut chars = height.chars();
            chars.next_back();
            format!("{}p", chars.as_str())
        }
        (Some("output"), Some(output)) => output.to_string(),
        _ => capability.to_string(),
    }
}

/// Tags prefilled in the stream editor from the provider's stream info.
pub fn stream_info_tags(info: Option<&StreamInfo>) -> Vec<Tag> {
    let info = info.cloned().unwrap_or_default();
    let text = |name: &str, value: Option<String>| {
        Tag::custom(TagKind::Custom(name.to_string().into()), [value.unwrap_or_default()])
    };

    let mut tags = vec![
        text("title", info.title),
        text("summary", info.summary),
        text("image", info.image),
    ];
    if let Some(goal) = info.goal.filter(|goal| !goal.is_empty()) {
        tags.push(text("goal", Some(goal)));
    }
    if let Some(warning) = info.content_warning.filter(|warning| !warning.is_empty()) {
        tags.push(text("content-warning", Some(warning)));
    }
    tags.extend(info.tags.into_iter().map(|topic| {
        Tag::custom(
            TagKind::SingleLetter(SingleLetterTag::lowercase(Alphabet::T)),
            [topic],
        )
    }));
    tags
}

/// Checks a forward destination before it is sent to the provider.
pub fn validate_forward(name: &str, target: &str) -> core::result::Result<(), ProviderError> {
    if name.trim().is_empty() {
        return Err(ProviderError::InvalidForward("name is empty".to_string()));
    }
    match target.split_once("://") {
        Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => Ok(()),
        _ => Err(ProviderError::InvalidForward(format!(
            "{target} is not a stream url"
        ))),
    }
}

/// A streaming provider account.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    fn name(&self) -> String;

    async fn info(&self) -> Result<StreamProviderInfo>;

    /// Returns a bolt11 invoice crediting `amount_sats` to the account.
    async fn topup(&self, amount_sats: u64) -> Result<String>;

    async fn accept_tos(&self) -> Result<()>;

    async fn update_stream_info(&self, event: &Event) -> Result<()>;

    async fn add_forward(&self, name: &str, target: &str) -> Result<()>;

    async fn remove_forward(&self, id: &str) -> Result<()>;
}

/// Pays a provider top-up through the zap dialog.
pub struct ProviderTopup {
    provider: Arc<dyn StreamProvider>,
}

impl ProviderTopup {
    pub fn new(provider: Arc<dyn StreamProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl LnurlService for ProviderTopup {
    fn name(&self) -> String {
        self.provider.name()
    }

    fn max_comment_length(&self) -> usize {
        0
    }

    fn can_zap(&self) -> bool {
        false
    }

    async fn get_invoice(
        &self,
        amount_sats: u64,
        _comment: Option<&str>,
        _zap_request: Option<&Event>,
    ) -> Result<Option<String>> {
        let pr = self.provider.topup(amount_sats).await?;
        Ok(Some(pr).filter(|pr| !pr.is_empty()))
    }
}

/// Accepts the provider's terms and returns the refreshed account info.
pub async fn accept_tos(provider: &dyn StreamProvider) -> Result<StreamProviderInfo> {
    provider.accept_tos().await?;
    let info = provider.info().await?;
    info.ensure_tos_accepted()?;
    tracing::info!(
        target: "livechat::provider",
        "Accepted terms of service for {}",
        info.name
    );
    Ok(info)
}

/// Validates and adds a forward.
pub async fn add_forward(provider: &dyn StreamProvider, name: &str, target: &str) -> Result<()> {
    validate_forward(name, target)?;
    provider.add_forward(name.trim(), target.trim()).await
}
