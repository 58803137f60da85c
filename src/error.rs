use thiserror::Error;

use crate::provider::ProviderError;
use crate::zaps::ZapError;

pub type Result<T> = core::result::Result<T, LiveChatError>;

#[derive(Error, Debug)]
pub enum LiveChatError {
    #[error("Filesystem error: {0}")]
    Filesystem(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Stream root event has no addressable link")]
    MissingStreamLink,

    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Zap error: {0}")]
    Zap(#[from] ZapError),

    #[error("Invalid zap amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid lightning invoice: {0}")]
    Invoice(#[from] lightning_invoice::ParseOrSemanticError),

    #[error("Stream provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Nostr Event error: {0}")]
    NostrEventBuilder(#[from] nostr_sdk::event::builder::Error),

    #[error("Nostr signer error: {0}")]
    NostrSigner(#[from] nostr_sdk::signer::SignerError),

    #[error("Nostr key error: {0}")]
    NostrKey(#[from] nostr_sdk::key::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for LiveChatError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        LiveChatError::Collaborator(err.to_string())
    }
}
