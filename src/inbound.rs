use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::error::RelayError;
use crate::forwarder::Forwarder;
use crate::media::codec;
use crate::platform::{ChatEvent, SessionTransport, STATUS_BROADCAST};

/// Body used when a message carries media but no text
pub const MEDIA_PLACEHOLDER: &str = "[Arquivo]";
/// Display name when the contact exposes neither a push name nor a saved name
pub const UNKNOWN_SENDER: &str = "Usuario";
/// Filename for inbound media the platform did not name
pub const DEFAULT_MEDIA_FILENAME: &str = "arquivo_recebido";

const PREVIEW_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeMedia {
    pub encoded_content: String,
    pub content_type: String,
    pub filename: String,
}

/// One inbound chat event, normalized for the backend
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEnvelope {
    pub address: Address,
    pub display_name: String,
    pub body: String,
    pub is_group: bool,
    pub media: Option<EnvelopeMedia>,
}

/// How an inbound event ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Forwarded,
    /// Filtered out (status broadcast, own message) or unresolvable
    Dropped,
    /// Normalized but the backend did not take it
    DroppedAfterAttempt,
}

/// Turns raw chat events into envelopes and hands them to the backend.
pub struct Normalizer {
    transport: Arc<dyn SessionTransport>,
    forwarder: Forwarder,
}

impl Normalizer {
    pub fn new(transport: Arc<dyn SessionTransport>, forwarder: Forwarder) -> Self {
        Self {
            transport,
            forwarder,
        }
    }

    /// Run one event to completion. Never fails: every error on this path is
    /// logged and reflected in the returned disposition.
    pub async fn handle(&self, event: ChatEvent) -> Disposition {
        let envelope = match self.normalize(&event).await {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return Disposition::Dropped,
            Err(e) => {
                warn!(
                    "Dropping message {} from {}: {:#}",
                    event.base().id,
                    event.base().from,
                    e
                );
                return Disposition::Dropped;
            }
        };

        match self.forwarder.forward(&envelope).await {
            Ok(()) => Disposition::Forwarded,
            Err(e) => {
                error!("Failed to forward message from {}: {}", envelope.address, e);
                Disposition::DroppedAfterAttempt
            }
        }
    }

    /// Build the envelope for an event, or `None` when it should not reach
    /// the backend at all.
    pub async fn normalize(&self, event: &ChatEvent) -> anyhow::Result<Option<InboundEnvelope>> {
        let base = event.base();
        if base.from == STATUS_BROADCAST || base.from_me {
            debug!("Ignoring message {} from {}", base.id, base.from);
            return Ok(None);
        }

        let chat = self
            .transport
            .chat(&base.from)
            .await
            .with_context(|| format!("Failed to resolve chat {}", base.from))?;

        let (address, display_name, is_group) = if chat.is_group {
            (Address::canonicalize(&chat.id, true)?, chat.name, true)
        } else {
            let sender = event.sender_id();
            let contact = self
                .transport
                .contact(sender)
                .await
                .with_context(|| format!("Failed to resolve contact {sender}"))?;
            let display_name = contact
                .pushname
                .filter(|n| !n.is_empty())
                .or(contact.name.filter(|n| !n.is_empty()))
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
            (Address::canonicalize(&contact.id, false)?, display_name, false)
        };

        info!("Message from {}: {}...", display_name, preview(&base.body));

        let media = if event.has_media() {
            match self.fetch_media(&base.id).await {
                Ok(media) => media,
                Err(e) => {
                    error!("{}", e);
                    None
                }
            }
        } else {
            None
        };

        let body = if base.body.is_empty() && event.has_media() {
            MEDIA_PLACEHOLDER.to_string()
        } else {
            base.body.clone()
        };

        Ok(Some(InboundEnvelope {
            address,
            display_name,
            body,
            is_group,
            media,
        }))
    }

    async fn fetch_media(&self, message_id: &str) -> Result<Option<EnvelopeMedia>, RelayError> {
        debug!("Downloading media for message {}", message_id);
        let payload = self
            .transport
            .download_media(message_id)
            .await
            .map_err(|e| RelayError::MediaFetchFailure(format!("{message_id}: {e:#}")))?;

        let Some(payload) = payload else {
            warn!("Media for message {} is no longer available", message_id);
            return Ok(None);
        };

        info!("Media downloaded: {}", payload.content_type);
        Ok(Some(EnvelopeMedia {
            encoded_content: codec::encode(&payload.data),
            content_type: payload.content_type,
            filename: payload
                .filename
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_MEDIA_FILENAME.to_string()),
        }))
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(PREVIEW_CHARS) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
