use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::address::Address;
use crate::error::RelayError;
use crate::media::{codec, mime, MediaPayload};
use crate::platform::{OutgoingContent, SendOptions, SessionTransport};

/// Prepended to every outbound text. The platform collapses and previews
/// repeated texts from automated senders; the marker keeps each send distinct.
pub const ZERO_WIDTH_MARKER: char = '\u{200B}';

pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";
pub const AUDIO_CONTENT_TYPE: &str = "audio/mp3";
pub const AUDIO_FILENAME: &str = "audio.mp3";

/// Which send operation a request maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendKind {
    Text,
    Image,
    Audio,
    File,
}

impl std::fmt::Display for SendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendKind::Text => write!(f, "text"),
            SendKind::Image => write!(f, "image"),
            SendKind::Audio => write!(f, "audio"),
            SendKind::File => write!(f, "file"),
        }
    }
}

/// Translates backend send requests into platform sends. Each call stands
/// alone: it either delivers exactly one message or returns its own error.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn SessionTransport>,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn SessionTransport>) -> Self {
        Self { transport }
    }

    pub async fn send_text(&self, target: &str, body: &str, is_group: bool) -> Result<(), RelayError> {
        let address = Address::canonicalize(target, is_group)?;
        let text = format!("{ZERO_WIDTH_MARKER}{body}");
        self.deliver(
            SendKind::Text,
            &address,
            OutgoingContent::Text(text),
            SendOptions::default(),
        )
        .await
    }

    /// Always sent as `image/jpeg`; the payload is not sniffed.
    pub async fn send_image(
        &self,
        target: &str,
        encoded_content: &str,
        filename: Option<&str>,
        caption: Option<&str>,
    ) -> Result<(), RelayError> {
        let address = Address::canonicalize(target, false)?;
        let data = decode_media(encoded_content)?;
        let media = MediaPayload::new(
            data,
            IMAGE_CONTENT_TYPE,
            filename.filter(|f| !f.is_empty()).map(str::to_string),
        );
        self.deliver(
            SendKind::Image,
            &address,
            OutgoingContent::Media(media),
            SendOptions {
                caption: Some(caption.unwrap_or_default().to_string()),
                send_audio_as_voice: false,
            },
        )
        .await
    }

    pub async fn send_audio(&self, target: &str, encoded_content: &str) -> Result<(), RelayError> {
        let address = Address::canonicalize(target, false)?;
        let data = decode_media(encoded_content)?;
        let media = MediaPayload::new(data, AUDIO_CONTENT_TYPE, Some(AUDIO_FILENAME.to_string()));
        self.deliver(
            SendKind::Audio,
            &address,
            OutgoingContent::Media(media),
            SendOptions {
                caption: None,
                send_audio_as_voice: true,
            },
        )
        .await
    }

    pub async fn send_file(
        &self,
        target: &str,
        encoded_content: &str,
        filename: &str,
        caption: Option<&str>,
    ) -> Result<(), RelayError> {
        let address = Address::canonicalize(target, false)?;
        let data = decode_media(encoded_content)?;
        let content_type = mime::resolve(filename);
        let media = MediaPayload::new(
            data,
            content_type,
            Some(filename.to_string()).filter(|f| !f.is_empty()),
        );
        self.deliver(
            SendKind::File,
            &address,
            OutgoingContent::Media(media),
            SendOptions {
                caption: Some(caption.unwrap_or_default().to_string()),
                send_audio_as_voice: false,
            },
        )
        .await
    }

    async fn deliver(
        &self,
        kind: SendKind,
        address: &Address,
        content: OutgoingContent,
        options: SendOptions,
    ) -> Result<(), RelayError> {
        let request_id = Uuid::new_v4();

        match self.transport.send(address.as_str(), content, options).await {
            Ok(()) => {
                info!(%request_id, "Sent {} to {}", kind, address);
                Ok(())
            }
            Err(e) => {
                error!(%request_id, "Failed to send {} to {}: {:#}", kind, address, e);
                Err(RelayError::TransportSendFailure(format!("{e:#}")))
            }
        }
    }
}

fn decode_media(encoded_content: &str) -> Result<Vec<u8>, RelayError> {
    if encoded_content.trim().is_empty() {
        return Err(RelayError::MediaDecodeFailure(
            "media payload is empty".to_string(),
        ));
    }
    codec::decode(encoded_content)
}
