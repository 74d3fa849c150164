pub mod gateway;
#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::media::MediaPayload;

/// Chat id of the platform's status/broadcast channel
pub const STATUS_BROADCAST: &str = "status@broadcast";

/// A chat as the session sees it
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_group: bool,
    /// Participant ids; absent when the platform has not loaded them
    #[serde(default)]
    pub participants: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Contact {
    pub id: String,
    #[serde(default)]
    pub pushname: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fields shared by every inbound chat event
#[derive(Debug, Clone, PartialEq)]
pub struct EventBase {
    pub id: String,
    /// Chat the message arrived in
    pub from: String,
    /// Sending participant, set for group messages
    pub author: Option<String>,
    pub from_me: bool,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChatEvent {
    Text(EventBase),
    Media(EventBase),
}

impl ChatEvent {
    pub fn base(&self) -> &EventBase {
        match self {
            ChatEvent::Text(base) | ChatEvent::Media(base) => base,
        }
    }

    pub fn has_media(&self) -> bool {
        matches!(self, ChatEvent::Media(_))
    }

    /// Id to resolve the sending contact from
    pub fn sender_id(&self) -> &str {
        let base = self.base();
        base.author.as_deref().unwrap_or(&base.from)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingContent {
    Text(String),
    Media(MediaPayload),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendOptions {
    pub caption: Option<String>,
    /// Render audio as a voice note instead of a file attachment
    pub send_audio_as_voice: bool,
}

/// The live chat session. One instance is built at startup and shared by
/// every component that needs the platform.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    async fn chat(&self, chat_id: &str) -> Result<Chat>;

    async fn contact(&self, contact_id: &str) -> Result<Contact>;

    async fn chats(&self) -> Result<Vec<Chat>>;

    /// `None` when the platform no longer holds the media
    async fn download_media(&self, message_id: &str) -> Result<Option<MediaPayload>>;

    async fn send(
        &self,
        chat_id: &str,
        content: OutgoingContent,
        options: SendOptions,
    ) -> Result<()>;
}

/// Raw message as pushed by the session gateway
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub has_media: bool,
}

impl From<RawMessage> for ChatEvent {
    fn from(raw: RawMessage) -> Self {
        let base = EventBase {
            id: raw.id,
            from: raw.from,
            author: raw.author.filter(|a| !a.is_empty()),
            from_me: raw.from_me,
            body: raw.body,
        };
        if raw.has_media {
            ChatEvent::Media(base)
        } else {
            ChatEvent::Text(base)
        }
    }
}

/// Session lifecycle signals and chat events
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionNotice {
    Loading {
        #[serde(default)]
        percent: u8,
        #[serde(default)]
        message: String,
    },
    Qr {
        qr: String,
    },
    Authenticated,
    AuthFailure {
        #[serde(default)]
        message: String,
    },
    Ready,
    Disconnected {
        #[serde(default)]
        reason: String,
    },
    Message(RawMessage),
}
