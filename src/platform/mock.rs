use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;

use super::{Chat, Contact, OutgoingContent, SendOptions, SessionTransport};
use crate::media::MediaPayload;

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub chat_id: String,
    pub content: OutgoingContent,
    pub options: SendOptions,
}

/// In-memory session for tests
#[derive(Default)]
pub struct MockTransport {
    pub chats: Vec<Chat>,
    pub contacts: HashMap<String, Contact>,
    pub media: HashMap<String, MediaPayload>,
    pub fail_list_chats: bool,
    pub fail_contact: bool,
    pub fail_media: bool,
    /// Sends to this chat id are rejected
    pub reject_chat: Option<String>,
    pub sent: Mutex<Vec<SentMessage>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat(mut self, chat: Chat) -> Self {
        self.chats.push(chat);
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contacts.insert(contact.id.clone(), contact);
        self
    }

    pub fn with_media(mut self, message_id: &str, media: MediaPayload) -> Self {
        self.media.insert(message_id.to_string(), media);
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }
}

pub fn group(id: &str, name: &str, participants: Option<usize>) -> Chat {
    Chat {
        id: id.to_string(),
        name: name.to_string(),
        is_group: true,
        participants: participants
            .map(|n| (0..n).map(|i| format!("55110000{i:04}@c.us")).collect()),
    }
}

pub fn direct(id: &str) -> Chat {
    Chat {
        id: id.to_string(),
        name: String::new(),
        is_group: false,
        participants: None,
    }
}

#[async_trait]
impl SessionTransport for MockTransport {
    async fn chat(&self, chat_id: &str) -> Result<Chat> {
        self.chats
            .iter()
            .find(|c| c.id == chat_id)
            .cloned()
            .with_context(|| format!("unknown chat {chat_id}"))
    }

    async fn contact(&self, contact_id: &str) -> Result<Contact> {
        if self.fail_contact {
            anyhow::bail!("contact {contact_id} not found");
        }
        Ok(self
            .contacts
            .get(contact_id)
            .cloned()
            .unwrap_or_else(|| Contact {
                id: contact_id.to_string(),
                pushname: None,
                name: None,
            }))
    }

    async fn chats(&self) -> Result<Vec<Chat>> {
        if self.fail_list_chats {
            anyhow::bail!("session not ready");
        }
        Ok(self.chats.clone())
    }

    async fn download_media(&self, message_id: &str) -> Result<Option<MediaPayload>> {
        if self.fail_media {
            anyhow::bail!("media download timed out");
        }
        Ok(self.media.get(message_id).cloned())
    }

    async fn send(
        &self,
        chat_id: &str,
        content: OutgoingContent,
        options: SendOptions,
    ) -> Result<()> {
        if self.reject_chat.as_deref() == Some(chat_id) {
            anyhow::bail!("chat {chat_id} rejected the message");
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id: chat_id.to_string(),
            content,
            options,
        });
        Ok(())
    }
}
