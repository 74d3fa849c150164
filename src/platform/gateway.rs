use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Chat, Contact, OutgoingContent, SendOptions, SessionTransport};
use crate::config::SessionConfig;
use crate::media::{codec, MediaPayload};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    chat_id: &'a str,
    content: WireContent,
    options: WireOptions,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireContent {
    Text {
        body: String,
    },
    Media {
        mimetype: String,
        data: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    send_audio_as_voice: bool,
}

#[derive(Debug, Deserialize)]
struct WireMedia {
    data: String,
    mimetype: String,
    #[serde(default)]
    filename: Option<String>,
}

/// Session transport backed by the local gateway process that owns the
/// browser session (login, QR pairing and persistence live there).
pub struct GatewayTransport {
    client: reqwest::Client,
    config: SessionConfig,
}

impl GatewayTransport {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.gateway_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("apikey", key),
            None => request,
        }
    }

    async fn get(&self, path: &str) -> Result<Response> {
        let url = self.url(path);
        debug!("Gateway GET {}", url);
        self.authorize(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("Failed to reach session gateway at {url}"))
    }
}

async fn ensure_success(response: Response, what: &str) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        anyhow::bail!("Gateway {} failed ({}): {}", what, status, error_body);
    }
    Ok(response)
}

#[async_trait]
impl SessionTransport for GatewayTransport {
    async fn chat(&self, chat_id: &str) -> Result<Chat> {
        let response = self.get(&format!("/chats/{chat_id}")).await?;
        ensure_success(response, "chat lookup")
            .await?
            .json()
            .await
            .context("Failed to parse gateway chat")
    }

    async fn contact(&self, contact_id: &str) -> Result<Contact> {
        let response = self.get(&format!("/contacts/{contact_id}")).await?;
        ensure_success(response, "contact lookup")
            .await?
            .json()
            .await
            .context("Failed to parse gateway contact")
    }

    async fn chats(&self) -> Result<Vec<Chat>> {
        let response = self.get("/chats").await?;
        ensure_success(response, "chat listing")
            .await?
            .json()
            .await
            .context("Failed to parse gateway chat list")
    }

    async fn download_media(&self, message_id: &str) -> Result<Option<MediaPayload>> {
        let response = self.get(&format!("/messages/{message_id}/media")).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let media: WireMedia = ensure_success(response, "media download")
            .await?
            .json()
            .await
            .context("Failed to parse gateway media")?;

        let data = codec::decode(&media.data)?;
        Ok(Some(MediaPayload::new(data, media.mimetype, media.filename)))
    }

    async fn send(
        &self,
        chat_id: &str,
        content: OutgoingContent,
        options: SendOptions,
    ) -> Result<()> {
        let content = match content {
            OutgoingContent::Text(body) => WireContent::Text { body },
            OutgoingContent::Media(media) => WireContent::Media {
                mimetype: media.content_type,
                data: codec::encode(&media.data),
                filename: media.filename,
            },
        };
        let request = SendRequest {
            chat_id,
            content,
            options: WireOptions {
                caption: options.caption,
                send_audio_as_voice: options.send_audio_as_voice,
            },
        };

        let url = self.url("/messages");
        debug!("Gateway POST {}", url);

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to reach session gateway at {url}"))?;
        ensure_success(response, "send").await?;

        Ok(())
    }
}
