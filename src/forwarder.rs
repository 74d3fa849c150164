use serde::Serialize;
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::RelayError;
use crate::inbound::InboundEnvelope;
use crate::roster::RosterRecord;

pub const WEBHOOK_PATH: &str = "/webhook/local";
pub const ROSTER_PATH: &str = "/sync/listas_local";

/// Body of `POST /webhook/local`
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    telefone: &'a str,
    nome: &'a str,
    mensagem: &'a str,
    is_group: bool,
    original_id: &'a str,
    base64: Option<&'a str>,
    mimetype: Option<&'a str>,
    filename: Option<&'a str>,
}

impl<'a> From<&'a InboundEnvelope> for WebhookPayload<'a> {
    fn from(envelope: &'a InboundEnvelope) -> Self {
        let media = envelope.media.as_ref();
        Self {
            telefone: envelope.address.as_str(),
            nome: &envelope.display_name,
            mensagem: &envelope.body,
            is_group: envelope.is_group,
            original_id: envelope.address.as_str(),
            base64: media.map(|m| m.encoded_content.as_str()),
            mimetype: media.map(|m| m.content_type.as_str()),
            filename: media.map(|m| m.filename.as_str()),
        }
    }
}

/// Best-effort client for the automation backend. Every call is a single
/// attempt; callers log failures and move on.
#[derive(Clone)]
pub struct Forwarder {
    client: reqwest::Client,
    base_url: String,
}

impl Forwarder {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
        }
    }

    pub async fn forward(&self, envelope: &InboundEnvelope) -> Result<(), RelayError> {
        self.post(WEBHOOK_PATH, &WebhookPayload::from(envelope))
            .await
    }

    pub async fn submit_roster(&self, roster: &[RosterRecord]) -> Result<(), RelayError> {
        self.post(ROSTER_PATH, roster).await
    }

    async fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), RelayError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Posting to backend: {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::BackendUnreachable(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(RelayError::BackendUnreachable(format!(
                "{url} returned {status}: {error_body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Address;
    use crate::inbound::EnvelopeMedia;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn forwarder(server: &MockServer) -> Forwarder {
        Forwarder::new(&BackendConfig {
            base_url: server.base_url(),
        })
    }

    fn envelope(media: Option<EnvelopeMedia>) -> InboundEnvelope {
        InboundEnvelope {
            address: Address::canonicalize("5511999998888", false).unwrap(),
            display_name: "Ana".to_string(),
            body: "bom dia".to_string(),
            is_group: false,
            media,
        }
    }

    #[tokio::test]
    async fn test_text_envelope_payload() {
        let server = MockServer::start();
        let webhook = server.mock(|when, then| {
            when.method(POST).path(WEBHOOK_PATH).json_body(json!({
                "telefone": "5511999998888@c.us",
                "nome": "Ana",
                "mensagem": "bom dia",
                "is_group": false,
                "original_id": "5511999998888@c.us",
                "base64": null,
                "mimetype": null,
                "filename": null
            }));
            then.status(200).json_body(json!({"status": "ok"}));
        });

        forwarder(&server).forward(&envelope(None)).await.unwrap();
        webhook.assert_calls(1);
    }

    #[tokio::test]
    async fn test_media_envelope_payload() {
        let server = MockServer::start();
        let webhook = server.mock(|when, then| {
            when.method(POST).path(WEBHOOK_PATH).json_body_includes(
                json!({
                    "base64": "aGVsbG8=",
                    "mimetype": "application/pdf",
                    "filename": "boleto.pdf"
                })
                .to_string(),
            );
            then.status(200);
        });

        let media = EnvelopeMedia {
            encoded_content: "aGVsbG8=".to_string(),
            content_type: "application/pdf".to_string(),
            filename: "boleto.pdf".to_string(),
        };
        forwarder(&server)
            .forward(&envelope(Some(media)))
            .await
            .unwrap();
        webhook.assert_calls(1);
    }

    #[tokio::test]
    async fn test_backend_error_is_single_attempt() {
        let server = MockServer::start();
        let webhook = server.mock(|when, then| {
            when.method(POST).path(WEBHOOK_PATH);
            then.status(503).body("busy");
        });

        let err = forwarder(&server).forward(&envelope(None)).await.unwrap_err();
        assert!(matches!(err, RelayError::BackendUnreachable(_)));
        assert!(err.to_string().contains("503"));
        webhook.assert_calls(1);
    }

    #[tokio::test]
    async fn test_backend_down() {
        // Nothing listens on port 9 on the loopback interface
        let forwarder = Forwarder::new(&BackendConfig {
            base_url: "http://127.0.0.1:9".to_string(),
        });
        let err = forwarder.forward(&envelope(None)).await.unwrap_err();
        assert!(matches!(err, RelayError::BackendUnreachable(_)));
    }

    #[tokio::test]
    async fn test_roster_payload() {
        let server = MockServer::start();
        let sync = server.mock(|when, then| {
            when.method(POST).path(ROSTER_PATH).json_body(json!([
                {"id": "1203@g.us", "nome": "Vendas", "qtd": 12}
            ]));
            then.status(200).json_body(json!({"ok": true}));
        });

        let roster = vec![RosterRecord {
            address: Address::canonicalize("1203@g.us", true).unwrap(),
            name: "Vendas".to_string(),
            member_count: 12,
        }];
        forwarder(&server).submit_roster(&roster).await.unwrap();
        sync.assert_calls(1);
    }
}
