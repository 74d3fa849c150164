use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::address::Address;
use crate::error::RelayError;
use crate::forwarder::Forwarder;
use crate::platform::{Chat, SessionTransport};

/// Snapshot of one group chat, as the backend stores it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterRecord {
    #[serde(rename = "id")]
    pub address: Address,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "qtd")]
    pub member_count: usize,
}

impl RosterRecord {
    fn from_chat(chat: Chat) -> Result<Self, RelayError> {
        Ok(Self {
            address: Address::canonicalize(&chat.id, true)?,
            member_count: chat.participants.as_ref().map_or(0, Vec::len),
            name: chat.name,
        })
    }
}

/// Pushes the session's full group list to the backend. The backend
/// replaces its copy on every submission.
#[derive(Clone)]
pub struct RosterSync {
    transport: Arc<dyn SessionTransport>,
    forwarder: Forwarder,
}

impl RosterSync {
    pub fn new(transport: Arc<dyn SessionTransport>, forwarder: Forwarder) -> Self {
        Self {
            transport,
            forwarder,
        }
    }

    /// Run one sync cycle, logging instead of failing.
    pub async fn sync(&self) {
        info!("Starting group roster sync...");
        match self.try_sync().await {
            Ok(0) => info!("No groups to sync"),
            Ok(count) => info!("{} groups sent to the backend", count),
            Err(e) => error!("Group roster sync failed: {:#}", e),
        }
    }

    /// Returns how many records were submitted. Zero groups means no
    /// submission at all.
    pub async fn try_sync(&self) -> anyhow::Result<usize> {
        let chats = self.transport.chats().await?;
        debug!("Session lists {} chats", chats.len());

        let roster = chats
            .into_iter()
            .filter(|chat| chat.is_group)
            .filter_map(|chat| match RosterRecord::from_chat(chat) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping group in roster: {}", e);
                    None
                }
            })
            .collect::<Vec<_>>();

        if roster.is_empty() {
            return Ok(0);
        }

        self.forwarder.submit_roster(&roster).await?;
        Ok(roster.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendConfig;
    use crate::forwarder::ROSTER_PATH;
    use crate::platform::mock::{direct, group, MockTransport};
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn roster_sync(transport: MockTransport, server: &MockServer) -> RosterSync {
        RosterSync::new(
            Arc::new(transport),
            Forwarder::new(&BackendConfig {
                base_url: server.base_url(),
            }),
        )
    }

    #[tokio::test]
    async fn test_no_groups_no_submission() {
        let server = MockServer::start();
        let submit = server.mock(|when, then| {
            when.method(POST).path(ROSTER_PATH);
            then.status(200);
        });

        let transport = MockTransport::new().with_chat(direct("5511@c.us"));
        let count = roster_sync(transport, &server).try_sync().await.unwrap();
        assert_eq!(count, 0);
        submit.assert_calls(0);
    }

    #[tokio::test]
    async fn test_groups_submitted_in_one_batch() {
        let server = MockServer::start();
        let submit = server.mock(|when, then| {
            when.method(POST).path(ROSTER_PATH).json_body(json!([
                {"id": "1@g.us", "nome": "Vendas", "qtd": 3},
                {"id": "2@g.us", "nome": "Suporte", "qtd": 0},
                {"id": "3@g.us", "nome": "Diretoria", "qtd": 0}
            ]));
            then.status(200).json_body(json!({"ok": true}));
        });

        let transport = MockTransport::new()
            .with_chat(group("1@g.us", "Vendas", Some(3)))
            .with_chat(direct("5511@c.us"))
            .with_chat(group("2@g.us", "Suporte", None))
            .with_chat(group("3@g.us", "Diretoria", Some(0)));
        let count = roster_sync(transport, &server).try_sync().await.unwrap();
        assert_eq!(count, 3);
        submit.assert_calls(1);
    }

    #[tokio::test]
    async fn test_bad_group_id_is_skipped() {
        let server = MockServer::start();
        let submit = server.mock(|when, then| {
            when.method(POST).path(ROSTER_PATH).json_body(json!([
                {"id": "1@g.us", "nome": "Vendas", "qtd": 1}
            ]));
            then.status(200);
        });

        let transport = MockTransport::new()
            .with_chat(group("", "Sem id", Some(4)))
            .with_chat(group("1@g.us", "Vendas", Some(1)));
        let count = roster_sync(transport, &server).try_sync().await.unwrap();
        assert_eq!(count, 1);
        submit.assert_calls(1);
    }

    #[tokio::test]
    async fn test_enumeration_failure_submits_nothing() {
        let server = MockServer::start();
        let submit = server.mock(|when, then| {
            when.method(POST).path(ROSTER_PATH);
            then.status(200);
        });

        let mut transport = MockTransport::new().with_chat(group("1@g.us", "Vendas", None));
        transport.fail_list_chats = true;
        let sync = roster_sync(transport, &server);
        assert!(sync.try_sync().await.is_err());
        sync.sync().await;
        submit.assert_calls(0);
    }

    #[tokio::test]
    async fn test_backend_rejection_is_single_attempt() {
        let server = MockServer::start();
        let submit = server.mock(|when, then| {
            when.method(POST).path(ROSTER_PATH);
            then.status(502);
        });

        let transport = MockTransport::new().with_chat(group("1@g.us", "Vendas", Some(2)));
        let err = roster_sync(transport, &server).try_sync().await.unwrap_err();
        assert!(err.to_string().contains("backend unreachable"));
        submit.assert_calls(1);
    }
}
