use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::config::{Config, SyncConfig};
use crate::forwarder::Forwarder;
use crate::inbound::Normalizer;
use crate::outbound::Dispatcher;
use crate::platform::{ChatEvent, SessionNotice, SessionTransport};
use crate::roster::RosterSync;
use crate::scheduler::{tasks, Scheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Starting,
    Loading,
    AwaitingQr,
    Authenticated,
    AuthFailed,
    Ready,
    Disconnected,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub state: SessionState,
    pub ready_since: Option<DateTime<Utc>>,
}

/// Wires the session transport to the backend in both directions.
pub struct Relay {
    pub dispatcher: Dispatcher,
    normalizer: Arc<Normalizer>,
    roster: RosterSync,
    scheduler: Option<Scheduler>,
    sync_config: SyncConfig,
    status: RwLock<SessionStatus>,
}

impl Relay {
    pub fn new(
        config: &Config,
        transport: Arc<dyn SessionTransport>,
        scheduler: Option<Scheduler>,
    ) -> Self {
        let forwarder = Forwarder::new(&config.backend);
        Self {
            dispatcher: Dispatcher::new(transport.clone()),
            normalizer: Arc::new(Normalizer::new(transport.clone(), forwarder.clone())),
            roster: RosterSync::new(transport, forwarder),
            scheduler,
            sync_config: config.sync.clone(),
            status: RwLock::new(SessionStatus {
                state: SessionState::Starting,
                ready_since: None,
            }),
        }
    }

    /// Register the optional periodic roster re-sync.
    pub async fn register_jobs(&self) -> anyhow::Result<()> {
        if let (Some(scheduler), Some(cron)) = (&self.scheduler, &self.sync_config.resync_cron) {
            tasks::register_resync(scheduler, self.roster.clone(), cron).await?;
        }
        Ok(())
    }

    pub async fn shutdown(mut self) {
        if let Some(scheduler) = self.scheduler.as_mut() {
            if let Err(e) = scheduler.shutdown().await {
                error!("Failed to stop scheduler: {:#}", e);
            }
        }
    }

    pub async fn status(&self) -> SessionStatus {
        self.status.read().await.clone()
    }

    async fn set_state(&self, state: SessionState) {
        let mut status = self.status.write().await;
        status.state = state;
        match state {
            SessionState::Ready => status.ready_since = Some(Utc::now()),
            _ => status.ready_since = None,
        }
    }

    /// React to one notice from the session. Chat events are handled on
    /// their own task so the caller returns immediately.
    pub async fn handle_notice(&self, notice: SessionNotice) {
        match notice {
            SessionNotice::Message(raw) => {
                let event = ChatEvent::from(raw);
                let normalizer = self.normalizer.clone();
                tokio::spawn(async move {
                    normalizer.handle(event).await;
                });
            }
            SessionNotice::Loading { percent, message } => {
                info!("Loading: {}% {}", percent, message);
                self.set_state(SessionState::Loading).await;
            }
            SessionNotice::Qr { qr } => {
                info!("QR code issued, scan it to pair the session: {}", qr);
                self.set_state(SessionState::AwaitingQr).await;
            }
            SessionNotice::Authenticated => {
                info!("Session authenticated");
                self.set_state(SessionState::Authenticated).await;
            }
            SessionNotice::AuthFailure { message } => {
                error!("Session authentication failed: {}", message);
                self.set_state(SessionState::AuthFailed).await;
            }
            SessionNotice::Disconnected { reason } => {
                warn!("Session disconnected: {}", reason);
                self.set_state(SessionState::Disconnected).await;
            }
            SessionNotice::Ready => {
                info!("Session ready");
                self.set_state(SessionState::Ready).await;
                self.schedule_roster_sync().await;
            }
        }
    }

    async fn schedule_roster_sync(&self) {
        let delay = self.sync_config.settle_delay();
        match &self.scheduler {
            Some(scheduler) => {
                info!("Waiting {:?} before syncing groups...", delay);
                if let Err(e) =
                    tasks::schedule_sync_after_ready(scheduler, self.roster.clone(), delay).await
                {
                    error!("Failed to schedule group roster sync: {:#}", e);
                }
            }
            None => {
                let roster = self.roster.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    roster.sync().await;
                });
            }
        }
    }
}
