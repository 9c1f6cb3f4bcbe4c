//! Page Sessions
//!
//! A page session is one visitor's view of the advisor: its controller (and
//! therefore its transcript), the connection state the reconnect prompt is
//! driven from, and the presentation hints the last cycle emitted.

use crate::models::{ConnectionState, SessionView, TranscriptMessage};
use shield_advisor_core::{
    AdvisorController, ConnectionClassification, ConversationView, Locale, ReconnectSignal,
    ViewHint, content::content, llm_client::LLMClient,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{sync::RwLock, task::JoinHandle, time::Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Tracks whether the page must show the credential-reconnection prompt.
///
/// Flips to `ReconnectRequired` only when the controller raises the reconnect
/// signal, and back only through an explicit reconnect action.
#[derive(Debug)]
pub struct ConnectionMonitor {
    state: Mutex<ConnectionState>,
}

impl ConnectionMonitor {
    pub fn new(initial: ConnectionState) -> Self {
        Self {
            state: Mutex::new(initial),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reconnected(&self) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ConnectionState::Connected;
    }
}

impl ReconnectSignal for ConnectionMonitor {
    fn reconnect_required(&self, classification: ConnectionClassification) {
        warn!(%classification, "Page session requires credential reconnection");
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = ConnectionState::ReconnectRequired;
    }
}

/// Collects the view hints emitted during a request so they can be returned
/// to the client that rendered the page.
#[derive(Debug, Default)]
pub struct ViewRecorder {
    hints: Mutex<Vec<ViewHint>>,
}

impl ViewRecorder {
    pub fn drain(&self) -> Vec<ViewHint> {
        std::mem::take(&mut *self.hints.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

impl ConversationView for ViewRecorder {
    fn show(&self, hint: ViewHint) {
        self.hints
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(hint);
    }
}

pub struct PageSession {
    pub id: Uuid,
    pub controller: AdvisorController,
    pub connection: Arc<ConnectionMonitor>,
    pub view: Arc<ViewRecorder>,
    last_touched: Mutex<Instant>,
}

impl PageSession {
    pub fn new(id: Uuid, locale: Locale, client: Arc<dyn LLMClient>, connected: bool) -> Self {
        let connection = Arc::new(ConnectionMonitor::new(if connected {
            ConnectionState::Connected
        } else {
            ConnectionState::ReconnectRequired
        }));
        let view = Arc::new(ViewRecorder::default());
        let controller = AdvisorController::new(locale, client, connection.clone(), view.clone());
        Self {
            id,
            controller,
            connection,
            view,
            last_touched: Mutex::new(Instant::now()),
        }
    }

    pub fn touch(&self) {
        *self.last_touched.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_touched
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    /// Renders the session for the client.
    pub async fn render(&self, credential_selected: bool) -> SessionView {
        let snapshot = self.controller.snapshot().await;
        SessionView {
            id: self.id,
            locale: snapshot.locale,
            busy: snapshot.busy,
            status_label: content(snapshot.locale)
                .status_label(snapshot.busy)
                .to_string(),
            connection: self.connection.state(),
            credential_selected,
            messages: snapshot
                .messages
                .into_iter()
                .map(TranscriptMessage::from)
                .collect(),
        }
    }
}

/// In-memory page sessions. Nothing here outlives the process; sessions idle
/// for longer than the configured TTL are evicted by [`spawn_idle_sweeper`].
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<PageSession>>>,
}

impl SessionRegistry {
    pub async fn create(
        &self,
        locale: Locale,
        client: Arc<dyn LLMClient>,
        connected: bool,
    ) -> Arc<PageSession> {
        let id = Uuid::new_v4();
        let session = Arc::new(PageSession::new(id, locale, client, connected));
        self.sessions.write().await.insert(id, session.clone());
        info!(session_id = %id, %locale, connected, "Page session created");
        session
    }

    /// Looks a session up and marks it as recently used.
    pub async fn get(&self, id: Uuid) -> Option<Arc<PageSession>> {
        let session = self.sessions.read().await.get(&id).cloned()?;
        session.touch();
        Some(session)
    }

    pub async fn remove(&self, id: Uuid) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            info!(session_id = %id, "Page session closed");
        }
        removed
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops every session untouched for longer than `ttl`. Sessions with a
    /// cycle in flight are kept. Returns how many were evicted.
    pub async fn evict_idle(&self, ttl: Duration) -> usize {
        let candidates: Vec<Arc<PageSession>> = self
            .sessions
            .read()
            .await
            .values()
            .filter(|session| session.idle_for() > ttl)
            .cloned()
            .collect();

        let mut expired = Vec::new();
        for session in candidates {
            if !session.controller.is_busy().await {
                expired.push(session.id);
            }
        }
        if expired.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut evicted = 0;
        for id in expired {
            // A request may have touched it since the scan.
            if sessions.get(&id).is_some_and(|s| s.idle_for() > ttl) {
                sessions.remove(&id);
                evicted += 1;
            }
        }
        info!(evicted, remaining = sessions.len(), "Evicted idle page sessions");
        evicted
    }
}

/// Periodically evicts sessions idle for longer than `ttl`.
pub fn spawn_idle_sweeper(registry: Arc<SessionRegistry>, ttl: Duration) -> JoinHandle<()> {
    let period = ttl.min(Duration::from_secs(60)).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(ttl).await;
            debug!(evicted, "Idle session sweep finished");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use shield_advisor_core::llm_client::{GenerationError, GenerationRequest, LLMAction};

    struct RejectingClient;

    #[async_trait]
    impl LLMClient for RejectingClient {
        async fn decide_action(&self, _: GenerationRequest) -> Result<LLMAction, GenerationError> {
            Err(GenerationError::CredentialRejected("API key not valid".into()))
        }
    }

    #[test]
    fn test_connection_monitor_transitions() {
        let monitor = ConnectionMonitor::new(ConnectionState::Connected);
        monitor.reconnect_required(ConnectionClassification::ConnectionExpiredOrNotFound);
        assert_eq!(monitor.state(), ConnectionState::ReconnectRequired);
        monitor.reconnected();
        assert_eq!(monitor.state(), ConnectionState::Connected);
    }

    #[test]
    fn test_view_recorder_drains() {
        let recorder = ViewRecorder::default();
        recorder.show(ViewHint::ClearInput);
        recorder.show(ViewHint::ScrollToLatest);
        assert_eq!(
            recorder.drain(),
            vec![ViewHint::ClearInput, ViewHint::ScrollToLatest]
        );
        assert!(recorder.drain().is_empty());
    }

    #[tokio::test]
    async fn test_evict_idle_drops_only_stale_sessions() {
        let registry = SessionRegistry::default();
        let stale = registry
            .create(Locale::En, Arc::new(RejectingClient), true)
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        let fresh = registry
            .create(Locale::Es, Arc::new(RejectingClient), true)
            .await;

        assert_eq!(registry.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(registry.evict_idle(Duration::from_millis(20)).await, 1);

        assert!(registry.get(stale.id).await.is_none());
        assert!(registry.get(fresh.id).await.is_some());
        assert_eq!(registry.count().await, 1);
    }

    #[tokio::test]
    async fn test_get_refreshes_idle_clock() {
        let registry = SessionRegistry::default();
        let session = registry
            .create(Locale::En, Arc::new(RejectingClient), true)
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(registry.get(session.id).await.is_some());
        assert_eq!(registry.evict_idle(Duration::from_millis(20)).await, 0);
    }

    #[tokio::test]
    async fn test_remove_session() {
        let registry = SessionRegistry::default();
        let session = registry
            .create(Locale::En, Arc::new(RejectingClient), true)
            .await;

        assert!(registry.remove(session.id).await);
        assert!(!registry.remove(session.id).await);
        assert!(registry.get(session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_credential_flips_session_connection() {
        let registry = SessionRegistry::default();
        let session = registry
            .create(Locale::En, Arc::new(RejectingClient), true)
            .await;

        session.controller.submit("hello", false).await;

        let view = session.render(true).await;
        assert_eq!(view.connection, ConnectionState::ReconnectRequired);
        assert_eq!(view.messages.len(), 2);
        assert!(registry.get(session.id).await.is_some());
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }
}
