//! Application state for the chat server

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::service::RagService;
use crate::session::Session;

/// A session behind its own lock, so one user's actions run one at a time
pub type SessionHandle = Arc<Mutex<Session>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Pipelines, providers and configuration
    service: Arc<RagService>,
    /// Live sessions by id
    sessions: DashMap<Uuid, SessionHandle>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(service: Arc<RagService>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                service,
                sessions: DashMap::new(),
                started_at: Utc::now(),
            }),
        }
    }

    /// Build state from configuration, connecting to the remote services
    pub fn from_config(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing application state...");
        let service = Arc::new(RagService::from_config(config)?);
        Ok(Self::new(service))
    }

    pub fn service(&self) -> &RagService {
        &self.inner.service
    }

    pub fn config(&self) -> &RagConfig {
        self.inner.service.config()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Start a new session and return its handle
    pub fn create_session(&self) -> (Uuid, SessionHandle) {
        let session = Session::new();
        let id = session.id();
        let handle = Arc::new(Mutex::new(session));
        self.inner.sessions.insert(id, handle.clone());
        tracing::info!("Session {} created ({} active)", id, self.inner.sessions.len());
        (id, handle)
    }

    pub fn session(&self, id: Uuid) -> Result<SessionHandle> {
        self.inner
            .sessions
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    pub fn remove_session(&self, id: Uuid) -> Result<()> {
        self.inner
            .sessions
            .remove(&id)
            .map(|_| tracing::info!("Session {} closed", id))
            .ok_or_else(|| Error::SessionNotFound(id.to_string()))
    }

    pub fn session_count(&self) -> usize {
        self.inner.sessions.len()
    }
}
