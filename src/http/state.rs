use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::config::Config;
use crate::nats::NatsEventMirror;
use crate::session::{Collaborators, SessionCoordinator};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live session coordinators (session_id → coordinator)
    pub sessions: Arc<RwLock<HashMap<String, Arc<SessionCoordinator>>>>,

    /// Process-wide read-only configuration
    pub config: Arc<Config>,

    /// Collaborators injected into every new coordinator
    pub collaborators: Collaborators,

    /// Optional NATS mirror for external observers
    pub nats: Option<Arc<NatsEventMirror>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        collaborators: Collaborators,
        nats: Option<Arc<NatsEventMirror>>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            config,
            collaborators,
            nats,
        }
    }
}
