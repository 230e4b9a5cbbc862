//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the registry of study sessions.

use crate::config::Config;
use std::collections::HashMap;
use std::sync::Arc;
use study_helper_core::session::StudySession;
use study_helper_core::study::StudyService;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub study: StudyService,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
}

/// A single study session. Its lock is held only while reading or committing
/// state, never across a lookup or generation call.
pub type SharedSession = Arc<Mutex<StudySession>>;

struct SessionEntry {
    session: SharedSession,
    last_used: Instant,
}

impl AppState {
    pub fn new(config: Arc<Config>, study: StudyService) -> Self {
        Self {
            config,
            study,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a new session and returns its id. Idle sessions are dropped
    /// first; if the registry is still full, the least recently used goes.
    pub async fn create_session(&self, api_key: Option<String>) -> (Uuid, SharedSession) {
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions);

        if sessions.len() >= self.config.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(id, _)| *id);
            if let Some(id) = oldest {
                sessions.remove(&id);
                info!(session_id = %id, "session registry full; evicted least recently used");
            }
        }

        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(StudySession::new(api_key)));
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_used: Instant::now(),
            },
        );
        (id, session)
    }

    /// Looks up a live session and marks it as used.
    pub async fn session(&self, id: Uuid) -> Option<SharedSession> {
        let mut sessions = self.sessions.write().await;
        let idle_timeout = self.config.session_idle_timeout;
        match sessions.get_mut(&id) {
            Some(entry) if entry.last_used.elapsed() < idle_timeout => {
                entry.last_used = Instant::now();
                Some(entry.session.clone())
            }
            Some(_) => {
                sessions.remove(&id);
                info!(session_id = %id, "session expired");
                None
            }
            None => None,
        }
    }

    pub async fn remove_session(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn session_count(&self) -> usize {
        let idle_timeout = self.config.session_idle_timeout;
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| entry.last_used.elapsed() < idle_timeout)
            .count()
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>) {
        let idle_timeout = self.config.session_idle_timeout;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.last_used.elapsed() < idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, "idle sessions evicted");
        }
    }
}
