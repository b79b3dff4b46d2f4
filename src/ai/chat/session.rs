//! Conversation logs keyed by session ID.
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::Mutex;

use super::models::ConversationLog;

/// Session used by callers that don't supply their own ID. Every such
/// caller shares the same log.
pub const DEFAULT_SESSION_ID: &str = "default";

/// Longest session ID a caller may supply.
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Sessions kept in memory before new IDs are turned away.
pub const MAX_SESSIONS: usize = 10_000;

/// A log is locked for the whole relay call so turns from concurrent
/// requests to the same session never interleave.
pub type SharedLog = Arc<Mutex<ConversationLog>>;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session ID is too long")]
    InvalidId,
    #[error("Session limit of {0} reached")]
    LimitReached(usize),
}

pub struct SessionStore {
    seed: String,
    max_sessions: usize,
    sessions: RwLock<HashMap<String, SharedLog>>,
}

impl SessionStore {
    pub fn new(seed: &str) -> Self {
        Self::with_limit(seed, MAX_SESSIONS)
    }

    /// A store holding at most `max_sessions` logs, the default
    /// session included.
    pub fn with_limit(seed: &str, max_sessions: usize) -> Self {
        let default_log = Arc::new(Mutex::new(ConversationLog::new(seed)));
        Self {
            seed: seed.to_string(),
            max_sessions,
            sessions: RwLock::new(HashMap::from([(
                DEFAULT_SESSION_ID.to_string(),
                default_log,
            )])),
        }
    }

    pub fn get(&self, session_id: &str) -> Option<SharedLog> {
        self.sessions
            .read()
            .expect("Unable to read sessions")
            .get(session_id)
            .map(Arc::clone)
    }

    /// Fetch the log for `session_id`, seeding a new one on first use.
    pub fn get_or_create(&self, session_id: &str) -> Result<SharedLog, SessionError> {
        if session_id.chars().count() > MAX_SESSION_ID_LEN {
            return Err(SessionError::InvalidId);
        }
        if let Some(log) = self.get(session_id) {
            return Ok(log);
        }

        let mut sessions = self.sessions.write().expect("Unable to write sessions");
        if let Some(log) = sessions.get(session_id) {
            return Ok(Arc::clone(log));
        }
        if sessions.len() >= self.max_sessions {
            tracing::warn!("Refusing chat session {}, store is full", session_id);
            return Err(SessionError::LimitReached(self.max_sessions));
        }

        tracing::debug!("Creating chat session {}", session_id);
        let log = Arc::new(Mutex::new(ConversationLog::new(&self.seed)));
        sessions.insert(session_id.to_string(), Arc::clone(&log));
        Ok(log)
    }

    pub fn len(&self) -> usize {
        self.sessions.read().expect("Unable to read sessions").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
