use std::sync::Arc;

use crate::ai::chat::{Relay, SessionStore};
use crate::core::AppConfig;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub relay: Relay,
    // Conversation logs, each seeded with the configured system message
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AppConfig, relay: Relay) -> Self {
        let sessions = SessionStore::new(&config.system_message);
        Self {
            config,
            relay,
            sessions,
        }
    }
}
