mod core;
mod models;
mod session;

pub use self::core::*;
pub use models::ConversationLog;
pub use session::{
    DEFAULT_SESSION_ID, MAX_SESSION_ID_LEN, MAX_SESSIONS, SessionError, SessionStore, SharedLog,
};
