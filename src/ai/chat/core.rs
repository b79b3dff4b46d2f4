use std::fmt;
use std::str::FromStr;

use anyhow::{Error, anyhow};

use super::models::ConversationLog;
use crate::core::AppConfig;
use crate::gemini::{BoxedChatProvider, ChatSession, GeminiProvider, Role, Turn};

/// When the user turn of an exchange is written to the log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CommitMode {
    /// Record the user turn before calling the provider. A failed
    /// call leaves it in the log.
    #[default]
    Eager,
    /// Record both turns only once the provider has replied.
    Atomic,
}

impl FromStr for CommitMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "atomic" => Ok(Self::Atomic),
            other => Err(anyhow!("Unknown commit mode: {}", other)),
        }
    }
}

impl fmt::Display for CommitMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Eager => write!(f, "eager"),
            Self::Atomic => write!(f, "atomic"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Provider error: {0:#}")]
    Provider(Error),
}

/// Runs one request/response cycle against the chat provider,
/// keeping the conversation log up to date.
///
/// Use `Relay::builder()` to construct a `Relay`.
pub struct Relay {
    provider: BoxedChatProvider,
    window: Option<usize>,
    commit: CommitMode,
}

impl Relay {
    pub fn builder(provider: BoxedChatProvider) -> RelayBuilder {
        RelayBuilder::new(provider)
    }

    /// A relay to the Gemini API using the window and commit mode set
    /// in `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::builder(Box::new(GeminiProvider::from_config(config)))
            .window(config.context_window)
            .commit(config.commit_mode)
            .build()
    }

    /// Send `user_input` to the provider with the whole `log` as
    /// context and return the reply. On success the log has grown by
    /// a user turn and a model turn.
    pub async fn handle(
        &self,
        log: &mut ConversationLog,
        user_input: &str,
    ) -> Result<String, RelayError> {
        if user_input.is_empty() {
            return Err(RelayError::InvalidRequest(
                "User input can not be empty".to_string(),
            ));
        }
        let user_turn = Turn::new(Role::User, user_input);

        let history = match self.commit {
            CommitMode::Eager => {
                log.append(user_turn.clone())
                    .map_err(|e| RelayError::InvalidRequest(e.to_string()))?;
                log.context(self.window)
            }
            CommitMode::Atomic => {
                let mut pending = log.clone();
                pending
                    .append(user_turn.clone())
                    .map_err(|e| RelayError::InvalidRequest(e.to_string()))?;
                pending.context(self.window)
            }
        };

        let session = ChatSession::start(history);
        let reply = self
            .provider
            .send_message(&session, user_input)
            .await
            .map_err(RelayError::Provider)?;

        if self.commit == CommitMode::Atomic {
            log.append(user_turn)
                .map_err(|e| RelayError::InvalidRequest(e.to_string()))?;
        }
        log.append(Turn::new(Role::Model, &reply))
            .map_err(RelayError::Provider)?;

        tracing::debug!(log_len = log.len(), "Relayed chat message");

        Ok(reply)
    }
}

pub struct RelayBuilder {
    provider: BoxedChatProvider,
    window: Option<usize>,
    commit: CommitMode,
}

impl RelayBuilder {
    pub fn new(provider: BoxedChatProvider) -> Self {
        Self {
            provider,
            window: None,
            commit: CommitMode::default(),
        }
    }

    pub fn build(self) -> Relay {
        Relay {
            provider: self.provider,
            window: self.window,
            commit: self.commit,
        }
    }

    /// Limit the context sent to the provider to the seed turn plus
    /// the `turns` most recent turns.
    pub fn window(mut self, turns: Option<usize>) -> Self {
        self.window = turns;
        self
    }

    pub fn commit(mut self, mode: CommitMode) -> Self {
        self.commit = mode;
        self
    }
}
