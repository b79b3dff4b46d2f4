//! The core models for keeping a stateful chat with an LLM.
use anyhow::{Result, bail};

use crate::gemini::{Role, Turn};

/// Ordered, append-only history of a conversation.
///
/// The first turn is always the persona instruction the log was
/// created with. Nothing is ever removed.
#[derive(Clone, Debug)]
pub struct ConversationLog(Vec<Turn>);

impl ConversationLog {
    pub fn new(seed: &str) -> Self {
        Self(vec![Turn::new(Role::User, seed)])
    }

    pub fn seed(&self) -> &Turn {
        &self.0[0]
    }

    /// Add a turn to the end of the log. User turns must carry some
    /// text, model turns are taken as-is.
    pub fn append(&mut self, turn: Turn) -> Result<()> {
        if turn.role() == Role::User && turn.text().is_empty() {
            bail!("User turns can not be empty");
        }
        self.0.push(turn);
        Ok(())
    }

    pub fn snapshot(&self) -> Vec<Turn> {
        self.0.clone()
    }

    /// The history handed to the provider. With a `window`, only the
    /// seed and the most recent `window` turns after it are included.
    pub fn context(&self, window: Option<usize>) -> Vec<Turn> {
        match window {
            Some(n) if self.0.len() > n.saturating_add(1) => {
                let mut turns = Vec::with_capacity(n + 1);
                turns.push(self.seed().clone());
                turns.extend_from_slice(&self.0[self.0.len() - n..]);
                turns
            }
            _ => self.snapshot(),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    // Always holds the seed
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.0.iter()
    }
}
