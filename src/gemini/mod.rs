//! Client for the Gemini generative language API.
mod chat;
mod core;

pub use chat::*;
pub use self::core::*;
