//! Public types for the chat API
use serde::{Deserialize, Serialize};

use crate::gemini::Turn;

#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_input: Option<String>,
    // Conversations without a session ID share one log
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryQuery {
    pub session_id: Option<String>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryResponse {
    pub session_id: String,
    pub turns: Vec<Turn>,
}
