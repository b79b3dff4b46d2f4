//! Router for the chat API

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    routing::{get, post},
};

use super::public;
use crate::ai::chat::DEFAULT_SESSION_ID;
use crate::api::public::ApiError;
use crate::api::state::SharedState;

fn session_id_or_default(session_id: Option<String>) -> String {
    session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| DEFAULT_SESSION_ID.to_string())
}

/// Relay a user message to the model and respond with its reply
async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<public::ChatRequest>, JsonRejection>,
) -> Result<Json<public::ChatResponse>, ApiError> {
    let Json(payload) = payload.map_err(|rejection| {
        tracing::debug!("Rejected chat request body: {}", rejection);
        ApiError::InvalidRequest
    })?;

    let user_input = payload.user_input.unwrap_or_default();
    tracing::info!("Incoming /chat request: {}", user_input);

    // Reject before anything touches the conversation log
    if user_input.is_empty() {
        return Err(ApiError::InvalidRequest);
    }

    let session_id = session_id_or_default(payload.session_id);
    let log = state.sessions.get_or_create(&session_id)?;
    let mut log = log.lock().await;
    let response = state.relay.handle(&mut log, &user_input).await?;

    Ok(Json(public::ChatResponse { response }))
}

/// Get the conversation log of a session
async fn chat_history(
    State(state): State<SharedState>,
    Query(params): Query<public::ChatHistoryQuery>,
) -> Result<Json<public::ChatHistoryResponse>, ApiError> {
    let session_id = session_id_or_default(params.session_id);
    let log = state
        .sessions
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound(format!("Chat session {} not found", session_id)))?;
    let turns = log.lock().await.snapshot();

    Ok(Json(public::ChatHistoryResponse { session_id, turns }))
}

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/", post(chat_handler))
        .route("/history", get(chat_history))
}
