//! Test utilities for integration tests
#![allow(dead_code)]
use std::sync::{Arc, Mutex};

use anyhow::{Result, bail};
use async_trait::async_trait;
use axum::{Router, body::Body};
use tempfile::TempDir;

use finder::ai::chat::{CommitMode, Relay};
use finder::api::{AppState, SharedState, app};
use finder::core::AppConfig;
use finder::gemini::{BoxedChatProvider, ChatProvider, ChatSession, Turn};

pub const TEST_SEED: &str = "Act as a University Resource Finder Chatbot for students.";

/// Replies with a fixed text and records the history of every call.
pub struct StubProvider {
    pub reply: String,
    pub calls: Arc<Mutex<Vec<Vec<Turn>>>>,
}

impl StubProvider {
    pub fn new(reply: &str) -> (Self, Arc<Mutex<Vec<Vec<Turn>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = Self {
            reply: reply.to_string(),
            calls: Arc::clone(&calls),
        };
        (provider, calls)
    }
}

#[async_trait]
impl ChatProvider for StubProvider {
    async fn send_message(&self, session: &ChatSession, _text: &str) -> Result<String> {
        self.calls.lock().unwrap().push(session.history.clone());
        Ok(self.reply.clone())
    }
}

/// Fails every call the way a dropped connection would.
pub struct FailingProvider;

#[async_trait]
impl ChatProvider for FailingProvider {
    async fn send_message(&self, _session: &ChatSession, _text: &str) -> Result<String> {
        bail!("error sending request: connection refused")
    }
}

/// Config pointing at a temporary directory holding the static
/// assets. The directory is removed when the `TempDir` is dropped.
pub fn test_config(api_hostname: &str) -> (AppConfig, TempDir) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(
        dir.path().join("index.html"),
        "<html><body><h1>University Resource Finder</h1></body></html>",
    )
    .expect("Failed to write index.html");
    std::fs::write(dir.path().join("loader.gif"), b"GIF89a\x01\x00\x01\x00\x00\x00\x00;")
        .expect("Failed to write loader.gif");

    let config = AppConfig {
        host: String::from("127.0.0.1"),
        port: String::from("3000"),
        gemini_api_hostname: api_hostname.to_string(),
        gemini_api_key: String::from("test-api-key"),
        gemini_model: String::from("gemini-pro"),
        gemini_timeout_secs: 5,
        system_message: String::from(TEST_SEED),
        static_path: dir.path().display().to_string(),
        context_window: None,
        commit_mode: CommitMode::Eager,
    };
    (config, dir)
}

/// Creates a test application router with the given provider. The
/// shared state is returned so tests can inspect the conversation
/// logs.
pub fn test_app_with_provider(provider: BoxedChatProvider) -> (Router, SharedState, TempDir) {
    let (config, dir) = test_config("http://localhost:1");
    let relay = Relay::builder(provider).build();
    let state = Arc::new(AppState::new(config, relay));
    (app(Arc::clone(&state)), state, dir)
}

/// Creates a test application router that talks to a Gemini API at
/// `api_hostname`.
pub fn test_app_with_gemini(api_hostname: &str) -> (Router, SharedState, TempDir) {
    let (config, dir) = test_config(api_hostname);
    let relay = Relay::from_config(&config);
    let state = Arc::new(AppState::new(config, relay));
    (app(Arc::clone(&state)), state, dir)
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not utf-8")
}

pub async fn log_len(state: &SharedState, session_id: &str) -> usize {
    let log = state
        .sessions
        .get(session_id)
        .expect("Session does not exist");
    let log = log.lock().await;
    log.len()
}
