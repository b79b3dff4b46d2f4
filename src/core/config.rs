use std::env;

use anyhow::{Context, Result, anyhow};

use crate::ai::chat::CommitMode;
use crate::ai::prompt::RESOURCE_FINDER_PERSONA;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: String,
    pub gemini_api_hostname: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_timeout_secs: u64,
    pub system_message: String,
    pub static_path: String,
    pub context_window: Option<usize>,
    pub commit_mode: CommitMode,
}

impl AppConfig {
    /// Build the config from environment variables, loading a `.env`
    /// file first if there is one.
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }

        let gemini_api_key = env::var("API_KEY")
            .or_else(|_| env::var("GEMINI_API_KEY"))
            .map_err(|_| anyhow!("Missing env var API_KEY"))?;
        let host = env::var("FINDER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let gemini_api_hostname = env::var("FINDER_API_HOSTNAME")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".to_string());
        let gemini_model = env::var("FINDER_MODEL").unwrap_or_else(|_| "gemini-pro".to_string());
        let gemini_timeout_secs = match env::var("FINDER_PROVIDER_TIMEOUT_SECS") {
            Ok(secs) => secs
                .parse()
                .with_context(|| format!("Invalid FINDER_PROVIDER_TIMEOUT_SECS: {}", secs))?,
            Err(_) => 120,
        };
        let system_message = env::var("FINDER_SYSTEM_MESSAGE")
            .unwrap_or_else(|_| RESOURCE_FINDER_PERSONA.to_string());
        let static_path = env::var("FINDER_STATIC_PATH").unwrap_or_else(|_| "./web".to_string());
        let context_window = match env::var("FINDER_CONTEXT_WINDOW") {
            Ok(turns) => Some(
                turns
                    .parse()
                    .with_context(|| format!("Invalid FINDER_CONTEXT_WINDOW: {}", turns))?,
            ),
            Err(_) => None,
        };
        let commit_mode = match env::var("FINDER_COMMIT_MODE") {
            Ok(mode) => mode.parse()?,
            Err(_) => CommitMode::default(),
        };

        Ok(Self {
            host,
            port,
            gemini_api_hostname,
            gemini_api_key,
            gemini_model,
            gemini_timeout_secs,
            system_message,
            static_path,
            context_window,
            commit_mode,
        })
    }
}
