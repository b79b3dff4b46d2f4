use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::Instrument;
use uuid::Uuid;

use crate::ai::chat::{ConversationLog, Relay, RelayError};
use crate::core::{AppConfig, logging};

fn session_span(session_id: &str) -> tracing::Span {
    tracing::info_span!("chat", session_id = %session_id)
}

/// Relay one line of input and return what should be shown to the
/// user. Failures are logged and the session keeps going.
async fn respond(relay: &Relay, log: &mut ConversationLog, line: &str) -> String {
    match relay.handle(log, line).await {
        Ok(reply) => reply,
        Err(RelayError::InvalidRequest(msg)) => {
            tracing::debug!("Rejected chat input: {}", msg);
            format!("Invalid input: {}", msg)
        }
        // The user turn stays in the log unless commit mode is atomic
        Err(err) => {
            tracing::error!(log_len = log.len(), "Chat turn failed: {}", err);
            format!("Error: {}", err)
        }
    }
}

async fn repl(relay: Relay, mut log: ConversationLog) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    tracing::info!("Started chat session");

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                rl.add_history_entry(line)?;
                println!("{}", respond(&relay, &mut log, line).await);
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    tracing::info!(turns = log.len(), "Ended chat session");
    Ok(())
}

pub async fn run(session_id: Option<String>) -> Result<()> {
    logging::init_tracing();

    let config = AppConfig::from_env()?;
    let relay = Relay::from_config(&config);
    let log = ConversationLog::new(&config.system_message);
    let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    println!("Session {}", session_id);

    repl(relay, log).instrument(session_span(&session_id)).await
}
