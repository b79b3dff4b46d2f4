use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod chat;
pub mod eval;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long)]
        host: Option<String>,

        /// Set the server port
        #[arg(long)]
        port: Option<String>,
    },
    /// Start a chat session in the terminal
    Chat {
        /// Reuse a session ID, mostly useful for logging
        #[arg(long)]
        session_id: Option<String>,
    },
    /// Score the replies of a running server against reference answers
    Eval {
        /// The server's chat endpoint
        #[arg(long, default_value = "http://localhost:3000/chat")]
        url: String,

        /// JSON file with a list of `{"query", "reference"}` objects
        #[arg(long)]
        cases: Option<String>,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // Handle each sub command
    match args.command {
        Some(Command::Serve { host, port }) => {
            serve::run(host, port).await?;
        }
        Some(Command::Chat { session_id }) => {
            chat::run(session_id).await?;
        }
        Some(Command::Eval { url, cases }) => {
            eval::run(&url, cases.as_deref()).await?;
        }
        None => {}
    }

    Ok(())
}
