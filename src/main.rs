use anyhow::Result;
use finder::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
