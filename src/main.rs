use anyhow::Result;
use unibox::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
