use anyhow::Result;
use clap::Parser;

use flowdeck_cli::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::dispatch(cli).await
}
