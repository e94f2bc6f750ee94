use clap::Parser;
use traffic_homologator::cli::{run, Cli};
use traffic_homologator::error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
