//! I14Y registry CLI executable
//!
//! See the cli module documentation for the list of commands.

use atrius_i14y_client::cli::{Args, run_cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    run_cli(args).await
}
