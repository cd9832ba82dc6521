//! Value set transformation executable
//!
//! See the cli module documentation for usage.

use atrius_i14y_transform::cli::{Args, run_cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    run_cli(args).await
}
