//! Dispatch generator executable.

use anyhow::Result;
use clap::Parser;
use dispatchgen_manifest::cli::{run_cli, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    run_cli(cli)
}
