//! panelctl — issue and verify panel access tokens from the command line.

mod actions;
mod cli;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("panel=info".parse()?);
    // stdout carries command output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    let matches = cli::command().get_matches();
    let action = cli::dispatch(&matches)?;
    let output = action.execute()?;
    println!("{output}");
    Ok(())
}
