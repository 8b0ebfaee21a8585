//! rfctrans CLI: fetch, translate and render IETF RFCs as bilingual pages.
//!
//! Also maintains the index pages, the RFC status snapshot and the
//! per-RFC summaries.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
