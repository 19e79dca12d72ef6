//! notepin CLI: quick notes with screenshots, exported as documents.
//!
//! Caches short notes under a (tag, title) key and compiles them into a
//! `.docx` on submit.

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
