//! pagemark CLI: extract the readable content of a web page as Markdown.
//!
//! Fetches a URL (or reads a local HTML file), strips navigation and page
//! chrome, and prints the main content as clean Markdown.

mod commands;

use std::process::ExitCode;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
