//! Handoff CLI - local tooling for cross-device login handoff
//!
//! The protocol itself runs inside an application that owns a transport.
//! This binary manages what Handoff keeps on disk and decodes login links.
//!
//! ## Quick Start
//!
//! ```bash
//! # List account slots on this device
//! handoff accounts list
//!
//! # Decode a scanned login link
//! handoff link decode "tg://login?token=AQID"
//! ```

#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unused_async)]

use anyhow::Result;
use clap::Parser;

mod commands;

use commands::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();

    match cli.command {
        Command::Accounts(args) => commands::accounts::run(args).await,
        Command::Link(args) => commands::link::run(args).await,
        Command::Config(args) => commands::config::run(args).await,
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,handoff=info,handoff_core=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
