use anyhow::Result;
use tracing::info;

use warden_uci::UciEngine;

fn main() -> Result<()> {
    // stdout carries the UCI protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::INFO)
        .init();
    info!(version = env!("CARGO_PKG_VERSION"), "warden starting");
    UciEngine::new().run()?;
    Ok(())
}
