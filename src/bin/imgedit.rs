//! Image editor CLI
//!
//! Converts an image to another raster format or removes its background
//! through the remove.bg API.

use imgedit::cli;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = cli::main().await {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }
}
