//! Background Removal CLI Tool
//!
//! Command-line front end for removing backgrounds through the remove.bg
//! API or a compatible proxy.

#[cfg(feature = "cli")]
use bgremove_remote::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
