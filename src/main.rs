//! Entry point: wire up logging and configuration, then hand off to the
//! build invoker. Exit code 0 on success, 1 with a diagnostic otherwise.

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};

use quarry_build::{BuildConfig, BuildInvoker, HostDescriptor, Platform, process};

/// Prepare and drive the native build of the Quarry debug adapter.
///
/// Takes no arguments; all knobs are environment variables
/// (QUARRY_ARCH, QUARRY_BUILD_TARGET, QUARRY_VERSION_SUFFIX,
/// QUARRY_TOOLCHAIN_FILE, QUARRY_LLDB_ARCHIVE, and the GitHub token
/// chain QUARRY_GITHUB_TOKEN / GITHUB_TOKEN / GH_TOKEN).
#[derive(Parser)]
#[command(name = "quarry-build", version, about)]
struct Cli {}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let _cli = Cli::parse();

    if let Err(e) = run().await {
        error!("build failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = BuildConfig::from_env();
    let host = HostDescriptor::detect(config.arch_override.as_deref());
    info!("host: {:?} {}", host.platform, host.arch);

    if !process::command_exists("cmake") {
        anyhow::bail!("cmake was not found on PATH; install CMake to build the native components");
    }
    if host.platform != Platform::Windows && !process::command_exists("ninja") {
        warn!("ninja was not found on PATH; the configure step will fail without it");
    }

    let root = std::env::current_dir().context("cannot determine the repository root")?;
    let client = reqwest::Client::new();

    BuildInvoker::new(root, config, host).invoke(&client).await?;

    info!("build completed");
    Ok(())
}
