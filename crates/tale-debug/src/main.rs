use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{ArgAction, Parser};
use tale_debug::{DebugAdapter, ReplayBridge, Session};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(
    name = "tale-debug",
    version,
    about = "Debug adapter for interactive-fiction stories",
    disable_version_flag = true,
    after_help = "Examples:\n  tale-debug --stdio\n  tale-debug --trace runs/intro.json"
)]
struct Args {
    /// Print version.
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
    /// Speak DAP over stdin/stdout (default).
    #[arg(long, action = ArgAction::SetTrue)]
    stdio: bool,
    /// Networked transport; not supported.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
    /// Recorded story run to replay when launch names no program.
    #[arg(long, value_name = "FILE")]
    trace: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(port) = args.port {
        bail!("--port {port}: networked transport is not supported; run with --stdio");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let bridge = match &args.trace {
        Some(path) => ReplayBridge::from_path(path)
            .with_context(|| format!("failed to preload trace {}", path.display()))?,
        None => ReplayBridge::new(),
    };

    if !args.stdio {
        debug!("no transport flag given; using stdio");
    }
    info!("Starting tale-debug adapter");
    let mut adapter = DebugAdapter::new(Session::new(bridge));
    adapter.run_stdio().context("tale-debug transport error")?;
    Ok(())
}
