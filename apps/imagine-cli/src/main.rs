//! `imagine` entry point.

mod app;
mod cli;
mod config;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Credentials usually live in a local .env file.
    let _ = dotenvy::dotenv();
    let args = cli::Args::parse();

    let config = config::Config::load(args.config.as_deref());
    let debug = config.as_ref().is_ok_and(|c| c.debug);
    let default_filter = if debug {
        "info,imagine=debug,imagine_pipeline=debug,imagine_gateway=debug,imagine_asset_client=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "starting imagine");

    match config.and_then(|config| run(args, config)) {
        Ok(()) => {
            tracing::info!("finished");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("finished with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: cli::Args, config: config::Config) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new().context("starting async runtime")?;
    rt.block_on(async {
        tokio::select! {
            result = app::run(args, config) => result,
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for ctrl-c")?;
                anyhow::bail!("interrupted")
            }
        }
    })
}
