//! Runscribe CLI entry point.
//!
//! Replays a newline-delimited JSON event stream (from a file or stdin)
//! through a dispatcher against the configured record service.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use runscribe::application::TerminationSignals;
use runscribe::domain::models::RunEvent;
use runscribe::infrastructure::build_client;
use runscribe::infrastructure::config::ConfigLoader;
use runscribe::Dispatcher;

#[derive(Parser)]
#[command(name = "runscribe", about = "Record an automation run event stream")]
struct Cli {
    /// Event stream file (newline-delimited JSON). Reads stdin when omitted.
    #[arg(short, long)]
    events: Option<PathBuf>,

    /// Configuration file. Defaults to runscribe.yaml plus RUNSCRIBE_* env vars.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = ?err, "recording failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let client = build_client(&config)?;
    let mut dispatcher = Dispatcher::new(client, config);

    let reader: Box<dyn AsyncRead + Unpin> = match &cli.events {
        Some(path) => Box::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open event stream {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdin()),
    };
    let mut lines = BufReader::new(reader).lines();
    let mut signals = TerminationSignals::new().context("cannot install signal handlers")?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("cannot read event stream")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let event: RunEvent = serde_json::from_str(&line)
                    .with_context(|| format!("malformed event: {line}"))?;
                dispatcher.handle_event(event).await?;
            }
            code = signals.recv() => {
                dispatcher.on_terminate().await;
                return Ok(ExitCode::from(exit_byte(code)));
            }
        }
    }

    if dispatcher
        .active_run()
        .is_some_and(|run| !run.status.is_terminal())
    {
        warn!("event stream ended without run stats; run record left running");
    }
    Ok(ExitCode::SUCCESS)
}

/// Clamp a `128 + signal` code into the byte range `ExitCode` accepts.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}
