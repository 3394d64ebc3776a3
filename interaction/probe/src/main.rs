//! Interaction Probe - Operator CLI for the snapfeed interaction core
//!
//! Exercises the two halves of the core from a terminal: streaming a chat
//! completion, and replaying a recorded touch trace through the gesture
//! classifier.
//!
//! # Usage
//!
//! ```bash
//! # Stream an answer (Ctrl-C cancels cleanly)
//! interaction-probe stream --prompt "Summarize today's feed"
//!
//! # Against another endpoint, with a system prompt
//! interaction-probe stream -p "Hi" --system "Be brief" \
//!     --endpoint http://localhost:8000/langchain/completions
//!
//! # Replay a touch trace, one JSON pointer event per line
//! interaction-probe replay traces/double_tap.txt
//!
//! # Verbose logging (stderr)
//! RUST_LOG=debug interaction-probe stream -p "Hi"
//! ```

mod replay;
mod stream;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use interaction_core::{load_config, load_config_from_path, ConfigOverrides, InteractionConfig};
use tracing::info;

/// Interaction Probe - stream chat completions and replay touch traces
#[derive(Parser, Debug)]
#[command(name = "interaction-probe")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short = 'c', long, env = "INTERACTION_CONFIG", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short = 'l',
        long,
        env = "INTERACTION_LOG_LEVEL",
        default_value = "warn",
        global = true
    )]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a prompt and print the answer as it streams in
    Stream(StreamArgs),

    /// Replay a touch trace and print the synthetic pointer events
    Replay {
        /// Trace file (`start x y t`, `move x y`, `end x y t`, `cancel`, `tick t`)
        #[arg(value_name = "TRACE")]
        trace: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
struct StreamArgs {
    /// User prompt
    #[arg(short = 'p', long)]
    prompt: String,

    /// System prompt
    #[arg(short = 's', long)]
    system: Option<String>,

    /// Chat completions endpoint URL
    #[arg(short = 'e', long, value_name = "URL")]
    endpoint: Option<String>,

    /// Sampling temperature (0.0 - 2.0)
    #[arg(short = 't', long)]
    temperature: Option<f32>,

    /// Response token limit
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Wait for the whole answer instead of streaming
    #[arg(long)]
    no_stream: bool,
}

impl StreamArgs {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref endpoint) = self.endpoint {
            overrides = overrides.with_endpoint(endpoint.clone());
        }
        if let Some(temperature) = self.temperature {
            overrides = overrides.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            overrides = overrides.with_max_tokens(max_tokens);
        }
        if let Some(ref system) = self.system {
            overrides = overrides.with_system_prompt(system.clone());
        }
        overrides
    }
}

/// Initialize logging with the specified level
///
/// Logs go to stderr; stdout carries only streamed text and replayed events.
fn init_logging(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "interaction_probe={level},interaction_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Load configuration, honoring an explicit `--config` path
fn load(path: Option<PathBuf>) -> Result<InteractionConfig> {
    match path {
        Some(path) => {
            anyhow::ensure!(path.exists(), "config file not found: {}", path.display());
            load_config_from_path(Some(path)).context("failed to load configuration")
        }
        None => load_config().context("failed to load configuration"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = load(args.config)?;
    info!(source = %config.source(), "configuration loaded");

    match args.command {
        Command::Stream(stream_args) => {
            stream_args.overrides().apply(&mut config);
            config.validate().context("invalid command-line override")?;

            if stream_args.no_stream {
                stream::run_once(&config.stream, stream_args.prompt).await
            } else {
                stream::run(&config.stream, stream_args.prompt).await
            }
        }
        Command::Replay { trace } => {
            let steps = replay::load_trace(&trace)?;
            let events = replay::replay(&steps, config.gesture, config.mapping);
            for event in &events {
                println!("{}", serde_json::to_string(event)?);
            }
            info!(events = events.len(), "replay finished");
            Ok(())
        }
    }
}
