//! `stream` subcommand: send one prompt and print the answer as it arrives

use std::io::Write;

use anyhow::{anyhow, Context, Result};
use interaction_core::{
    ChannelHandler, SessionOutcome, StreamConfig, StreamEvent, StreamTransport, TransportError,
};
use tracing::{debug, info};

/// Stream `prompt` to stdout; Ctrl-C cancels the session
pub async fn run(config: &StreamConfig, prompt: String) -> Result<()> {
    let transport =
        StreamTransport::from_config(config).context("failed to build HTTP client")?;
    let (handler, mut events) = ChannelHandler::new();
    let handle = transport.start(config.request(prompt), handler);
    debug!(session = %handle.id(), endpoint = %config.endpoint, "stream started");

    let canceller = handle.canceller();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling stream");
            canceller.cancel();
        }
    });

    // Channel closes when the session task ends, cancelled or not
    let mut failure: Option<TransportError> = None;
    let mut stdout = std::io::stdout();
    while let Some(event) = events.recv().await {
        match event {
            StreamEvent::Fragment(text) => {
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            StreamEvent::Done => writeln!(stdout)?,
            StreamEvent::Error(e) => failure = Some(e),
        }
    }
    interrupt.abort();

    match handle.wait().await {
        SessionOutcome::Done => Ok(()),
        SessionOutcome::Cancelled => {
            writeln!(stdout)?;
            Ok(())
        }
        SessionOutcome::Failed => Err(failure.map_or_else(
            || anyhow!("stream session failed"),
            |e| anyhow::Error::new(e).context(format!("stream from {} failed", config.endpoint)),
        )),
    }
}

/// Send `prompt` without streaming and print the whole answer
pub async fn run_once(config: &StreamConfig, prompt: String) -> Result<()> {
    let transport =
        StreamTransport::from_config(config).context("failed to build HTTP client")?;

    let completion = transport
        .complete(config.request(prompt))
        .await
        .with_context(|| format!("completion from {} failed", config.endpoint))?;

    debug!(model = ?completion.model, id = ?completion.id, usage = ?completion.usage, "completion done");
    println!("{}", completion.content);
    Ok(())
}
