use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

use anyhow::{Context, anyhow};

use matscore_terminal::config::{FeedConfig, parse_date};
use matscore_terminal::html::render_document;
use matscore_terminal::page::{DatePicker, Page};
use matscore_terminal::renderer::StreamRenderer;
use matscore_terminal::state::{CloseReason, Delta, StreamPhase};

/// Runs one fetch cycle without the terminal UI and prints the resulting page.
/// Usage: feed_dump [YYYY-MM-DD]
fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = FeedConfig::from_env();

    let date = match std::env::args().nth(1) {
        Some(raw) => parse_date(&raw).ok_or_else(|| anyhow!("expected YYYY-MM-DD, got {raw}"))?,
        None => config
            .initial_date
            .unwrap_or_else(|| DatePicker::today().value()),
    };

    let (tx, rx) = mpsc::channel();
    let mut renderer = StreamRenderer::attach(
        Page::analysis_page(DatePicker::new(date)),
        config.build_source(),
        tx,
    )
    .context("analysis loader did not start")?;

    while renderer.is_open() {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(Delta::Log(msg)) => eprintln!("{msg}"),
            Ok(delta) => {
                renderer.handle_delta(delta);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    while let Ok(delta) = rx.try_recv() {
        if let Delta::Log(msg) = delta {
            eprintln!("{msg}");
        }
    }

    print!("{}", render_document(renderer.page()));

    match renderer.phase() {
        StreamPhase::Closed(CloseReason::Failed(reason)) => Err(anyhow!("stream failed: {reason}")),
        _ => Ok(()),
    }
}
