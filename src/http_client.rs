use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::Client;
use tokio::runtime::{Builder, Runtime};

static STREAM_CLIENT: OnceCell<Client> = OnceCell::new();
static STREAM_RUNTIME: OnceCell<Runtime> = OnceCell::new();

/// Shared client for long-lived event streams. Only connecting is bounded; the
/// body may stay open for as long as the server keeps producing events. The
/// connect timeout of the first caller wins.
pub fn stream_client(connect_timeout: Duration) -> Result<&'static Client> {
    STREAM_CLIENT.get_or_try_init(|| {
        Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .context("failed to build http client")
    })
}

/// Runtime the stream readers run on. Pooled connections belong to it, so it
/// lives as long as the client does.
pub fn stream_runtime() -> Result<&'static Runtime> {
    STREAM_RUNTIME.get_or_try_init(|| {
        Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("feed-reader")
            .enable_all()
            .build()
            .context("failed to start stream runtime")
    })
}
