use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::http_client::{stream_client, stream_runtime};
use crate::sse::SseDecoder;
use crate::state::Delta;

/// Single-shot cancellation shared between a renderer and one reader.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(CancellationToken);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.is_cancelled()
    }

    /// Resolves once `cancel` has been called.
    pub async fn cancelled(&self) {
        self.0.cancelled().await;
    }
}

/// Everything a source needs to run one fetch cycle.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    pub date: String,
    pub cycle: u64,
    pub tx: Sender<Delta>,
    pub cancel: CancelFlag,
}

impl StreamRequest {
    /// Sends unless cancelled. Returns false once the cycle should stop.
    pub fn emit(&self, delta: Delta) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        self.tx.send(delta).is_ok()
    }
}

/// Where fetch cycles get their events from.
pub trait FeedSource {
    /// Starts delivering deltas for `request` and returns without blocking.
    fn open(&self, request: StreamRequest) -> Result<()>;

    fn describe(&self) -> String;
}

/// Live server-sent-events feed over HTTP.
pub struct LiveSource {
    api_url: String,
    connect_timeout: Duration,
}

impl LiveSource {
    pub fn new(api_url: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            connect_timeout,
        }
    }
}

impl FeedSource for LiveSource {
    fn open(&self, request: StreamRequest) -> Result<()> {
        let url = feed_url(&self.api_url, &request.date)?;
        let client = stream_client(self.connect_timeout)?;
        let runtime = stream_runtime()?;
        info!(cycle = request.cycle, %url, "opening event stream");
        runtime.spawn(run_live_stream(client, url, request));
        Ok(())
    }

    fn describe(&self) -> String {
        format!("live {}", self.api_url)
    }
}

/// `<api_url>?date=YYYY-MM-DD`, keeping any query the endpoint already has.
pub fn feed_url(api_url: &str, date: &str) -> Result<Url> {
    let mut url = Url::parse(api_url).with_context(|| format!("invalid feed url {api_url}"))?;
    url.query_pairs_mut().append_pair("date", date);
    Ok(url)
}

/// Reads one event stream until it ends, fails or is cancelled. Cancelling
/// drops the response mid-body, which closes the connection even while the
/// server is silent or only sending keepalive comments.
async fn run_live_stream(client: &'static Client, url: Url, request: StreamRequest) {
    let cycle = request.cycle;
    let send = client
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send();
    let resp = tokio::select! {
        _ = request.cancel.cancelled() => {
            debug!(cycle, "cancelled while connecting");
            return;
        }
        resp = send => match resp {
            Ok(resp) => resp,
            Err(err) => {
                warn!(cycle, error = %err, "event stream connect failed");
                request.emit(Delta::StreamError {
                    cycle,
                    error: format!("request failed: {err}"),
                });
                return;
            }
        }
    };

    let status = resp.status();
    if !status.is_success() {
        warn!(cycle, %status, "event stream rejected");
        request.emit(Delta::StreamError {
            cycle,
            error: format!("http {status}"),
        });
        return;
    }
    if !request.emit(Delta::StreamOpened { cycle }) {
        return;
    }

    let mut body = resp.bytes_stream();
    let mut decoder = SseDecoder::new();
    loop {
        tokio::select! {
            _ = request.cancel.cancelled() => {
                debug!(cycle, "event stream cancelled");
                return;
            }
            chunk = body.next() => match chunk {
                Some(Ok(bytes)) => {
                    for msg in decoder.push_bytes(&bytes) {
                        debug!(cycle, bytes = msg.data.len(), "event received");
                        let delivered = request.emit(Delta::StreamMessage {
                            cycle,
                            data: msg.data,
                        });
                        if !delivered {
                            debug!(cycle, "reader stopped");
                            return;
                        }
                    }
                }
                Some(Err(err)) => {
                    warn!(cycle, error = %err, "event stream dropped");
                    request.emit(Delta::StreamError {
                        cycle,
                        error: format!("failed reading event stream: {err}"),
                    });
                    return;
                }
                None => {
                    // an event without its terminating blank line is incomplete and dropped
                    request.emit(Delta::StreamEnded { cycle });
                    return;
                }
            }
        }
    }
}
