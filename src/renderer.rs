use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::feed_event::{FeedEvent, parse_feed_event};
use crate::page::{
    DATE_PICKER_MOUNT, LOADING_TEXT_MOUNT, LeagueSection, MatchCard, Node, Page, RESULTS_MOUNT,
    TRANSPORT_ERROR_TEXT, league_slug,
};
use crate::state::{CloseReason, Delta, RenderState, StreamPhase};
use crate::stream::{CancelFlag, FeedSource, StreamRequest};

const LOADING_PHRASES: [&str; 3] = [
    "Fetching fixtures",
    "Analysing matches",
    "Crunching the numbers",
];
const LOADING_FRAME_INTERVAL: Duration = Duration::from_millis(400);
const LOADING_DOTS: usize = 4;

struct ActiveStream {
    cycle: u64,
    cancel: CancelFlag,
}

struct LoadingAnimation {
    frame: usize,
    last_advance: Instant,
}

impl LoadingAnimation {
    fn new() -> Self {
        Self {
            frame: 0,
            last_advance: Instant::now(),
        }
    }

    fn label(&self) -> String {
        let phrase = LOADING_PHRASES[(self.frame / LOADING_DOTS) % LOADING_PHRASES.len()];
        let dots = ".".repeat(self.frame % LOADING_DOTS);
        format!("{phrase}{dots}")
    }
}

/// Owns one feed connection at a time and turns its events into page nodes.
pub struct StreamRenderer {
    page: Page,
    source: Box<dyn FeedSource>,
    tx: Sender<Delta>,
    cycle: u64,
    phase: StreamPhase,
    render: RenderState,
    active: Option<ActiveStream>,
    loading: LoadingAnimation,
}

impl StreamRenderer {
    /// Binds to `page` and starts the first fetch for the picker's date. Fails
    /// without touching the page when a required mount point is missing.
    pub fn attach(page: Page, source: Box<dyn FeedSource>, tx: Sender<Delta>) -> Result<Self> {
        if let Err(err) = page.require_mounts(&[RESULTS_MOUNT, DATE_PICKER_MOUNT]) {
            error!(error = %err, "renderer not attached");
            return Err(err);
        }
        info!(source = %source.describe(), "renderer attached");
        let mut renderer = Self {
            page,
            source,
            tx,
            cycle: 0,
            phase: StreamPhase::Idle,
            render: RenderState::default(),
            active: None,
            loading: LoadingAnimation::new(),
        };
        renderer.fetch();
        Ok(renderer)
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut Page {
        &mut self.page
    }

    pub fn phase(&self) -> &StreamPhase {
        &self.phase
    }

    pub fn render_state(&self) -> &RenderState {
        &self.render
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn date(&self) -> NaiveDate {
        self.page.date_picker.value()
    }

    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.page.date_picker.set(date);
        self.fetch();
    }

    pub fn shift_date(&mut self, days: i64) {
        self.page.date_picker.shift_days(days);
        self.fetch();
    }

    /// Starts a new fetch cycle for the current picker date, tearing down any
    /// stream still open from the previous one.
    pub fn fetch(&mut self) {
        if self.active.is_some() {
            self.close(CloseReason::Cancelled);
        }

        self.cycle += 1;
        self.render = RenderState::default();
        self.loading = LoadingAnimation::new();

        let date = self.page.date_picker.iso();
        self.page.clear();
        self.page.nodes.push(Node::Heading(format!("Analyses for {date}")));
        self.page.nodes.push(Node::Loading);
        self.refresh_loading_label();

        let cancel = CancelFlag::new();
        self.active = Some(ActiveStream {
            cycle: self.cycle,
            cancel: cancel.clone(),
        });
        self.phase = StreamPhase::Connecting;
        self.log(format!("[INFO] Fetching analyses for {date}"));

        let request = StreamRequest {
            date,
            cycle: self.cycle,
            tx: self.tx.clone(),
            cancel,
        };
        if let Err(err) = self.source.open(request) {
            self.fail(format!("{err:#}"));
        }
    }

    /// Tears down the open stream, if any, without touching the page.
    pub fn close(&mut self, reason: CloseReason) {
        if let Some(active) = self.active.take() {
            debug!(cycle = active.cycle, ?reason, "closing stream");
            active.cancel.cancel();
        }
        if !matches!(self.phase, StreamPhase::Closed(_)) {
            self.phase = StreamPhase::Closed(reason);
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.phase, StreamPhase::Connecting | StreamPhase::Streaming)
    }

    /// Applies a stream delta. Log deltas, deltas from any cycle but the live one,
    /// and anything arriving after the stream closed are dropped. Returns whether
    /// the delta was accepted.
    pub fn handle_delta(&mut self, delta: Delta) -> bool {
        if delta.cycle() != Some(self.cycle) || !self.is_open() {
            debug!(cycle = ?delta.cycle(), current = self.cycle, "stale delta ignored");
            return false;
        }

        match delta {
            Delta::StreamOpened { .. } => {
                debug!(cycle = self.cycle, "stream opened");
            }
            Delta::StreamMessage { data, .. } => match parse_feed_event(&data) {
                Ok(event) => self.apply_event(event),
                Err(err) => {
                    self.render.malformed_skipped += 1;
                    warn!(cycle = self.cycle, error = %err, "skipping malformed feed message");
                    self.log(format!("[WARN] Skipped malformed message: {err}"));
                }
            },
            Delta::StreamError { error, .. } => self.fail(error),
            Delta::StreamEnded { .. } => self.fail("stream ended before completion".to_string()),
            Delta::Log(_) => {}
        }
        true
    }

    /// One step of the feed state machine for an already decoded event.
    pub fn apply_event(&mut self, event: FeedEvent) {
        if !self.is_open() {
            return;
        }
        if self.phase == StreamPhase::Connecting {
            self.phase = StreamPhase::Streaming;
        }
        self.page.remove_loading();

        match event {
            FeedEvent::LeagueStart {
                league_name,
                country_flag,
                country_name,
            } => {
                let section = LeagueSection {
                    id: format!("container-{}", league_slug(&league_name)),
                    name: league_name,
                    flag: country_flag,
                    country: country_name,
                    open: true,
                    cards: Vec::new(),
                };
                self.page.nodes.push(Node::League(section));
                self.render.current_league = Some(self.page.nodes.len() - 1);
                self.render.games_found = true;
            }
            FeedEvent::NoGames => {}
            FeedEvent::Done => {
                if !self.render.games_found {
                    self.page.nodes.push(Node::EmptyState);
                }
                self.page.nodes.push(Node::Completion);
                self.close(CloseReason::Completed);
                self.log(format!(
                    "[INFO] Feed complete: {} cards",
                    self.render.cards_rendered
                ));
            }
            FeedEvent::MatchResult(record) => {
                let Some(section) = self
                    .render
                    .current_league
                    .and_then(|idx| self.page.league_mut(idx))
                else {
                    self.render.orphans_dropped += 1;
                    debug!(cycle = self.cycle, "match before any league dropped");
                    return;
                };
                section.cards.push(MatchCard::from(record));
                self.render.cards_rendered += 1;
            }
            FeedEvent::Unrecognized { status } => {
                debug!(cycle = self.cycle, %status, "unrecognized status ignored");
            }
        }
    }

    /// Advances the loading animation while the placeholder is showing.
    pub fn tick(&mut self, now: Instant) {
        if !self.page.has_loading() {
            self.page.loading_label = None;
            return;
        }
        if now.duration_since(self.loading.last_advance) >= LOADING_FRAME_INTERVAL {
            self.loading.frame = self.loading.frame.wrapping_add(1);
            self.loading.last_advance = now;
            self.refresh_loading_label();
        }
    }

    fn refresh_loading_label(&mut self) {
        self.page.loading_label = if self.page.has_mount(LOADING_TEXT_MOUNT) {
            Some(self.loading.label())
        } else {
            None
        };
    }

    fn fail(&mut self, reason: String) {
        warn!(cycle = self.cycle, %reason, "stream failed");
        self.log(format!("[WARN] Stream error: {reason}"));
        self.close(CloseReason::Failed(reason));
        self.page
            .replace_loading(Node::Error(TRANSPORT_ERROR_TEXT.to_string()));
        self.page.loading_label = None;
    }

    fn log(&self, msg: String) {
        let _ = self.tx.send(Delta::Log(msg));
    }
}

impl Drop for StreamRenderer {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}
