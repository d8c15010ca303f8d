use std::collections::VecDeque;

use chrono::NaiveDate;

use crate::renderer::StreamRenderer;

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    StreamOpened { cycle: u64 },
    StreamMessage { cycle: u64, data: String },
    StreamError { cycle: u64, error: String },
    /// The server closed the stream. Only meaningful before `done`.
    StreamEnded { cycle: u64 },
    Log(String),
}

impl Delta {
    pub fn cycle(&self) -> Option<u64> {
        match self {
            Delta::StreamOpened { cycle }
            | Delta::StreamMessage { cycle, .. }
            | Delta::StreamError { cycle, .. }
            | Delta::StreamEnded { cycle } => Some(*cycle),
            Delta::Log(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Connecting,
    Streaming,
    Closed(CloseReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    Completed,
    Failed(String),
    Cancelled,
}

/// Per-cycle bookkeeping. Reset whenever a new fetch starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Node index of the league section receiving cards.
    pub current_league: Option<usize>,
    pub games_found: bool,
    pub cards_rendered: usize,
    pub orphans_dropped: usize,
    pub malformed_skipped: usize,
}

pub struct AppState {
    pub renderer: StreamRenderer,
    pub logs: VecDeque<String>,
    pub selected_league: usize,
    pub scroll: u16,
    pub help_overlay: bool,
}

impl AppState {
    pub fn new(renderer: StreamRenderer) -> Self {
        Self {
            renderer,
            logs: VecDeque::new(),
            selected_league: 0,
            scroll: 0,
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > LOG_CAPACITY {
            self.logs.pop_front();
        }
    }

    pub fn league_count(&self) -> usize {
        self.renderer.page().leagues().count()
    }

    pub fn select_next(&mut self) {
        let total = self.league_count();
        if total == 0 {
            self.selected_league = 0;
            return;
        }
        self.selected_league = (self.selected_league + 1).min(total - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected_league = self.selected_league.saturating_sub(1);
    }

    pub fn clamp_selection(&mut self) {
        let total = self.league_count();
        if total == 0 {
            self.selected_league = 0;
        } else if self.selected_league >= total {
            self.selected_league = total - 1;
        }
    }

    pub fn toggle_selected_league(&mut self) {
        let idx = self.selected_league;
        self.renderer.page_mut().toggle_league(idx);
    }

    pub fn shift_day(&mut self, days: i64) {
        self.reset_view();
        self.renderer.shift_date(days);
    }

    pub fn jump_to(&mut self, date: NaiveDate) {
        self.reset_view();
        self.renderer.set_date(date);
    }

    /// Re-runs the current date. The only way out of a failed stream.
    pub fn refetch(&mut self) {
        self.reset_view();
        self.renderer.fetch();
    }

    fn reset_view(&mut self) {
        self.selected_league = 0;
        self.scroll = 0;
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Log(msg) => state.push_log(msg),
        other => {
            state.renderer.handle_delta(other);
            state.clamp_selection();
        }
    }
}
