use std::collections::HashSet;

use anyhow::{Result, anyhow};
use chrono::{Duration as ChronoDuration, Local, NaiveDate};

use crate::feed_event::MatchRecord;

pub const RESULTS_MOUNT: &str = "resultados-container";
pub const DATE_PICKER_MOUNT: &str = "date-picker";
pub const LOADING_TEXT_MOUNT: &str = "loading-text";

pub const EMPTY_STATE_TEXT: &str = "No games found for this date.";
pub const COMPLETION_TEXT: &str = "Search complete!";
pub const TRANSPORT_ERROR_TEXT: &str = "Error connecting to the server.";
pub const UNAVAILABLE_TEXT: &str = "Analysis unavailable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Heading(String),
    Loading,
    League(LeagueSection),
    EmptyState,
    Completion,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueSection {
    pub id: String,
    pub name: String,
    pub flag: Option<String>,
    pub country: Option<String>,
    pub open: bool,
    pub cards: Vec<MatchCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCard {
    pub home_team: String,
    pub away_team: String,
    pub home_crest: String,
    pub away_crest: String,
    pub kickoff_time: Option<String>,
    pub recommendation: String,
    /// `None` renders the disabled "unavailable" marker instead of a link.
    pub link: Option<String>,
}

impl From<MatchRecord> for MatchCard {
    fn from(record: MatchRecord) -> Self {
        let link = record.analysis_link();
        MatchCard {
            home_team: record.home_team,
            away_team: record.away_team,
            home_crest: record.home_crest,
            away_crest: record.away_crest,
            kickoff_time: record.kickoff_time,
            recommendation: record.recommendation,
            link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePicker {
    value: NaiveDate,
}

impl DatePicker {
    pub fn new(value: NaiveDate) -> Self {
        Self { value }
    }

    pub fn today() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn value(&self) -> NaiveDate {
        self.value
    }

    /// ISO 8601 calendar date, the form the feed endpoint expects.
    pub fn iso(&self) -> String {
        self.value.format("%Y-%m-%d").to_string()
    }

    pub fn set(&mut self, value: NaiveDate) {
        self.value = value;
    }

    pub fn shift_days(&mut self, days: i64) {
        if let Some(next) = self.value.checked_add_signed(ChronoDuration::days(days)) {
            self.value = next;
        }
    }
}

/// The document a renderer draws into: named mount points plus the nodes of the
/// results container.
#[derive(Debug, Clone)]
pub struct Page {
    mounts: HashSet<String>,
    pub date_picker: DatePicker,
    pub nodes: Vec<Node>,
    pub loading_label: Option<String>,
}

impl Page {
    pub fn new(date_picker: DatePicker) -> Self {
        Self {
            mounts: HashSet::new(),
            date_picker,
            nodes: Vec::new(),
            loading_label: None,
        }
    }

    /// The standard analysis page layout with every mount point present.
    pub fn analysis_page(date_picker: DatePicker) -> Self {
        let mut page = Self::new(date_picker);
        page.mount(RESULTS_MOUNT);
        page.mount(DATE_PICKER_MOUNT);
        page.mount(LOADING_TEXT_MOUNT);
        page
    }

    pub fn mount(&mut self, id: &str) {
        self.mounts.insert(id.to_string());
    }

    pub fn has_mount(&self, id: &str) -> bool {
        self.mounts.contains(id)
    }

    pub fn require_mounts(&self, ids: &[&str]) -> Result<()> {
        let missing = ids
            .iter()
            .filter(|id| !self.has_mount(id))
            .copied()
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(anyhow!("missing required mount points: {}", missing.join(", ")))
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn has_loading(&self) -> bool {
        self.nodes.iter().any(|n| matches!(n, Node::Loading))
    }

    pub fn remove_loading(&mut self) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| !matches!(n, Node::Loading));
        before != self.nodes.len()
    }

    /// Swaps the loading placeholder for `node` in place, appending when there is
    /// no placeholder left.
    pub fn replace_loading(&mut self, node: Node) {
        match self.nodes.iter().position(|n| matches!(n, Node::Loading)) {
            Some(idx) => self.nodes[idx] = node,
            None => self.nodes.push(node),
        }
        self.nodes.retain(|n| !matches!(n, Node::Loading));
    }

    pub fn leagues(&self) -> impl Iterator<Item = &LeagueSection> {
        self.nodes.iter().filter_map(|n| match n {
            Node::League(section) => Some(section),
            _ => None,
        })
    }

    pub fn league_mut(&mut self, node_idx: usize) -> Option<&mut LeagueSection> {
        match self.nodes.get_mut(node_idx) {
            Some(Node::League(section)) => Some(section),
            _ => None,
        }
    }

    pub fn card_count(&self) -> usize {
        self.leagues().map(|l| l.cards.len()).sum()
    }

    pub fn count(&self, pred: impl Fn(&Node) -> bool) -> usize {
        self.nodes.iter().filter(|n| pred(*n)).count()
    }

    pub fn toggle_league(&mut self, league_idx: usize) {
        if let Some(section) = self
            .nodes
            .iter_mut()
            .filter_map(|n| match n {
                Node::League(section) => Some(section),
                _ => None,
            })
            .nth(league_idx)
        {
            section.open = !section.open;
        }
    }
}

/// `Serie A` -> `serie-a`; whitespace runs collapse to one dash.
pub fn league_slug(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}
