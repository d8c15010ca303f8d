use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;

use crate::fake_feed::DemoSource;
use crate::stream::{FeedSource, LiveSource};

const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/api/analise";
const APP_DIR: &str = "matscore_terminal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Live,
    Demo,
}

#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub api_url: String,
    pub source: SourceKind,
    pub initial_date: Option<NaiveDate>,
    pub connect_timeout: Duration,
    pub demo_delay: Duration,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl FeedConfig {
    /// Reads `FEED_*` variables; call after `.env` files are loaded.
    pub fn from_env() -> Self {
        let api_url = env::var("FEED_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let source = match env::var("FEED_SOURCE")
            .unwrap_or_else(|_| "live".to_string())
            .to_lowercase()
            .as_str()
        {
            "demo" | "fake" => SourceKind::Demo,
            _ => SourceKind::Live,
        };
        let initial_date = opt_date_env("FEED_DATE");
        let connect_timeout = Duration::from_secs(
            env::var("FEED_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(10)
                .clamp(1, 120),
        );
        let demo_delay = Duration::from_millis(
            env::var("FEED_DEMO_DELAY_MS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(250)
                .min(5000),
        );
        let export_dir = env::var("FEED_EXPORT_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let log_dir = env::var("FEED_LOG_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_log_dir);

        Self {
            api_url,
            source,
            initial_date,
            connect_timeout,
            demo_delay,
            export_dir,
            log_dir,
        }
    }

    pub fn build_source(&self) -> Box<dyn FeedSource> {
        match self.source {
            SourceKind::Live => Box::new(LiveSource::new(&self.api_url, self.connect_timeout)),
            SourceKind::Demo => Box::new(DemoSource::new(self.demo_delay)),
        }
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn opt_date_env(key: &str) -> Option<NaiveDate> {
    env::var(key).ok().as_deref().and_then(parse_date)
}

fn default_log_dir() -> PathBuf {
    if let Ok(base) = env::var("XDG_STATE_HOME") {
        if !base.trim().is_empty() {
            return PathBuf::from(base).join(APP_DIR);
        }
    }
    match env::var("HOME") {
        Ok(home) if !home.trim().is_empty() => PathBuf::from(home)
            .join(".local")
            .join("state")
            .join(APP_DIR),
        _ => PathBuf::from("logs"),
    }
}
