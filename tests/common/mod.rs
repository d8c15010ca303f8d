#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{self, Receiver};

use anyhow::{Result, anyhow};
use chrono::NaiveDate;

use matscore_terminal::page::{DatePicker, Page};
use matscore_terminal::renderer::StreamRenderer;
use matscore_terminal::state::Delta;
use matscore_terminal::stream::{FeedSource, StreamRequest};

/// Records every request instead of connecting anywhere; tests feed deltas by hand.
#[derive(Clone, Default)]
pub struct RecordingSource {
    pub requests: Rc<RefCell<Vec<StreamRequest>>>,
    pub fail_open: bool,
}

impl FeedSource for RecordingSource {
    fn open(&self, request: StreamRequest) -> Result<()> {
        self.requests.borrow_mut().push(request);
        if self.fail_open {
            return Err(anyhow!("invalid feed url"));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "recording".to_string()
    }
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").expect("valid test date")
}

pub fn attached(raw_date: &str) -> (StreamRenderer, Receiver<Delta>, RecordingSource) {
    let source = RecordingSource::default();
    let (tx, rx) = mpsc::channel();
    let renderer = StreamRenderer::attach(
        Page::analysis_page(DatePicker::new(date(raw_date))),
        Box::new(source.clone()),
        tx,
    )
    .expect("renderer should attach");
    (renderer, rx, source)
}

pub fn message(renderer: &mut StreamRenderer, data: &str) -> bool {
    let cycle = renderer.cycle();
    renderer.handle_delta(Delta::StreamMessage {
        cycle,
        data: data.to_string(),
    })
}

pub fn drain_logs(rx: &Receiver<Delta>) -> Vec<String> {
    rx.try_iter()
        .filter_map(|delta| match delta {
            Delta::Log(msg) => Some(msg),
            _ => None,
        })
        .collect()
}

pub const LEAGUE_SERIE_A: &str = r#"{"status":"league_start","liga_nome":"Serie A"}"#;
pub const MATCH_A_B: &str = r#"{"mandante_nome":"A","visitante_nome":"B","mandante_escudo":"https://img/a.png","visitante_escudo":"https://img/b.png","analysis_id":"42","recomendacao":"Over 2.5"}"#;
pub const DONE: &str = r#"{"status":"done"}"#;
