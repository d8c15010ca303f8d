use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::state::Delta;
use crate::stream::{FeedSource, StreamRequest};

const DEMO_LEAGUES: [(&str, &str, &[(&str, &str)]); 4] = [
    (
        "Premier League",
        "England",
        &[
            ("Arsenal", "Chelsea"),
            ("Liverpool", "Manchester City"),
            ("Tottenham", "Newcastle"),
        ],
    ),
    (
        "Serie A",
        "Italy",
        &[("Inter", "Milan"), ("Juventus", "Napoli")],
    ),
    (
        "La Liga",
        "Spain",
        &[("Real Madrid", "Barcelona"), ("Sevilla", "Valencia")],
    ),
    (
        "Brasileirão Série A",
        "Brazil",
        &[
            ("Flamengo", "Palmeiras"),
            ("Corinthians", "São Paulo"),
            ("Grêmio", "Internacional"),
        ],
    ),
];

const DEMO_MARKETS: [&str; 5] = [
    "Over 2.5 goals",
    "Both teams to score",
    "Home win",
    "Draw no bet: away",
    "Under 3.5 goals",
];

/// Offline stand-in for the analysis server. Each date yields the same script,
/// paced by `delay` between events.
pub struct DemoSource {
    delay: Duration,
}

impl DemoSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl FeedSource for DemoSource {
    fn open(&self, request: StreamRequest) -> Result<()> {
        let delay = self.delay;
        thread::spawn(move || {
            let cycle = request.cycle;
            if !request.emit(Delta::StreamOpened { cycle }) {
                return;
            }
            for payload in demo_script(&request.date) {
                thread::sleep(delay);
                let sent = request.emit(Delta::StreamMessage {
                    cycle,
                    data: payload.to_string(),
                });
                if !sent {
                    return;
                }
            }
            let _ = request.emit(Delta::Log(format!("[INFO] Demo feed for {} finished", request.date)));
        });
        Ok(())
    }

    fn describe(&self) -> String {
        "demo feed".to_string()
    }
}

/// The event payloads the demo server would send for `date`, ending in `done`.
pub fn demo_script(date: &str) -> Vec<Value> {
    let mut rng = StdRng::seed_from_u64(date_seed(date));
    let mut events = Vec::new();
    let mut games_total = 0usize;
    let mut analysis_id = 1000 + rng.gen_range(0..9000u32);

    for (league, country, fixtures) in DEMO_LEAGUES {
        events.push(json!({
            "status": "league_start",
            "liga_nome": league,
            "pais_nome": country,
            "pais_flag": format!("https://flags.example/{}.svg", country.to_lowercase()),
        }));

        let count = rng.gen_range(0..=fixtures.len());
        for (home, away) in fixtures.iter().take(count) {
            games_total += 1;
            analysis_id += 1;
            let hour = rng.gen_range(12..=22);
            let minute = [0, 15, 30, 45][rng.gen_range(0..4)];
            if rng.gen_bool(0.1) {
                events.push(json!({
                    "mandante_nome": home,
                    "visitante_nome": away,
                    "mandante_escudo": crest_url(home),
                    "visitante_escudo": crest_url(away),
                    "horario": format!("{hour:02}:{minute:02}"),
                    "recomendacao": "Analysis failed",
                    "error": true,
                }));
                continue;
            }
            events.push(json!({
                "mandante_nome": home,
                "visitante_nome": away,
                "mandante_escudo": crest_url(home),
                "visitante_escudo": crest_url(away),
                "horario": format!("{hour:02}:{minute:02}"),
                "recomendacao": DEMO_MARKETS[rng.gen_range(0..DEMO_MARKETS.len())],
                "analysis_id": analysis_id,
            }));
        }
    }

    if games_total == 0 {
        events.push(json!({ "status": "no_games" }));
    }
    events.push(json!({ "status": "done" }));
    events
}

fn crest_url(team: &str) -> String {
    let slug = team
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase();
    format!("https://crests.example/{slug}.png")
}

fn date_seed(date: &str) -> u64 {
    date.bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
        })
}
