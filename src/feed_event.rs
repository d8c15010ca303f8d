use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    LeagueStart {
        league_name: String,
        country_flag: Option<String>,
        country_name: Option<String>,
    },
    NoGames,
    Done,
    MatchResult(MatchRecord),
    Unrecognized {
        status: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    pub home_crest: String,
    pub away_crest: String,
    pub kickoff_time: Option<String>,
    pub recommendation: String,
    pub analysis_id: Option<String>,
    pub error: bool,
}

impl MatchRecord {
    /// Detail view path, or `None` when the analysis could not be produced.
    pub fn analysis_link(&self) -> Option<String> {
        if self.error {
            return None;
        }
        self.analysis_id
            .as_deref()
            .and_then(non_empty)
            .and_then(analysis_path)
    }
}

/// `/analysis/<id>` with the id percent-encoded as a single path segment.
fn analysis_path(id: &str) -> Option<String> {
    if matches!(id, "." | "..") {
        return None;
    }
    let mut url = Url::parse("http://localhost/analysis").ok()?;
    url.path_segments_mut().ok()?.push(id);
    Some(url.path().to_string())
}

/// Wire shape of a match record. Ids and names sometimes arrive as numbers.
#[derive(Debug, Deserialize)]
struct MatchPayload {
    #[serde(default, deserialize_with = "lenient_string")]
    mandante_nome: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    visitante_nome: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    mandante_escudo: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    visitante_escudo: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    horario: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    recomendacao: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    analysis_id: Option<String>,
    #[serde(default)]
    error: Value,
}

impl From<MatchPayload> for MatchRecord {
    fn from(raw: MatchPayload) -> Self {
        MatchRecord {
            home_team: raw.mandante_nome.unwrap_or_default(),
            away_team: raw.visitante_nome.unwrap_or_default(),
            home_crest: raw.mandante_escudo.unwrap_or_default(),
            away_crest: raw.visitante_escudo.unwrap_or_default(),
            kickoff_time: raw.horario.filter(|s| !s.trim().is_empty()),
            recommendation: raw.recomendacao.unwrap_or_default(),
            analysis_id: raw.analysis_id,
            error: is_truthy(&raw.error),
        }
    }
}

fn lenient_string<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(as_string))
}

pub fn parse_feed_event(raw: &str) -> Result<FeedEvent> {
    let root: Value = serde_json::from_str(raw.trim()).context("invalid feed event json")?;
    let Value::Object(_) = &root else {
        return Err(anyhow!("feed event is not a json object"));
    };

    // any falsy status ("", 0, false, null) marks a match record
    let status = root.get("status").filter(|v| is_truthy(v)).cloned();
    let Some(status) = status else {
        let payload: MatchPayload =
            serde_json::from_value(root).context("invalid match record")?;
        return Ok(FeedEvent::MatchResult(payload.into()));
    };
    let status = as_string(&status).unwrap_or_else(|| status.to_string());

    let event = match status.as_str() {
        "league_start" => FeedEvent::LeagueStart {
            league_name: pick_string(&root, &["liga_nome"]).unwrap_or_default(),
            country_flag: pick_string(&root, &["pais_flag"]).filter(|s| !s.trim().is_empty()),
            country_name: pick_string(&root, &["pais_nome"]).filter(|s| !s.trim().is_empty()),
        },
        "no_games" => FeedEvent::NoGames,
        "done" => FeedEvent::Done,
        _ => FeedEvent::Unrecognized { status },
    };
    Ok(event)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn pick_string(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(*key) {
            if let Some(s) = as_string(v) {
                return Some(s);
            }
        }
    }
    None
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
