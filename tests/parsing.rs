use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use matscore_terminal::feed_event::{FeedEvent, MatchRecord, parse_feed_event};
use matscore_terminal::sse::{SseDecoder, read_messages};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_events(name: &str) -> Vec<FeedEvent> {
    let raw = read_fixture(name);
    let mut events = Vec::new();
    read_messages(Cursor::new(raw), |msg| {
        events.push(parse_feed_event(&msg.data).expect("fixture payload should parse"));
        true
    })
    .expect("fixture stream should read");
    events
}

#[test]
fn parses_feed_fixture() {
    let events = fixture_events("feed_2024-05-01.sse");
    assert_eq!(events.len(), 6);

    let FeedEvent::LeagueStart {
        league_name,
        country_flag,
        country_name,
    } = &events[0]
    else {
        panic!("expected league_start, got {:?}", events[0]);
    };
    assert_eq!(league_name, "Brasileirão Série A");
    assert_eq!(country_name.as_deref(), Some("Brazil"));
    assert_eq!(
        country_flag.as_deref(),
        Some("https://media.example/flags/br.svg")
    );

    let FeedEvent::MatchResult(first) = &events[1] else {
        panic!("expected match, got {:?}", events[1]);
    };
    assert_eq!(first.home_team, "Flamengo");
    assert_eq!(first.kickoff_time.as_deref(), Some("16:00"));
    assert_eq!(first.analysis_id.as_deref(), Some("311"));
    assert_eq!(first.analysis_link().as_deref(), Some("/analysis/311"));

    let FeedEvent::MatchResult(failed) = &events[2] else {
        panic!("expected match, got {:?}", events[2]);
    };
    assert!(failed.error);
    assert!(failed.analysis_link().is_none());

    let FeedEvent::MatchResult(multiline) = &events[4] else {
        panic!("expected match, got {:?}", events[4]);
    };
    assert_eq!(multiline.away_team, "Chelsea");
    assert_eq!(multiline.analysis_link().as_deref(), Some("/analysis/312"));

    assert_eq!(events[5], FeedEvent::Done);
}

#[test]
fn status_values_map_to_events() {
    assert_eq!(
        parse_feed_event(r#"{"status":"no_games"}"#).unwrap(),
        FeedEvent::NoGames
    );
    assert_eq!(
        parse_feed_event(r#"{"status":"done"}"#).unwrap(),
        FeedEvent::Done
    );
    assert_eq!(
        parse_feed_event(r#"{"status":"heartbeat"}"#).unwrap(),
        FeedEvent::Unrecognized {
            status: "heartbeat".to_string()
        }
    );
}

#[test]
fn blank_flag_and_country_are_absent() {
    let event =
        parse_feed_event(r#"{"status":"league_start","liga_nome":"Ligue 1","pais_flag":""}"#)
            .unwrap();
    assert_eq!(
        event,
        FeedEvent::LeagueStart {
            league_name: "Ligue 1".to_string(),
            country_flag: None,
            country_name: None,
        }
    );
}

#[test]
fn match_record_without_optional_fields() {
    let FeedEvent::MatchResult(record) =
        parse_feed_event(r#"{"mandante_nome":"A","visitante_nome":"B","recomendacao":"Draw"}"#)
            .unwrap()
    else {
        panic!("record without status should be a match");
    };
    assert_eq!(record.home_crest, "");
    assert!(record.kickoff_time.is_none());
    assert!(!record.error);
    assert!(record.analysis_link().is_none());
}

#[test]
fn malformed_payloads_are_errors() {
    assert!(parse_feed_event("{oops").is_err());
    assert!(parse_feed_event("\"done\"").is_err());
    assert!(parse_feed_event("").is_err());
}

#[test]
fn decoder_ignores_comments_and_handles_crlf_and_bom() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.push_line("\u{feff}: keepalive").is_none());
    assert!(decoder.push_line("data:{\"status\":\"done\"}\r").is_none());
    let msg = decoder.push_line("\r").expect("blank line dispatches");
    assert_eq!(msg.data, r#"{"status":"done"}"#);
    assert!(msg.event.is_none());
}

#[test]
fn decoder_skips_events_without_data() {
    let mut decoder = SseDecoder::new();
    assert!(decoder.push_line("event: ping").is_none());
    assert!(decoder.push_line("").is_none());
    assert!(decoder.push_line("data: x").is_none());
    let msg = decoder.push_line("").expect("data event dispatches");
    assert_eq!(msg.data, "x");
    assert!(msg.event.is_none());
}

#[test]
fn reader_stops_when_callback_declines() {
    let raw = "data: 1\n\ndata: 2\n\ndata: 3\n\n";
    let mut seen = Vec::new();
    let stopped = read_messages(Cursor::new(raw), |msg| {
        seen.push(msg.data);
        seen.len() < 2
    })
    .unwrap();
    assert!(stopped);
    assert_eq!(seen, vec!["1", "2"]);
}

#[test]
fn reader_drops_unterminated_trailing_event() {
    let raw = "data: 1\n\ndata: 2";
    let mut seen = Vec::new();
    let stopped = read_messages(Cursor::new(raw), |msg| {
        seen.push(msg.data);
        true
    })
    .unwrap();
    assert!(!stopped);
    assert_eq!(seen, vec!["1"]);
}

#[test]
fn invalid_utf8_is_replaced_and_stream_continues() {
    let mut raw = b"data: {\"status\":\"league_start\",\"liga_nome\":\"S".to_vec();
    raw.push(0xff);
    raw.extend_from_slice(b"A\"}\n\ndata: {\"status\":\"done\"}\n\n");

    let mut seen = Vec::new();
    let stopped = read_messages(Cursor::new(raw), |msg| {
        seen.push(msg.data);
        true
    })
    .expect("bad bytes must not fail the stream");

    assert!(!stopped);
    assert_eq!(seen.len(), 2);
    assert_eq!(
        parse_feed_event(&seen[0]).unwrap(),
        FeedEvent::LeagueStart {
            league_name: "S\u{fffd}A".to_string(),
            country_flag: None,
            country_name: None,
        }
    );
    assert_eq!(parse_feed_event(&seen[1]).unwrap(), FeedEvent::Done);
}

#[test]
fn byte_chunks_split_anywhere() {
    let raw = "data: {\"status\":\"no_games\"}\r\n\r\n: ping\ndata: é\n\n".as_bytes();
    let mut decoder = SseDecoder::new();
    let mut seen = Vec::new();
    for chunk in raw.chunks(3) {
        seen.extend(decoder.push_bytes(chunk).into_iter().map(|m| m.data));
    }
    assert_eq!(seen, vec![r#"{"status":"no_games"}"#, "é"]);
}

#[test]
fn falsy_status_is_a_match_record() {
    for raw in [
        r#"{"status":"","mandante_nome":"A","visitante_nome":"B"}"#,
        r#"{"status":false,"mandante_nome":"A","visitante_nome":"B"}"#,
        r#"{"status":0,"mandante_nome":"A","visitante_nome":"B"}"#,
        r#"{"status":null,"mandante_nome":"A","visitante_nome":"B"}"#,
    ] {
        let FeedEvent::MatchResult(record) = parse_feed_event(raw).unwrap() else {
            panic!("{raw} should be a match record");
        };
        assert_eq!(record.home_team, "A");
        assert_eq!(record.away_team, "B");
    }
    assert_eq!(
        parse_feed_event(r#"{"status":1}"#).unwrap(),
        FeedEvent::Unrecognized {
            status: "1".to_string()
        }
    );
}

#[test]
fn numeric_fields_are_read_as_text() {
    let FeedEvent::MatchResult(record) =
        parse_feed_event(r#"{"mandante_nome":"A","visitante_nome":"B","analysis_id":77,"error":0}"#)
            .unwrap()
    else {
        panic!("expected match");
    };
    assert_eq!(record.analysis_id.as_deref(), Some("77"));
    assert!(!record.error);
    assert_eq!(record.analysis_link().as_deref(), Some("/analysis/77"));
}

#[test]
fn analysis_id_is_encoded_as_one_path_segment() {
    let record = |id: &str| MatchRecord {
        analysis_id: Some(id.to_string()),
        ..MatchRecord::default()
    };

    let link = record("a/../b?x=1#top").analysis_link().expect("link");
    assert_eq!(link, "/analysis/a%2F..%2Fb%3Fx=1%23top");
    assert_eq!(record("..").analysis_link(), None);
    assert_eq!(record(".").analysis_link(), None);
    assert_eq!(
        record("abc 1").analysis_link().as_deref(),
        Some("/analysis/abc%201")
    );
}
