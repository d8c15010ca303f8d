mod common;

use matscore_terminal::fake_feed::demo_script;
use matscore_terminal::feed_event::{FeedEvent, parse_feed_event};
use matscore_terminal::page::{Node, league_slug};
use matscore_terminal::state::{AppState, CloseReason, Delta, StreamPhase, apply_delta};

use common::{DONE, LEAGUE_SERIE_A, MATCH_A_B, attached, date};

fn msg(state: &AppState, data: &str) -> Delta {
    Delta::StreamMessage {
        cycle: state.renderer.cycle(),
        data: data.to_string(),
    }
}

#[test]
fn log_deltas_go_to_console_not_page() {
    let (renderer, _rx, _source) = attached("2024-05-01");
    let mut state = AppState::new(renderer);
    let nodes = state.renderer.page().nodes.clone();

    apply_delta(&mut state, Delta::Log("[INFO] hello".to_string()));

    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] hello"));
    assert_eq!(state.renderer.page().nodes, nodes);
}

#[test]
fn console_log_is_bounded() {
    let (renderer, _rx, _source) = attached("2024-05-01");
    let mut state = AppState::new(renderer);
    for i in 0..500 {
        state.push_log(format!("[INFO] line {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.back().map(String::as_str), Some("[INFO] line 499"));
}

#[test]
fn day_navigation_refetches_and_resets_view() {
    let (renderer, _rx, source) = attached("2024-05-01");
    let mut state = AppState::new(renderer);
    let d = msg(&state, LEAGUE_SERIE_A);
    apply_delta(&mut state, d);
    let d = msg(&state, LEAGUE_SERIE_A);
    apply_delta(&mut state, d);
    state.select_next();
    state.scroll = 7;
    assert_eq!(state.selected_league, 1);

    state.shift_day(-1);
    assert_eq!(state.renderer.date(), date("2024-04-30"));
    assert_eq!(state.selected_league, 0);
    assert_eq!(state.scroll, 0);

    state.jump_to(date("2024-12-31"));
    state.shift_day(1);
    assert_eq!(state.renderer.page().date_picker.iso(), "2025-01-01");

    state.refetch();
    let requests = source.requests.borrow();
    let dates = requests.iter().map(|r| r.date.as_str()).collect::<Vec<_>>();
    assert_eq!(
        dates,
        vec!["2024-05-01", "2024-04-30", "2024-12-31", "2025-01-01", "2025-01-01"]
    );
    assert!(requests[..4].iter().all(|r| r.cancel.is_cancelled()));
    assert!(!requests[4].cancel.is_cancelled());
}

#[test]
fn selection_clamps_and_toggles_leagues() {
    let (renderer, _rx, _source) = attached("2024-05-01");
    let mut state = AppState::new(renderer);

    state.select_next();
    assert_eq!(state.selected_league, 0);

    let d = msg(&state, LEAGUE_SERIE_A);
    apply_delta(&mut state, d);
    let d = msg(&state, MATCH_A_B);
    apply_delta(&mut state, d);
    let d = msg(&state, DONE);
    apply_delta(&mut state, d);

    state.select_next();
    assert_eq!(state.selected_league, 0);
    state.toggle_selected_league();
    let league = state.renderer.page().leagues().next().expect("league");
    assert!(!league.open);
    assert_eq!(league.cards.len(), 1);
    assert_eq!(
        state.renderer.phase(),
        &StreamPhase::Closed(CloseReason::Completed)
    );
}

#[test]
fn stale_cycle_deltas_never_reach_new_page() {
    let (renderer, _rx, _source) = attached("2024-05-01");
    let mut state = AppState::new(renderer);
    let old = state.renderer.cycle();

    state.shift_day(1);
    apply_delta(
        &mut state,
        Delta::StreamMessage {
            cycle: old,
            data: LEAGUE_SERIE_A.to_string(),
        },
    );
    apply_delta(&mut state, Delta::StreamEnded { cycle: old });

    assert_eq!(state.renderer.page().leagues().count(), 0);
    assert!(state.renderer.page().has_loading());
    assert_eq!(state.renderer.phase(), &StreamPhase::Connecting);
}

#[test]
fn demo_script_is_well_formed_and_stable_per_date() {
    let first = demo_script("2024-05-01");
    assert_eq!(first, demo_script("2024-05-01"));

    let events = first
        .iter()
        .map(|v| parse_feed_event(&v.to_string()).expect("demo payload parses"))
        .collect::<Vec<_>>();
    assert!(matches!(events.first(), Some(FeedEvent::LeagueStart { .. })));
    assert_eq!(events.last(), Some(&FeedEvent::Done));
    assert_eq!(
        events.iter().filter(|e| matches!(e, FeedEvent::Done)).count(),
        1
    );

    let match_count = events
        .iter()
        .filter(|e| matches!(e, FeedEvent::MatchResult(_)))
        .count();
    let no_games = events.iter().any(|e| matches!(e, FeedEvent::NoGames));
    assert_eq!(no_games, match_count == 0);
}

#[test]
fn league_slug_collapses_whitespace() {
    assert_eq!(league_slug("Serie A"), "serie-a");
    assert_eq!(league_slug("  La \t Liga "), "la-liga");
    assert_eq!(league_slug("UEFA Champions League"), "uefa-champions-league");
}

#[test]
fn heading_tracks_selected_date() {
    let (renderer, _rx, _source) = attached("2024-02-28");
    let mut state = AppState::new(renderer);
    state.shift_day(1);
    state.shift_day(1);
    assert_eq!(
        state.renderer.page().nodes.first(),
        Some(&Node::Heading("Analyses for 2024-03-01".to_string()))
    );
}
