//! Statistics accumulation and the duration humanizer.

use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::stats::{format_duration, RunStats};

#[test]
fn format_duration_covers_the_grammar() {
    let cases = [
        (0, "0 seconds"),
        (1, "1 second"),
        (59, "59 seconds"),
        (61, "1 minute, 1 second"),
        (3_700, "1 hour, 1 minute, 40 seconds"),
        (90_061, "1 day, 1 hour, 1 minute, 1 second"),
        (172_800, "2 days, 0 seconds"),
    ];
    for (secs, expected) in cases {
        assert_eq!(format_duration(Duration::from_secs(secs)), expected);
    }
}

#[tokio::test(start_paused = true)]
async fn report_aggregates_over_the_run() {
    let mut stats = RunStats::new(Instant::now());
    stats.record_find(Duration::from_secs(2));
    stats.record_find(Duration::from_secs(4));
    for _ in 0..8 {
        stats.record_card();
    }
    stats.record_completion(Duration::from_secs(50));
    stats.record_completion(Duration::from_secs(150));

    sleep(Duration::from_secs(3_600)).await;
    let report = stats.report(Instant::now());

    assert_eq!(report.games_completed, 2);
    assert!((report.avg_find_secs - 3.0).abs() < 1e-9);
    assert!((report.avg_battle_secs - 100.0).abs() < 1e-9);
    assert!((report.avg_cards_per_game - 4.0).abs() < 1e-9);
    assert!((report.games_per_hour - 2.0).abs() < 1e-9);
    assert!((report.games_per_day - 48.0).abs() < 1e-9);
    assert!((report.games_per_week - 336.0).abs() < 1e-9);
    assert!((report.games_per_month - 1_440.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn report_is_zero_safe_before_any_game() {
    let stats = RunStats::new(Instant::now());
    let report = stats.report(Instant::now());

    assert_eq!(report.games_completed, 0);
    assert_eq!(report.avg_find_secs, 0.0);
    assert_eq!(report.avg_battle_secs, 0.0);
    assert_eq!(report.avg_cards_per_game, 0.0);
    assert_eq!(report.games_per_hour, 0.0);
}

#[tokio::test(start_paused = true)]
async fn durations_track_completions_one_to_one() {
    let mut stats = RunStats::new(Instant::now());
    for fought in [10u64, 20, 30] {
        stats.record_completion(Duration::from_secs(fought));
    }
    assert_eq!(
        stats.battle_durations().len() as u64,
        stats.games_completed()
    );
}
