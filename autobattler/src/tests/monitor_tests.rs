//! Branch-level behavior of the monitoring state machine: stability
//! windows, debounce rules, suppression and priority ordering.

use std::sync::Arc;
use std::time::Duration;

use super::fakes::{
    empty, frame, near, quick_config, run_ticks, FailingSensor, RecordingActuator, ScriptedSensor,
};
use crate::marker::Marker;
use crate::monitor::Monitor;
use crate::sensor::Point;
use crate::state::{GameMode, GameState};

fn at(secs: f64) -> Duration {
    Duration::from_secs_f64(secs)
}

#[tokio::test(start_paused = true)]
async fn single_missed_frame_does_not_end_battle() {
    let battle = Point::new(500, 500);
    let sensor = Arc::new(ScriptedSensor::new(vec![
        (at(0.0), frame(&[(Marker::InBattle, battle)])),
        (at(0.05), empty()),
        (at(0.15), frame(&[(Marker::InBattle, battle)])),
    ]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );

    run_ticks(&mut monitor, 2).await;
    assert_eq!(monitor.state(), GameState::InBattle);
    assert!(monitor.timers().battle_signal_lost_at.is_some());

    run_ticks(&mut monitor, 1).await;
    assert_eq!(monitor.state(), GameState::InBattle);
    assert!(monitor.timers().battle_signal_lost_at.is_none());
    assert_eq!(monitor.stats().games_completed(), 0);
}

#[tokio::test(start_paused = true)]
async fn battle_ends_only_after_stability_window() {
    let sensor = Arc::new(ScriptedSensor::new(vec![
        (at(0.0), frame(&[(Marker::InBattle, Point::new(500, 500))])),
        (at(0.05), empty()),
    ]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );

    // Detection disappears at the second tick; just under five seconds
    // of absence must not end the battle.
    run_ticks(&mut monitor, 51).await;
    assert_eq!(monitor.state(), GameState::InBattle);

    run_ticks(&mut monitor, 1).await;
    assert_eq!(monitor.state(), GameState::BattleEndedWaitingForResults);
    assert_eq!(monitor.stats().games_completed(), 0);
    assert!(monitor.stats().battle_durations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn battle_button_click_is_debounced() {
    let button = Point::new(400, 800);
    let sensor = Arc::new(ScriptedSensor::new(vec![
        (at(0.0), frame(&[(Marker::BattleButton, button)])),
        (at(0.05), empty()),
        (at(3.95), frame(&[(Marker::BattleButton, button)])),
    ]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut config = quick_config();
    // A real pause after the launch click so the button has vanished by
    // the success re-check and the click registers as landed.
    config.launch_pause = Duration::from_millis(100);
    let mut monitor = Monitor::with_config(sensor, actuator.clone(), GameMode::OneVsOne, config);

    // First sighting launches; the button reappears 3.9s after the
    // successful click and stays visible, but the debounce holds.
    run_ticks(&mut monitor, 41).await;
    assert_eq!(actuator.count(), 1);

    // Once five seconds have passed since the click, it fires again.
    run_ticks(&mut monitor, 10).await;
    assert_eq!(actuator.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn battle_button_ignored_while_unknown_is_fresh() {
    // A battle runs and ends unseen; the screen drops to unknown and the
    // battle button shows up on what could be a transition frame. The
    // grace period holds the click back for three seconds.
    let button = Point::new(400, 800);
    let sensor = Arc::new(ScriptedSensor::new(vec![
        (at(0.0), frame(&[(Marker::InBattle, Point::new(500, 500))])),
        (at(0.05), empty()),
        (at(5.25), frame(&[(Marker::BattleButton, button)])),
    ]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );

    // Cards at tick zero, then the stability window, then unknown at
    // 5.2s; the button is visible from 5.25s but stays suppressed.
    run_ticks(&mut monitor, 82).await;
    assert_eq!(actuator.count(), 2, "grace period should suppress clicks");
    assert_eq!(monitor.state(), GameState::Unknown);

    run_ticks(&mut monitor, 1).await;
    assert_eq!(actuator.count(), 3);
    assert_eq!(monitor.state(), GameState::NotInBattle);
}

#[tokio::test(start_paused = true)]
async fn ok_button_wins_over_battle_button() {
    let sensor = Arc::new(ScriptedSensor::new(vec![(
        at(0.0),
        frame(&[
            (Marker::OkButton, Point::new(800, 600)),
            (Marker::BattleButton, Point::new(400, 800)),
        ]),
    )]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );

    run_ticks(&mut monitor, 1).await;

    // Exactly one branch acted: the OK completion, not the launch.
    let clicks = actuator.clicks();
    assert_eq!(clicks.len(), 1);
    assert!(near(clicks[0], Point::new(770, 600)), "got {:?}", clicks[0]);
    assert_eq!(monitor.stats().games_completed(), 1);
    assert_eq!(monitor.state(), GameState::ReturningToMenu);
    assert!(monitor.timers().last_battle_click.is_none());
}

#[tokio::test(start_paused = true)]
async fn sensor_errors_are_treated_as_misses() {
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        Arc::new(FailingSensor),
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );

    run_ticks(&mut monitor, 5).await;
    assert_eq!(monitor.state(), GameState::Unknown);
    assert_eq!(monitor.stats().games_completed(), 0);
    assert_eq!(actuator.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn stale_completion_state_demotes_to_unknown() {
    let sensor = Arc::new(ScriptedSensor::new(vec![(at(0.0), empty())]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );
    monitor.force_state(GameState::BattleComplete1v1);

    run_ticks(&mut monitor, 51).await;
    assert_eq!(monitor.state(), GameState::BattleComplete1v1);

    run_ticks(&mut monitor, 1).await;
    assert_eq!(monitor.state(), GameState::Unknown);
}

#[tokio::test(start_paused = true)]
async fn battle_button_ignored_right_after_completion() {
    let sensor = Arc::new(ScriptedSensor::new(vec![(
        at(0.0),
        frame(&[(Marker::BattleButton, Point::new(400, 800))]),
    )]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );
    monitor.force_state(GameState::BattleComplete1v1);

    run_ticks(&mut monitor, 3).await;
    assert_eq!(actuator.count(), 0);
    assert_eq!(monitor.state(), GameState::BattleComplete1v1);
}

#[tokio::test(start_paused = true)]
async fn play_again_click_repeats_even_when_already_complete() {
    let sensor = Arc::new(ScriptedSensor::new(vec![
        (at(0.0), frame(&[(Marker::PlayAgain, Point::new(640, 1000))])),
        (at(0.05), empty()),
    ]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::TrophyRoad,
        quick_config(),
    );
    monitor.force_state(GameState::BattleComplete1v1TrophyRoad);

    run_ticks(&mut monitor, 1).await;
    // No double bookkeeping, but the click still goes out.
    assert_eq!(monitor.stats().games_completed(), 0);
    assert_eq!(actuator.count(), 1);
    assert_eq!(monitor.state(), GameState::ReturningToMenu);
}

#[tokio::test(start_paused = true)]
async fn duo_end_is_one_shot_when_already_complete() {
    let sensor = Arc::new(ScriptedSensor::new(vec![(
        at(0.0),
        frame(&[(Marker::TwoVsTwoEnd, Point::new(640, 900))]),
    )]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::TwoVsTwo,
        quick_config(),
    );
    monitor.force_state(GameState::BattleComplete2v2);

    run_ticks(&mut monitor, 2).await;
    assert_eq!(actuator.count(), 0);
    assert_eq!(monitor.stats().games_completed(), 0);
    assert_eq!(monitor.state(), GameState::BattleComplete2v2);
}

#[tokio::test(start_paused = true)]
async fn mode_specific_markers_are_ignored_in_other_modes() {
    let sensor = Arc::new(ScriptedSensor::new(vec![(
        at(0.0),
        frame(&[
            (Marker::TwoVsTwoEnd, Point::new(640, 900)),
            (Marker::PlayAgain, Point::new(640, 1000)),
        ]),
    )]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );

    run_ticks(&mut monitor, 3).await;
    assert_eq!(actuator.count(), 0);
    assert_eq!(monitor.stats().games_completed(), 0);
    assert_eq!(monitor.state(), GameState::Unknown);
}

#[tokio::test(start_paused = true)]
async fn periodic_reports_fire() {
    let start = tokio::time::Instant::now();
    let sensor = Arc::new(ScriptedSensor::new(vec![(at(0.0), empty())]));
    let actuator = Arc::new(RecordingActuator::new());
    let mut monitor = Monitor::with_config(
        sensor,
        actuator.clone(),
        GameMode::OneVsOne,
        quick_config(),
    );

    run_ticks(&mut monitor, 401).await;
    assert!(monitor.timers().last_heartbeat > start);
    assert!(monitor.timers().last_stats_report > start);
}
