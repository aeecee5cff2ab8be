//! Jitter and bounded-retry behavior.

use std::sync::Arc;
use std::time::Duration;

use super::fakes::{near, RecordingActuator, SequenceSensor};
use crate::actuator::{random_pause, ClickRetry, Jitter};
use crate::marker::Marker;
use crate::sensor::Point;

fn fast_retry(attempts: u32) -> ClickRetry {
    ClickRetry {
        attempts,
        delay: Duration::ZERO,
        settle: (Duration::ZERO, Duration::ZERO),
    }
}

#[tokio::test(start_paused = true)]
async fn retry_succeeds_when_marker_vanishes() {
    let sensor = SequenceSensor::new(vec![Some(Point::new(100, 100)), None]);
    let actuator = Arc::new(RecordingActuator::new());
    let landed = fast_retry(3)
        .run(
            &sensor,
            actuator.as_ref(),
            &Marker::OkButton.query(),
            (0, 0),
            Jitter::default(),
        )
        .await;

    assert!(landed);
    let clicks = actuator.clicks();
    assert_eq!(clicks.len(), 1);
    assert!(near(clicks[0], Point::new(100, 100)), "got {:?}", clicks[0]);
}

#[tokio::test(start_paused = true)]
async fn retry_succeeds_when_marker_moves_far() {
    let sensor = SequenceSensor::new(vec![
        Some(Point::new(100, 100)),
        Some(Point::new(200, 100)),
    ]);
    let actuator = Arc::new(RecordingActuator::new());
    let landed = fast_retry(3)
        .run(
            &sensor,
            actuator.as_ref(),
            &Marker::OkButton.query(),
            (0, 0),
            Jitter::default(),
        )
        .await;

    assert!(landed);
    assert_eq!(actuator.count(), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_exhausts_attempts_when_marker_barely_moves() {
    // A sub-tolerance move reads as "nothing happened".
    let sensor = SequenceSensor::new(vec![
        Some(Point::new(100, 100)),
        Some(Point::new(120, 100)),
        Some(Point::new(120, 100)),
        Some(Point::new(120, 100)),
    ]);
    let actuator = Arc::new(RecordingActuator::new());
    let landed = fast_retry(2)
        .run(
            &sensor,
            actuator.as_ref(),
            &Marker::OkButton.query(),
            (0, 0),
            Jitter::default(),
        )
        .await;

    assert!(!landed);
    assert_eq!(actuator.count(), 2);
}

#[tokio::test(start_paused = true)]
async fn retry_gives_up_when_marker_never_found() {
    let sensor = SequenceSensor::new(vec![]);
    let actuator = Arc::new(RecordingActuator::new());
    let landed = fast_retry(2)
        .run(
            &sensor,
            actuator.as_ref(),
            &Marker::OkButton.query(),
            (0, 0),
            Jitter::default(),
        )
        .await;

    assert!(!landed);
    assert_eq!(actuator.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn retry_applies_click_offset() {
    let sensor = SequenceSensor::new(vec![Some(Point::new(100, 100)), None]);
    let actuator = Arc::new(RecordingActuator::new());
    fast_retry(1)
        .run(
            &sensor,
            actuator.as_ref(),
            &Marker::OkButton.query(),
            (-30, 0),
            Jitter::default(),
        )
        .await;

    let clicks = actuator.clicks();
    assert_eq!(clicks.len(), 1);
    assert!(near(clicks[0], Point::new(70, 100)), "got {:?}", clicks[0]);
}

#[test]
fn jitter_stays_within_range() {
    let jitter = Jitter::default();
    for _ in 0..200 {
        let point = jitter.apply(Point::new(0, 0));
        assert!(point.x.abs() <= 20, "x jitter out of range: {}", point.x);
        assert!(point.y.abs() <= 20, "y jitter out of range: {}", point.y);
    }
}

#[test]
fn random_pause_respects_bounds() {
    let bounds = (Duration::from_millis(500), Duration::from_millis(1000));
    for _ in 0..100 {
        let pause = random_pause(bounds);
        assert!(pause >= bounds.0 && pause <= bounds.1, "got {pause:?}");
    }
    // Degenerate bounds collapse to the minimum.
    let fixed = (Duration::ZERO, Duration::ZERO);
    assert_eq!(random_pause(fixed), Duration::ZERO);
}
