//! The click actuator seam, plus the jitter and bounded-retry helpers
//! every click in the system goes through.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::errors::BotError;
use crate::marker::MarkerQuery;
use crate::sensor::{Point, ScreenSensor};

/// Performs a simulated click at a screen coordinate.
#[async_trait::async_trait]
pub trait Actuator: Send + Sync {
    async fn click(&self, point: Point) -> Result<(), BotError>;
}

/// Random positional offset applied to every click so the input stream
/// never repeats exact coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    pub x: i32,
    pub y: i32,
}

impl Default for Jitter {
    fn default() -> Self {
        Self { x: 20, y: 20 }
    }
}

impl Jitter {
    /// Displace `point` by a uniform random offset within `±x` / `±y`.
    pub fn apply(self, point: Point) -> Point {
        let mut rng = rand::thread_rng();
        Point {
            x: point.x + rng.gen_range(-self.x..=self.x),
            y: point.y + rng.gen_range(-self.y..=self.y),
        }
    }
}

/// Click `point` with jitter applied.
pub async fn click_jittered(
    actuator: &dyn Actuator,
    point: Point,
    jitter: Jitter,
) -> Result<(), BotError> {
    actuator.click(jitter.apply(point)).await
}

/// Success heuristic for [`ClickRetry`]: the marker is gone, or it moved
/// more than `tolerance` pixels on either axis (the screen changed under
/// the click, so it probably landed).
pub fn moved_or_vanished(tolerance: i32) -> impl Fn(Point, Option<Point>) -> bool {
    move |before, after| match after {
        None => true,
        Some(now) => (now.x - before.x).abs() > tolerance || (now.y - before.y).abs() > tolerance,
    }
}

/// Bounded find-click-recheck loop.
///
/// Each attempt locates the marker, clicks it (jittered, optionally
/// offset), waits a short randomized settle pause plus the inter-attempt
/// delay, and re-checks the marker against a "did it work" predicate.
/// Exhausting the attempts is an outcome, not an error: the caller gets
/// `false` and the polling loop moves on.
#[derive(Debug, Clone, Copy)]
pub struct ClickRetry {
    pub attempts: u32,
    pub delay: Duration,
    /// Min/max bounds of the randomized pause right after a click.
    pub settle: (Duration, Duration),
}

impl Default for ClickRetry {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_secs(1),
            settle: (Duration::from_millis(500), Duration::from_millis(1000)),
        }
    }
}

impl ClickRetry {
    pub async fn run(
        &self,
        sensor: &dyn ScreenSensor,
        actuator: &dyn Actuator,
        query: &MarkerQuery,
        offset: (i32, i32),
        jitter: Jitter,
    ) -> bool {
        self.run_with(sensor, actuator, query, offset, jitter, moved_or_vanished(50))
            .await
    }

    pub async fn run_with<F>(
        &self,
        sensor: &dyn ScreenSensor,
        actuator: &dyn Actuator,
        query: &MarkerQuery,
        offset: (i32, i32),
        jitter: Jitter,
        landed: F,
    ) -> bool
    where
        F: Fn(Point, Option<Point>) -> bool + Send,
    {
        for attempt in 1..=self.attempts {
            let Some(before) = sensor.detect(query).await.location else {
                debug!(
                    marker = %query.marker,
                    attempt,
                    attempts = self.attempts,
                    "marker not found, retrying"
                );
                sleep(self.delay).await;
                continue;
            };

            debug!(
                marker = %query.marker,
                attempt,
                attempts = self.attempts,
                x = before.x,
                y = before.y,
                "clicking marker"
            );
            if let Err(err) =
                click_jittered(actuator, before.offset(offset.0, offset.1), jitter).await
            {
                warn!(marker = %query.marker, %err, "click dispatch failed");
            }

            sleep(random_pause(self.settle)).await;
            sleep(self.delay).await;

            let after = sensor.detect(query).await.location;
            if landed(before, after) {
                debug!(marker = %query.marker, "click appears to have landed");
                return true;
            }
        }

        warn!(
            marker = %query.marker,
            attempts = self.attempts,
            "click did not land after all attempts, moving on"
        );
        false
    }
}

/// Uniform random duration within `[min, max]`, at millisecond grain.
pub fn random_pause((min, max): (Duration, Duration)) -> Duration {
    let lo = min.as_millis() as u64;
    let hi = max.as_millis() as u64;
    if hi <= lo {
        return min;
    }
    let millis = rand::thread_rng().gen_range(lo..=hi);
    Duration::from_millis(millis)
}
