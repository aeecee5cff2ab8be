//! The visual sensor seam: anything that can report whether a marker is
//! currently visible on screen, and where.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::errors::BotError;
use crate::marker::{Marker, MarkerQuery};

/// A screen coordinate, in physical pixels of the primary monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// The per-tick result of one marker lookup. Consumed immediately by the
/// monitor; never persisted.
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub marker: Marker,
    pub found: bool,
    pub location: Option<Point>,
}

/// Reports whether a marker currently appears on screen.
///
/// Implementations are expected to be non-deterministic: confidence
/// thresholds and transient rendering artifacts cause false negatives
/// and positives, which the monitor filters out.
#[async_trait::async_trait]
pub trait ScreenSensor: Send + Sync {
    /// Find the center of the best on-screen match for `query`, or `None`
    /// when nothing scores at or above its threshold.
    async fn locate(&self, query: &MarkerQuery) -> Result<Option<Point>, BotError>;

    /// Like [`locate`](Self::locate), but recognition failures are folded
    /// into a miss. A sensor hiccup is the expected "nothing new" signal,
    /// never a reason to stop polling.
    async fn detect(&self, query: &MarkerQuery) -> Detection {
        let location = match self.locate(query).await {
            Ok(location) => location,
            Err(err) => {
                warn!(marker = %query.marker, %err, "sensor lookup failed, treating as not found");
                None
            }
        };
        Detection {
            marker: query.marker,
            found: location.is_some(),
            location,
        }
    }
}
