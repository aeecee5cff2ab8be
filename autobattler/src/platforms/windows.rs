//! Windows click synthesis through the UI Automation input stack.

use tokio::task;
use uiautomation::inputs::Mouse;

use crate::actuator::Actuator;
use crate::errors::BotError;
use crate::sensor::Point;

/// Sends real cursor clicks at absolute screen coordinates.
#[derive(Default)]
pub struct MouseActuator;

impl MouseActuator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Actuator for MouseActuator {
    async fn click(&self, point: Point) -> Result<(), BotError> {
        let (x, y) = (point.x, point.y);
        task::spawn_blocking(move || {
            let mouse = Mouse::default();
            mouse
                .click(uiautomation::types::Point::new(x, y))
                .map_err(|err| err.to_string())
        })
        .await
        .map_err(|err| BotError::ActuatorFailure(format!("input task failed: {err}")))?
        .map_err(BotError::ActuatorFailure)
    }
}
