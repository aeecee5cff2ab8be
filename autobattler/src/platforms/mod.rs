//! Platform backends for the sensor and actuator seams. The template
//! sensor is portable; synthesizing clicks is platform specific.

use std::sync::Arc;

use crate::actuator::Actuator;
use crate::errors::BotError;
use crate::marker::AssetCatalog;
use crate::sensor::ScreenSensor;

pub mod capture;
#[cfg(target_os = "windows")]
pub mod windows;

pub use capture::TemplateSensor;

/// Create the sensor/actuator pair for the current platform.
pub fn create_backend(
    catalog: &AssetCatalog,
) -> Result<(Arc<dyn ScreenSensor>, Arc<dyn Actuator>), BotError> {
    #[cfg(target_os = "windows")]
    {
        let sensor = Arc::new(TemplateSensor::load(catalog)?);
        let actuator = Arc::new(windows::MouseActuator::new());
        Ok((sensor, actuator))
    }
    #[cfg(not(target_os = "windows"))]
    {
        let _ = catalog;
        Err(BotError::UnsupportedPlatform(
            "simulated clicks are only implemented for Windows".to_string(),
        ))
    }
}
