use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Sensor error: {0}")]
    Sensor(String),

    #[error("Actuator failure: {0}")]
    ActuatorFailure(String),

    #[error("Missing asset: {0}")]
    AssetMissing(String),

    #[error("Invalid mode selection: {0}")]
    InvalidMode(String),

    #[error("Platform-specific error: {0}")]
    PlatformError(String),

    #[error("Unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
