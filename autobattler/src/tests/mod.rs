mod actuator_tests;
mod monitor_tests;
mod stats_tests;

// Initialize tracing for tests that want log output
#[allow(dead_code)]
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .try_init();
}
