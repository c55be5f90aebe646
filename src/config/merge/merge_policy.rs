//! Merge rules: defaults, override order, conflict handling.

use crate::adapter::DEFAULT_TEMPERATURE;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

/// Create a Config builder with merge policy defaults applied.
///
/// Sources added afterwards override these values key by key; tables such as
/// `providers.<name>` merge rather than replace.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("pipeline.temperature", f64::from(DEFAULT_TEMPERATURE))?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "stderr")
}
