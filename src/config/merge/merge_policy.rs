//! Built-in defaults every merge starts from.

use crate::config::{DEFAULT_BUSY_TIMEOUT_MS, DEFAULT_LABEL};
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError};

pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("store.label", DEFAULT_LABEL)?
        .set_default("store.busy_timeout_ms", DEFAULT_BUSY_TIMEOUT_MS)?
        .set_default("logging.enabled", true)?
        .set_default("logging.level", "info")?
        .set_default("logging.format", "text")?
        .set_default("logging.output", "file")?
        .set_default("logging.color", true)
}
