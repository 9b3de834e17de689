//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::SqlfsConfig;
use crate::error::SetupError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the global file and environment.
    pub fn load() -> Result<SqlfsConfig, SetupError> {
        Ok(MergeService::load()?)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<SqlfsConfig, SetupError> {
        if !path.exists() {
            return Err(SetupError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Ok(MergeService::load_from_file(path)?)
    }

    /// Create default configuration.
    pub fn default() -> SqlfsConfig {
        SqlfsConfig::default()
    }
}
