//! Configuration validation.

use std::path::Path;

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Target validation
    if config.target.r#type != "mysql" {
        return Err(MigrateError::Config(format!(
            "target.type must be 'mysql', got '{}'",
            config.target.r#type
        )));
    }
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.port == 0 {
        return Err(MigrateError::Config("target.port must be non-zero".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }

    // Source validation - the path may still arrive from the command line
    if let Some(path) = &config.source.path {
        if path.as_os_str().is_empty() {
            return Err(MigrateError::Config("source.path must not be empty".into()));
        }
    }

    if config.migration.batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }

    Ok(())
}

/// The source path, which a run cannot do without.
pub fn require_source_path(config: &Config) -> Result<&Path> {
    config
        .source
        .path
        .as_deref()
        .ok_or_else(|| MigrateError::Config("source path is required".into()))
}
