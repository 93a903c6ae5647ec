//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;
pub use validation::require_source_path;

use crate::error::Result;
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MigrateError;
    use std::io::Write;

    #[test]
    fn test_from_yaml_fills_defaults() {
        let config = Config::from_yaml("source:\n  path: legacy/store.db\n").unwrap();
        assert_eq!(
            config.source.path.as_deref(),
            Some(Path::new("legacy/store.db"))
        );
        assert_eq!(config.target.host, "localhost");
        assert_eq!(config.target.port, 3306);
        assert_eq!(config.target.database, "storeapp");
        assert_eq!(config.target.user, "root");
        assert_eq!(config.migration.batch_size, 500);
    }

    #[test]
    fn test_from_yaml_full() {
        let yaml = r#"
source:
  path: store.db
target:
  type: mysql
  host: db.internal
  port: 3307
  database: pos
  user: importer
  password: hunter2
  ssl_mode: require
migration:
  batch_size: 250
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.target.host, "db.internal");
        assert_eq!(config.target.port, 3307);
        assert_eq!(config.target.ssl_mode, "require");
        assert_eq!(config.migration.batch_size, 250);
    }

    #[test]
    fn test_from_yaml_rejects_invalid_values() {
        let err = Config::from_yaml("target:\n  type: postgres\n").unwrap_err();
        assert!(matches!(err, MigrateError::Config(_)));
    }

    #[test]
    fn test_from_yaml_rejects_malformed_yaml() {
        let err = Config::from_yaml("invalid: yaml: content: [").unwrap_err();
        assert!(matches!(err, MigrateError::Yaml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "migration:\n  batch_size: 42").unwrap();
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.migration.batch_size, 42);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/storeapp-migrate.yaml").unwrap_err();
        assert!(matches!(err, MigrateError::Io(_)));
    }
}
