//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine settings
//! and KPI templates from YAML files.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::models::KpiTemplate;

use super::types::{EngineConfig, KpiTemplatesConfig};

/// Loads and provides access to engine configuration.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml         # Attendance and replacement settings
/// └── kpi_templates.yaml  # KPI scoring templates
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    engine: EngineConfig,
    templates: Vec<KpiTemplate>,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if either file is missing and
    /// `ConfigParseError` if either file is not valid YAML for its schema.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shift_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), shift_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let engine = Self::load_yaml::<EngineConfig>(&path.join("engine.yaml"))?;
        let templates =
            Self::load_yaml::<KpiTemplatesConfig>(&path.join("kpi_templates.yaml"))?.templates;

        info!(
            path = %path.display(),
            templates = templates.len(),
            "Loaded engine configuration"
        );

        Ok(Self { engine, templates })
    }

    /// Builds a loader from values already in memory.
    pub fn from_parts(engine: EngineConfig, templates: Vec<KpiTemplate>) -> Self {
        Self { engine, templates }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the engine settings.
    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// Returns every loaded KPI template.
    pub fn kpi_templates(&self) -> &[KpiTemplate] {
        &self.templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TriggerType;
    use rust_decimal::Decimal;

    fn config_path() -> &'static str {
        "./config/default"
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.engine().attendance.grace_minutes, 5);
        assert_eq!(loader.engine().attendance.late_decline_deadline_hours, 12);
        assert_eq!(loader.engine().replacement.default_eta_minutes, 30);
    }

    #[test]
    fn test_default_templates_loaded() {
        let loader = ConfigLoader::load(config_path()).unwrap();
        assert_eq!(loader.kpi_templates().len(), 2);

        let courier = &loader.kpi_templates()[0];
        assert_eq!(courier.position, "courier");
        assert_eq!(courier.minimum_total_kpi_percent, Decimal::from(60));
        assert!(courier.sections[0].indicators[0].matches(TriggerType::NoShow));
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");
        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("engine.yaml"));
            }
            other => panic!("Expected ConfigNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_parts_keeps_values() {
        let loader = ConfigLoader::from_parts(EngineConfig::default(), vec![]);
        assert_eq!(loader.engine(), &EngineConfig::default());
        assert!(loader.kpi_templates().is_empty());
    }
}
