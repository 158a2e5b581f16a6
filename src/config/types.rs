//! Configuration types for the shift engine.
//!
//! These structures are deserialized from the YAML files in a configuration
//! directory. Every field has a default so a partial file is valid.

use serde::Deserialize;

use crate::models::KpiTemplate;

/// Attendance rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Minutes after the planned start that do not count as late.
    pub grace_minutes: u32,
    /// A decline closer than this to the planned start needs manager approval.
    pub late_decline_deadline_hours: u32,
    /// Whether opening a segment requires a caller-supplied location check.
    pub require_geolocation: bool,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            grace_minutes: 5,
            late_decline_deadline_hours: 12,
            require_geolocation: false,
        }
    }
}

/// Replacement rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReplacementConfig {
    /// ETA assumed when a candidate accepts without giving one.
    pub default_eta_minutes: u32,
}

impl Default for ReplacementConfig {
    fn default() -> Self {
        Self {
            default_eta_minutes: 30,
        }
    }
}

/// HTTP surface settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Honour the `at` timestamp in request bodies. When off, every action
    /// is stamped with the server clock. Enable only for replays and tests.
    pub trust_client_time: bool,
}

/// Contents of `engine.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Attendance rules.
    pub attendance: AttendanceConfig,
    /// Replacement rules.
    pub replacement: ReplacementConfig,
    /// HTTP surface settings.
    pub api: ApiConfig,
}

/// Contents of `kpi_templates.yaml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct KpiTemplatesConfig {
    /// All templates, for every partner.
    #[serde(default)]
    pub templates: Vec<KpiTemplate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_engine_config_uses_defaults() {
        let yaml = "attendance:\n  grace_minutes: 10\n";
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.attendance.grace_minutes, 10);
        assert_eq!(config.attendance.late_decline_deadline_hours, 12);
        assert!(!config.attendance.require_geolocation);
        assert_eq!(config.replacement.default_eta_minutes, 30);
        assert!(!config.api.trust_client_time);
    }

    #[test]
    fn test_empty_templates_file() {
        let config: KpiTemplatesConfig = serde_yaml::from_str("templates: []").unwrap();
        assert!(config.templates.is_empty());
    }
}
