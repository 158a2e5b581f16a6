//! Configuration loading for the shift engine.
//!
//! A configuration directory holds `engine.yaml` (attendance, replacement
//! and API settings) and `kpi_templates.yaml` (scoring templates).
//!
//! # Example
//!
//! ```no_run
//! use shift_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Grace window: {} min", config.engine().attendance.grace_minutes);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{ApiConfig, AttendanceConfig, EngineConfig, KpiTemplatesConfig, ReplacementConfig};
