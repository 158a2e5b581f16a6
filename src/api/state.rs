//! Application state for the shift engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::attendance::AttendanceEngine;
use crate::config::ConfigLoader;
use crate::kpi::KpiEngine;
use crate::notifications::NotificationOutbox;
use crate::replacement::ReplacementCoordinator;
use crate::store::ShiftStore;

use super::request::resolve_time;

/// Shared application state.
///
/// Holds the engines built over one store, the configuration they were built
/// from, and the outbox handlers publish notification intents into.
pub struct AppState<S> {
    config: Arc<ConfigLoader>,
    attendance: Arc<AttendanceEngine<S>>,
    replacement: Arc<ReplacementCoordinator<S>>,
    kpi: Arc<KpiEngine<S>>,
    outbox: NotificationOutbox,
    trust_client_time: bool,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            attendance: Arc::clone(&self.attendance),
            replacement: Arc::clone(&self.replacement),
            kpi: Arc::clone(&self.kpi),
            outbox: self.outbox.clone(),
            trust_client_time: self.trust_client_time,
        }
    }
}

impl<S: ShiftStore> AppState<S> {
    /// Builds every engine over `store` using the loaded configuration.
    pub fn new(config: ConfigLoader, store: Arc<S>, outbox: NotificationOutbox) -> Self {
        let engine = config.engine();
        let attendance = AttendanceEngine::new(Arc::clone(&store), engine.attendance.clone());
        let replacement =
            ReplacementCoordinator::new(Arc::clone(&store), engine.replacement.clone());
        let kpi = KpiEngine::new(store, config.kpi_templates().to_vec());
        let trust_client_time = engine.api.trust_client_time;
        Self {
            config: Arc::new(config),
            attendance: Arc::new(attendance),
            replacement: Arc::new(replacement),
            kpi: Arc::new(kpi),
            outbox,
            trust_client_time,
        }
    }

    /// Returns the time a request's action is stamped with.
    pub fn now(&self, at: Option<NaiveDateTime>) -> NaiveDateTime {
        resolve_time(self.trust_client_time, at)
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the attendance engine.
    pub fn attendance(&self) -> &AttendanceEngine<S> {
        &self.attendance
    }

    /// Returns the replacement coordinator.
    pub fn replacement(&self) -> &ReplacementCoordinator<S> {
        &self.replacement
    }

    /// Returns the KPI engine.
    pub fn kpi(&self) -> &KpiEngine<S> {
        &self.kpi
    }

    /// Returns the notification outbox.
    pub fn outbox(&self) -> &NotificationOutbox {
        &self.outbox
    }
}
