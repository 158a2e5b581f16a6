//! Shift attendance, replacement and KPI engine
//!
//! This crate runs the lifecycle of scheduled shifts for a delivery back
//! office: confirmation and decline, work segments, no-shows, replacement of
//! uncovered shifts, and the KPI scores derived from all of it.

#![warn(missing_docs)]

pub mod api;
pub mod attendance;
pub mod config;
pub mod error;
pub mod kpi;
pub mod models;
pub mod notifications;
pub mod replacement;
pub mod store;
pub mod time_rules;
