//! HTTP API module for the shift engine.
//!
//! Thin axum adapter over the attendance, replacement and KPI engines.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    AcceptOfferRequest, AssignReplacementRequest, BroadcastRequest, CloseSegmentRequest,
    ConfirmRequest, DecisionRequest, DeclineRequest, KpiQuery, NoShowReasonRequest,
    OpenSegmentRequest, TimestampRequest,
};
pub use response::{ApiError, ApiErrorResponse, error_code};
pub use state::AppState;
