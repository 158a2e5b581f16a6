//! Response types for the shift engine API.
//!
//! This module defines the error response structures and the mapping from
//! engine errors to HTTP statuses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ErrorCategory};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

/// Stable machine-readable code for an engine error.
pub fn error_code(error: &EngineError) -> &'static str {
    match error {
        EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
            "CONFIG_ERROR"
        }
        EngineError::Storage { .. } => "STORAGE_ERROR",
        EngineError::ShiftNotFound { .. }
        | EngineError::OfferNotFound { .. }
        | EngineError::EmployeeNotFound { .. }
        | EngineError::PayrollPeriodNotFound { .. } => "NOT_FOUND",
        EngineError::NotAssigned { .. }
        | EngineError::NotResponsibleManager { .. }
        | EngineError::OfferNotAddressed { .. } => "PERMISSION_DENIED",
        EngineError::AlreadyConfirmed { .. } => "ALREADY_CONFIRMED",
        EngineError::AlreadyDeclined { .. } => "ALREADY_DECLINED",
        EngineError::ConfirmationLocked { .. } => "CONFIRMATION_LOCKED",
        EngineError::NoPendingLateDecline { .. } => "NO_PENDING_LATE_DECLINE",
        EngineError::SegmentAlreadyOpen { .. } => "SEGMENT_ALREADY_OPEN",
        EngineError::NoOpenSegment { .. } => "NO_OPEN_SEGMENT",
        EngineError::ReopenWindowExpired { .. } => "REOPEN_WINDOW_EXPIRED",
        EngineError::InvalidTransition { .. } => "INVALID_TRANSITION",
        EngineError::LocationRequired { .. } => "LOCATION_REQUIRED",
        EngineError::OutOfRange { .. } => "OUT_OF_RANGE",
        EngineError::NotNoShow { .. } => "NOT_NO_SHOW",
        EngineError::NoShowReasonAlreadySubmitted { .. } => "NO_SHOW_REASON_ALREADY_SUBMITTED",
        EngineError::NoShowReasonMissing { .. } => "NO_SHOW_REASON_MISSING",
        EngineError::NoShowReasonAlreadyDecided { .. } => "NO_SHOW_REASON_ALREADY_DECIDED",
        EngineError::AlreadyTaken { .. } => "ALREADY_TAKEN",
        EngineError::NotReplaceable { .. } => "NOT_REPLACEABLE",
        EngineError::CandidateInactive { .. } => "CANDIDATE_INACTIVE",
        EngineError::ScheduleConflict { .. } => "SCHEDULE_CONFLICT",
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let code = error_code(&error);
        let (status, error) = match error.category() {
            ErrorCategory::InvariantViolation | ErrorCategory::ConflictDetected => (
                StatusCode::CONFLICT,
                ApiError::new(code, error.to_string()),
            ),
            ErrorCategory::NotFound => (
                StatusCode::NOT_FOUND,
                ApiError::new(code, "The requested resource was not found"),
            ),
            ErrorCategory::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ApiError::new(code, "You are not allowed to perform this action"),
            ),
            ErrorCategory::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new(code, "Internal error"),
            ),
        };
        ApiErrorResponse { status, error }
    }
}
