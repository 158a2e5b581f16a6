//! HTTP request handlers for the shift engine API.
//!
//! Store calls block, so every operation runs on the blocking pool. The
//! intents an operation raises are published to the outbox only after it
//! committed.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::notifications::Outcome;
use crate::store::ShiftStore;

use super::request::{
    AcceptOfferRequest, AssignReplacementRequest, BroadcastRequest, CloseSegmentRequest,
    ConfirmRequest, DecisionRequest, DeclineRequest, KpiQuery, NoShowReasonRequest,
    OpenSegmentRequest, TimestampRequest,
};
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router<S: ShiftStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/shifts/:shift_id/confirm", post(confirm_handler::<S>))
        .route("/shifts/:shift_id/decline", post(decline_handler::<S>))
        .route(
            "/shifts/:shift_id/late-decline/resolve",
            post(resolve_late_decline_handler::<S>),
        )
        .route(
            "/shifts/:shift_id/segments/open",
            post(open_segment_handler::<S>),
        )
        .route(
            "/shifts/:shift_id/segments/close",
            post(close_segment_handler::<S>),
        )
        .route(
            "/shifts/:shift_id/segments/reopen",
            post(reopen_segment_handler::<S>),
        )
        .route("/shifts/:shift_id/timesheet", get(timesheet_handler::<S>))
        .route("/shifts/:shift_id/no-show", post(no_show_handler::<S>))
        .route(
            "/shifts/:shift_id/no-show/reason",
            post(no_show_reason_handler::<S>),
        )
        .route(
            "/shifts/:shift_id/no-show/reason/decision",
            post(no_show_decision_handler::<S>),
        )
        .route(
            "/shifts/:shift_id/replacements/broadcast",
            post(broadcast_handler::<S>),
        )
        .route(
            "/shifts/:shift_id/replacements/assign",
            post(assign_replacement_handler::<S>),
        )
        .route("/offers/:offer_id/accept", post(accept_offer_handler::<S>))
        .route("/employees/:employee_id/kpi", get(kpi_handler::<S>))
        .with_state(state)
}

/// Handler for POST /shifts/:shift_id/confirm.
async fn confirm_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<ConfirmRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, shift_id = %shift_id, "Processing confirm request");
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "confirm", move |state| {
        state
            .attendance()
            .confirm(shift_id, request.employee_id, now)
            .map(Outcome::quiet)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/decline.
async fn decline_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<DeclineRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, shift_id = %shift_id, "Processing decline request");
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "decline", move |state| {
        state.attendance().decline(
            shift_id,
            request.employee_id,
            request.reason_id,
            request.comment,
            now,
        )
    })
    .await
}

/// Handler for POST /shifts/:shift_id/late-decline/resolve.
async fn resolve_late_decline_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "resolve_late_decline", move |state| {
        state
            .attendance()
            .resolve_late_decline(shift_id, request.approver_id, request.decision, now)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/segments/open.
async fn open_segment_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<OpenSegmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "open_segment", move |state| {
        state
            .attendance()
            .open_segment(shift_id, request.employee_id, now, request.location)
            .map(Outcome::quiet)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/segments/close.
async fn close_segment_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<CloseSegmentRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "close_segment", move |state| {
        state
            .attendance()
            .close_segment(shift_id, now, request.location)
            .map(Outcome::quiet)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/segments/reopen.
async fn reopen_segment_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<TimestampRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "reopen_segment", move |state| {
        state
            .attendance()
            .reopen_segment(shift_id, now)
            .map(Outcome::quiet)
    })
    .await
}

/// Handler for GET /shifts/:shift_id/timesheet.
async fn timesheet_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    run(state, correlation_id, "timesheet", move |state| {
        state.attendance().timesheet(shift_id).map(Outcome::quiet)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/no-show.
async fn no_show_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<TimestampRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "record_no_show", move |state| {
        state
            .attendance()
            .record_no_show(shift_id, now)
            .map(Outcome::quiet)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/no-show/reason.
async fn no_show_reason_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<NoShowReasonRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    if request.reason_text.trim().is_empty() {
        return error_response(
            StatusCode::BAD_REQUEST,
            ApiError::validation_error("reason_text must not be empty"),
        );
    }
    let now = state.now(request.at);
    run(state, correlation_id, "submit_no_show_reason", move |state| {
        state.attendance().submit_no_show_reason(
            shift_id,
            request.employee_id,
            &request.reason_text,
            now,
        )
    })
    .await
}

/// Handler for POST /shifts/:shift_id/no-show/reason/decision.
async fn no_show_decision_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<DecisionRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "decide_no_show_reason", move |state| {
        state
            .attendance()
            .decide_no_show_reason(shift_id, request.approver_id, request.decision, now)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/replacements/broadcast.
async fn broadcast_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<BroadcastRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "broadcast", move |state| {
        state
            .replacement()
            .broadcast(shift_id, request.requested_by, &request.candidate_ids, now)
    })
    .await
}

/// Handler for POST /shifts/:shift_id/replacements/assign.
async fn assign_replacement_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(shift_id): Path<Uuid>,
    payload: Result<Json<AssignReplacementRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "assign_replacement", move |state| {
        state.replacement().assign_replacement(
            shift_id,
            request.assigned_by,
            request.candidate_id,
            now,
        )
    })
    .await
}

/// Handler for POST /offers/:offer_id/accept.
async fn accept_offer_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(offer_id): Path<Uuid>,
    payload: Result<Json<AcceptOfferRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, offer_id = %offer_id, "Processing offer acceptance");
    let request = match parse_body(correlation_id, payload) {
        Ok(request) => request,
        Err(response) => return response,
    };
    let now = state.now(request.at);
    run(state, correlation_id, "accept_offer", move |state| {
        state
            .replacement()
            .accept(offer_id, request.employee_id, request.eta_minutes, now)
    })
    .await
}

/// Handler for GET /employees/:employee_id/kpi?period_id=...
async fn kpi_handler<S: ShiftStore + 'static>(
    State(state): State<AppState<S>>,
    Path(employee_id): Path<Uuid>,
    query: Result<Query<KpiQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            warn!(
                correlation_id = %correlation_id,
                error = %rejection.body_text(),
                "Invalid KPI query"
            );
            return error_response(
                StatusCode::BAD_REQUEST,
                ApiError::validation_error(rejection.body_text()),
            );
        }
    };
    run(state, correlation_id, "evaluate_kpi", move |state| {
        state
            .kpi()
            .evaluate(employee_id, query.period_id)
            .map(Outcome::quiet)
    })
    .await
}

/// Unwraps a JSON body or builds the 400 response for it.
fn parse_body<T>(
    correlation_id: Uuid,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, Response> {
    match payload {
        Ok(Json(request)) => Ok(request),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new(
                        "MISSING_CONTENT_TYPE",
                        "Content-Type must be application/json",
                    )
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err(error_response(StatusCode::BAD_REQUEST, error))
        }
    }
}

/// Runs an engine operation on the blocking pool, publishes what it raised
/// and renders the result.
async fn run<S, T, F>(
    state: AppState<S>,
    correlation_id: Uuid,
    operation: &'static str,
    call: F,
) -> Response
where
    S: ShiftStore + 'static,
    T: Serialize + Send + 'static,
    F: FnOnce(&AppState<S>) -> EngineResult<Outcome<T>> + Send + 'static,
{
    let start_time = Instant::now();
    let worker_state = state.clone();
    let joined = tokio::task::spawn_blocking(move || call(&worker_state)).await;

    let result = match joined {
        Ok(result) => result,
        Err(err) => {
            error!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Operation task failed"
            );
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("INTERNAL_ERROR", "Internal error"),
            );
        }
    };

    match result {
        Ok(outcome) => {
            let published = state.outbox().publish(outcome.notifications);
            info!(
                correlation_id = %correlation_id,
                operation,
                notifications = published,
                duration_us = start_time.elapsed().as_micros(),
                "Operation completed successfully"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(outcome.value),
            )
                .into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                error = %err,
                "Operation rejected"
            );
            let api_error: ApiErrorResponse = err.into();
            error_response(api_error.status, api_error.error)
        }
    }
}

fn error_response(status: StatusCode, error: ApiError) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(error),
    )
        .into_response()
}
