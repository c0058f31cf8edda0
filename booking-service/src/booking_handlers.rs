use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use common_auth::{AdminOnly, AdminOrRequester, Authorized};
use common_http_errors::{ApiError, ApiResult};
use tracing::info;

use crate::app::AppState;
use crate::models::{Booking, BookingId, BookingList, BookingStatus, SubmissionRequest};

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(JsonRejection::JsonDataError(err)) => Err(ApiError::validation(err.body_text())),
        Err(JsonRejection::JsonSyntaxError(err)) => {
            Err(ApiError::bad_request("invalid_json", err.body_text()))
        }
        Err(JsonRejection::MissingJsonContentType(err)) => {
            Err(ApiError::bad_request("unsupported_media_type", err.body_text()))
        }
        Err(other) => Err(ApiError::bad_request("invalid_body", other.body_text())),
    }
}

pub async fn submit_booking(
    State(state): State<AppState>,
    auth: Authorized<AdminOrRequester>,
    payload: Result<Json<SubmissionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let submission = json_body(payload)?.into_new_booking()?;
    let booking = state.bookings.create(submission).await?;

    state.record_booking_metric("submitted");
    info!(booking_id = booking.id, submitted_by = %auth.user.username, "booking request submitted");
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn list_bookings(
    State(state): State<AppState>,
    _auth: Authorized<AdminOnly>,
) -> ApiResult<Json<BookingList>> {
    let bookings = state.bookings.list().await?;
    Ok(Json(BookingList { bookings }))
}

async fn transition(
    state: &AppState,
    admin: &str,
    id: i32,
    status: BookingStatus,
) -> ApiResult<Json<Booking>> {
    let booking = state.bookings.set_status(id, status).await?;
    state.record_booking_metric(status.as_str());
    info!(booking_id = id, status = %status, admin, "booking request updated");
    Ok(Json(booking))
}

pub async fn accept_booking(
    State(state): State<AppState>,
    auth: Authorized<AdminOnly>,
    payload: Result<Json<BookingId>, JsonRejection>,
) -> ApiResult<Json<Booking>> {
    let BookingId { id } = json_body(payload)?;
    transition(&state, &auth.user.username, id, BookingStatus::Accepted).await
}

pub async fn reject_booking(
    State(state): State<AppState>,
    auth: Authorized<AdminOnly>,
    payload: Result<Json<BookingId>, JsonRejection>,
) -> ApiResult<Json<Booking>> {
    let BookingId { id } = json_body(payload)?;
    transition(&state, &auth.user.username, id, BookingStatus::Rejected).await
}

pub async fn delete_booking(
    State(state): State<AppState>,
    auth: Authorized<AdminOnly>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Booking>> {
    let Path(raw_id) = path.map_err(|err| ApiError::validation(err.body_text()))?;
    if raw_id <= 0 {
        return Err(ApiError::validation("id must be greater than 0"));
    }
    let id = i32::try_from(raw_id).map_err(|_| {
        ApiError::not_found(
            "booking_not_found",
            format!("Booking request with ID {raw_id} not found."),
        )
    })?;

    let booking = state.bookings.delete(id).await?;
    state.record_booking_metric("deleted");
    info!(booking_id = id, admin = %auth.user.username, "booking request deleted");
    Ok(Json(booking))
}
