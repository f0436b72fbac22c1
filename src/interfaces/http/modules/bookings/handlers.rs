//! Booking HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::{debug, warn};

use crate::application::{BookingLifecycle, StationCapacityReconciler};
use crate::domain::DomainError;
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse, ValidatedJson, ValidatedQuery};

use super::dto::*;

/// Application state for booking handlers.
#[derive(Clone)]
pub struct BookingAppState {
    pub lifecycle: Arc<BookingLifecycle>,
    pub stations: Arc<StationCapacityReconciler>,
}

/// Bring the station's free-slot count up to date after a booking write.
///
/// The booking write has already been committed, so a failure here is
/// logged and otherwise ignored.
async fn refresh_station(state: &BookingAppState, station_id: &str) {
    match state.stations.reconcile(station_id).await {
        Ok(_) => {}
        Err(DomainError::NotFound { .. }) => {
            debug!(station_id, "Booking references an unknown station; nothing to reconcile")
        }
        Err(e) => warn!(station_id, error = %e, "Station reconcile after booking change failed"),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/bookings",
    tag = "Bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = ApiResponse<BookingCreatedResponse>),
        (status = 400, description = "Invalid request or outside the booking window"),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn create_booking(
    State(state): State<BookingAppState>,
    ValidatedJson(request): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookingCreatedResponse>>), ApiError> {
    let booking = state
        .lifecycle
        .create(request.into())
        .await
        .map_err(api_error)?;

    refresh_station(&state, &booking.station_id).await;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(BookingCreatedResponse {
            booking_id: booking.id,
        })),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    params(BookingListQuery),
    responses(
        (status = 200, description = "Bookings, oldest first", body = ApiResponse<Vec<BookingDto>>)
    )
)]
pub async fn list_bookings(
    State(state): State<BookingAppState>,
    ValidatedQuery(query): ValidatedQuery<BookingListQuery>,
) -> Result<Json<ApiResponse<Vec<BookingDto>>>, ApiError> {
    let bookings = state
        .lifecycle
        .get(&query.into())
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        bookings.into_iter().map(BookingDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/stats/{user_id}",
    tag = "Bookings",
    params(("user_id" = String, Path, description = "EV owner ID")),
    responses(
        (status = 200, description = "Booking counts for the owner", body = ApiResponse<UserBookingStatsDto>)
    )
)]
pub async fn user_booking_stats(
    State(state): State<BookingAppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<UserBookingStatsDto>>, ApiError> {
    let stats = state
        .lifecycle
        .user_stats(&user_id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(stats.into())))
}

#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 200, description = "Booking details", body = ApiResponse<BookingDto>),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BookingDto>>, ApiError> {
    let booking = state.lifecycle.get_by_id(&id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(booking.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    request_body = UpdateBookingRequest,
    responses(
        (status = 204, description = "Booking updated"),
        (status = 400, description = "Invalid change or inside the lock window"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "New slot already taken, or booking is closed")
    )
)]
pub async fn update_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateBookingRequest>,
) -> Result<StatusCode, ApiError> {
    let before = state.lifecycle.get_by_id(&id).await.map_err(api_error)?;
    let after = state
        .lifecycle
        .update(&id, request.into())
        .await
        .map_err(api_error)?;

    refresh_station(&state, &before.station_id).await;
    if after.station_id != before.station_id {
        refresh_station(&state, &after.station_id).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking cancelled"),
        (status = 400, description = "Inside the lock window"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking cannot be cancelled from its current status")
    )
)]
pub async fn cancel_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let booking = state.lifecycle.cancel(&id).await.map_err(api_error)?;
    refresh_station(&state, &booking.station_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/approve",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking confirmed"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is closed")
    )
)]
pub async fn approve_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let booking = state.lifecycle.approve(&id).await.map_err(api_error)?;
    refresh_station(&state, &booking.station_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/start",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Charging started"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is not confirmed")
    )
)]
pub async fn start_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let booking = state.lifecycle.start(&id).await.map_err(api_error)?;
    refresh_station(&state, &booking.station_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/bookings/{id}/complete",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking completed"),
        (status = 404, description = "Booking not found"),
        (status = 409, description = "Booking is closed")
    )
)]
pub async fn complete_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let booking = state.lifecycle.complete(&id).await.map_err(api_error)?;
    refresh_station(&state, &booking.station_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    params(("id" = String, Path, description = "Booking ID")),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 400, description = "Inside the lock window"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    State(state): State<BookingAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let booking = state.lifecycle.delete(&id).await.map_err(api_error)?;
    refresh_station(&state, &booking.station_id).await;
    Ok(StatusCode::NO_CONTENT)
}
