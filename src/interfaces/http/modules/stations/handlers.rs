//! Station HTTP handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::application::{StationCapacityReconciler, DEFAULT_NEARBY_RADIUS_KM};
use crate::domain::station::{NewStation, StationChanges, StationFilter};
use crate::interfaces::http::common::{api_error, ApiError, ApiResponse, ValidatedJson, ValidatedQuery};

use super::dto::*;

/// Application state for station handlers.
#[derive(Clone)]
pub struct StationAppState {
    pub stations: Arc<StationCapacityReconciler>,
}

#[utoipa::path(
    post,
    path = "/api/v1/stations",
    tag = "Stations",
    request_body = CreateStationRequest,
    responses(
        (status = 201, description = "Station created", body = ApiResponse<StationDto>),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_station(
    State(state): State<StationAppState>,
    ValidatedJson(request): ValidatedJson<CreateStationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StationDto>>), ApiError> {
    let draft = NewStation::try_from(request).map_err(api_error)?;
    let station = state
        .stations
        .create_station(draft)
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(station.into()))))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations",
    tag = "Stations",
    params(StationListQuery),
    responses(
        (status = 200, description = "Stations, oldest first", body = ApiResponse<Vec<StationDto>>),
        (status = 400, description = "Unknown status or type")
    )
)]
pub async fn list_stations(
    State(state): State<StationAppState>,
    ValidatedQuery(query): ValidatedQuery<StationListQuery>,
) -> Result<Json<ApiResponse<Vec<StationDto>>>, ApiError> {
    let filter = StationFilter::try_from(query).map_err(api_error)?;
    let stations = state
        .stations
        .list_stations(&filter)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        stations.into_iter().map(StationDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/nearby",
    tag = "Stations",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Active stations within the radius, nearest first", body = ApiResponse<Vec<NearbyStationDto>>),
        (status = 400, description = "Invalid coordinates or radius")
    )
)]
pub async fn nearby_stations(
    State(state): State<StationAppState>,
    ValidatedQuery(query): ValidatedQuery<NearbyQuery>,
) -> Result<Json<ApiResponse<Vec<NearbyStationDto>>>, ApiError> {
    let radius = query.radius.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
    let found = state
        .stations
        .get_nearby(query.lat, query.lng, radius)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        found.into_iter().map(NearbyStationDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/operator/{operator_id}",
    tag = "Stations",
    params(("operator_id" = String, Path, description = "Operator ID")),
    responses(
        (status = 200, description = "Stations run by the operator", body = ApiResponse<Vec<StationDto>>)
    )
)]
pub async fn list_operator_stations(
    State(state): State<StationAppState>,
    Path(operator_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<StationDto>>>, ApiError> {
    let stations = state
        .stations
        .list_by_operator(&operator_id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        stations.into_iter().map(StationDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/stations/{id}",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 200, description = "Station details", body = ApiResponse<StationDto>),
        (status = 404, description = "Station not found")
    )
)]
pub async fn get_station(
    State(state): State<StationAppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<StationDto>>, ApiError> {
    let station = state.stations.get_station(&id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(station.into())))
}

#[utoipa::path(
    put,
    path = "/api/v1/stations/{id}",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    request_body = UpdateStationRequest,
    responses(
        (status = 200, description = "Updated station", body = ApiResponse<StationDto>),
        (status = 400, description = "Invalid change"),
        (status = 404, description = "Station not found"),
        (status = 409, description = "Deactivation refused while bookings are active")
    )
)]
pub async fn update_station(
    State(state): State<StationAppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStationRequest>,
) -> Result<Json<ApiResponse<StationDto>>, ApiError> {
    let changes = StationChanges::try_from(request).map_err(api_error)?;
    let station = state
        .stations
        .update_station(&id, changes)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(station.into())))
}

#[utoipa::path(
    patch,
    path = "/api/v1/stations/{id}/activate",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 204, description = "Station active"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn activate_station(
    State(state): State<StationAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.stations.activate(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/stations/{id}/deactivate",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 204, description = "Station inactive"),
        (status = 404, description = "Station not found"),
        (status = 409, description = "Active bookings exist")
    )
)]
pub async fn deactivate_station(
    State(state): State<StationAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.stations.deactivate(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/stations/{id}/maintenance",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 204, description = "Station under maintenance"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn maintenance_station(
    State(state): State<StationAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.stations.set_maintenance(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/stations/{id}/update-slots",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    responses(
        (status = 204, description = "Available slots recomputed"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn reconcile_station(
    State(state): State<StationAppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.stations.reconcile(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/v1/stations/{id}/capacity",
    tag = "Stations",
    params(("id" = String, Path, description = "Station ID")),
    request_body = UpdateCapacityRequest,
    responses(
        (status = 200, description = "Capacity changed and slots recomputed", body = ApiResponse<StationDto>),
        (status = 400, description = "Slot count outside 1..=50"),
        (status = 404, description = "Station not found")
    )
)]
pub async fn update_capacity(
    State(state): State<StationAppState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateCapacityRequest>,
) -> Result<Json<ApiResponse<StationDto>>, ApiError> {
    let station = state
        .stations
        .update_capacity(&id, request.total_slots)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(station.into())))
}
