//! Station DTOs

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::application::NearbyStation;
use crate::domain::station::{
    Location, NewStation, OperatingHours, Station, StationChanges, StationFilter, StationStatus,
    StationType,
};
use crate::domain::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LocationDto {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub district: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl From<LocationDto> for Location {
    fn from(l: LocationDto) -> Self {
        Location {
            address: l.address,
            city: l.city,
            district: l.district,
            latitude: l.latitude,
            longitude: l.longitude,
        }
    }
}

impl From<Location> for LocationDto {
    fn from(l: Location) -> Self {
        Self {
            address: l.address,
            city: l.city,
            district: l.district,
            latitude: l.latitude,
            longitude: l.longitude,
        }
    }
}

/// Opening times as `HH:MM` or `HH:MM:SS`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHoursDto {
    pub open_time: String,
    pub close_time: String,
    pub is_open_24_hours: bool,
}

fn parse_time(field: &str, value: &str) -> Result<NaiveTime, DomainError> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .map_err(|_| DomainError::Validation(format!("{} must be HH:MM, got '{}'", field, value)))
}

impl TryFrom<OperatingHoursDto> for OperatingHours {
    type Error = DomainError;

    fn try_from(h: OperatingHoursDto) -> Result<Self, Self::Error> {
        Ok(OperatingHours {
            open_time: parse_time("openTime", &h.open_time)?,
            close_time: parse_time("closeTime", &h.close_time)?,
            is_open_24_hours: h.is_open_24_hours,
        })
    }
}

impl From<OperatingHours> for OperatingHoursDto {
    fn from(h: OperatingHours) -> Self {
        Self {
            open_time: h.open_time.format("%H:%M").to_string(),
            close_time: h.close_time.format("%H:%M").to_string(),
            is_open_24_hours: h.is_open_24_hours,
        }
    }
}

pub fn parse_station_type(value: &str) -> Result<StationType, DomainError> {
    StationType::parse(value)
        .ok_or_else(|| DomainError::Validation(format!("type must be AC or DC, got '{}'", value)))
}

pub fn parse_station_status(value: &str) -> Result<StationStatus, DomainError> {
    StationStatus::parse(value).ok_or_else(|| {
        DomainError::Validation(format!(
            "status must be Active, Inactive or Maintenance, got '{}'",
            value
        ))
    })
}

/// Request to register a station
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateStationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(nested)]
    pub location: LocationDto,
    /// AC or DC
    #[serde(rename = "type")]
    pub station_type: String,
    #[validate(range(min = 1, max = 50))]
    pub total_slots: i32,
    pub operating_hours: Option<OperatingHoursDto>,
    #[validate(length(min = 1, max = 64))]
    pub operator_id: String,
}

impl TryFrom<CreateStationRequest> for NewStation {
    type Error = DomainError;

    fn try_from(r: CreateStationRequest) -> Result<Self, Self::Error> {
        Ok(NewStation {
            name: r.name,
            location: r.location.into(),
            station_type: parse_station_type(&r.station_type)?,
            total_slots: r.total_slots,
            operating_hours: r
                .operating_hours
                .map(OperatingHours::try_from)
                .transpose()?
                .unwrap_or_default(),
            operator_id: r.operator_id,
        })
    }
}

/// Partial station update; omitted fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub location: Option<LocationDto>,
    #[serde(rename = "type")]
    pub station_type: Option<String>,
    #[validate(range(min = 1, max = 50))]
    pub total_slots: Option<i32>,
    pub operating_hours: Option<OperatingHoursDto>,
    /// Active, Inactive or Maintenance
    pub status: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub operator_id: Option<String>,
}

impl TryFrom<UpdateStationRequest> for StationChanges {
    type Error = DomainError;

    fn try_from(r: UpdateStationRequest) -> Result<Self, Self::Error> {
        Ok(StationChanges {
            name: r.name,
            location: r.location.map(Location::from),
            station_type: r.station_type.as_deref().map(parse_station_type).transpose()?,
            total_slots: r.total_slots,
            operating_hours: r
                .operating_hours
                .map(OperatingHours::try_from)
                .transpose()?,
            status: r.status.as_deref().map(parse_station_status).transpose()?,
            operator_id: r.operator_id,
        })
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCapacityRequest {
    #[validate(range(min = 1, max = 50))]
    pub total_slots: i32,
}

/// Station details in API responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StationDto {
    pub id: String,
    pub name: String,
    pub location: LocationDto,
    #[serde(rename = "type")]
    pub station_type: String,
    pub total_slots: i32,
    pub available_slots: i32,
    pub operating_hours: OperatingHoursDto,
    pub status: String,
    pub operator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Station> for StationDto {
    fn from(s: Station) -> Self {
        Self {
            id: s.id,
            name: s.name,
            location: s.location.into(),
            station_type: s.station_type.as_str().to_string(),
            total_slots: s.total_slots,
            available_slots: s.available_slots,
            operating_hours: s.operating_hours.into(),
            status: s.status.as_str().to_string(),
            operator_id: s.operator_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyStationDto {
    #[serde(flatten)]
    pub station: StationDto,
    pub distance_km: f64,
}

impl From<NearbyStation> for NearbyStationDto {
    fn from(n: NearbyStation) -> Self {
        Self {
            station: n.station.into(),
            distance_km: n.distance_km,
        }
    }
}

#[derive(Debug, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StationListQuery {
    /// Active, Inactive or Maintenance
    pub status: Option<String>,
    /// AC or DC
    #[serde(rename = "type")]
    pub station_type: Option<String>,
}

impl TryFrom<StationListQuery> for StationFilter {
    type Error = DomainError;

    fn try_from(q: StationListQuery) -> Result<Self, Self::Error> {
        Ok(StationFilter {
            status: q.status.as_deref().map(parse_station_status).transpose()?,
            station_type: q.station_type.as_deref().map(parse_station_type).transpose()?,
            operator_id: None,
        })
    }
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    /// Latitude in degrees
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    /// Longitude in degrees
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    /// Search radius in kilometres (default 10)
    #[validate(range(min = 0.0))]
    pub radius: Option<f64>,
}
