//! Charging station domain entity

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::errors::DomainError;

pub const MIN_SLOTS: i32 = 1;
pub const MAX_SLOTS: i32 = 50;

/// Charger current type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationType {
    AC,
    DC,
}

impl StationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AC => "AC",
            Self::DC => "DC",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AC" => Some(Self::AC),
            "DC" => Some(Self::DC),
            _ => None,
        }
    }
}

/// Station operating status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StationStatus {
    Active,
    Inactive,
    Maintenance,
}

impl StationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
            Self::Maintenance => "Maintenance",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Active" | "active" => Some(Self::Active),
            "Inactive" | "inactive" => Some(Self::Inactive),
            "Maintenance" | "maintenance" => Some(Self::Maintenance),
            _ => None,
        }
    }
}

impl std::fmt::Display for StationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatingHours {
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub is_open_24_hours: bool,
}

impl Default for OperatingHours {
    fn default() -> Self {
        Self {
            open_time: NaiveTime::MIN,
            close_time: NaiveTime::MIN,
            is_open_24_hours: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: String,
    pub name: String,
    pub location: Location,
    pub station_type: StationType,
    pub total_slots: i32,
    /// Derived from `total_slots` and active bookings; refreshed by reconcile.
    pub available_slots: i32,
    pub operating_hours: OperatingHours,
    pub status: StationStatus,
    pub operator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Station {
    /// New active station with every slot free.
    pub fn new(draft: NewStation, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            location: draft.location,
            station_type: draft.station_type,
            total_slots: draft.total_slots,
            available_slots: draft.total_slots,
            operating_hours: draft.operating_hours,
            status: StationStatus::Active,
            operator_id: draft.operator_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// `max(0, total_slots - active)`
    pub fn slots_left(total_slots: i32, active: u64) -> i32 {
        let active = i32::try_from(active).unwrap_or(i32::MAX);
        total_slots.saturating_sub(active).max(0)
    }
}

#[derive(Debug, Clone)]
pub struct NewStation {
    pub name: String,
    pub location: Location,
    pub station_type: StationType,
    pub total_slots: i32,
    pub operating_hours: OperatingHours,
    pub operator_id: String,
}

impl NewStation {
    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_total_slots(self.total_slots)?;
        validate_coordinates(self.location.latitude, self.location.longitude)
    }
}

/// Partial station update; `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct StationChanges {
    pub name: Option<String>,
    pub location: Option<Location>,
    pub station_type: Option<StationType>,
    pub total_slots: Option<i32>,
    pub operating_hours: Option<OperatingHours>,
    pub status: Option<StationStatus>,
    pub operator_id: Option<String>,
}

impl StationChanges {
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(slots) = self.total_slots {
            validate_total_slots(slots)?;
        }
        if let Some(loc) = &self.location {
            validate_coordinates(loc.latitude, loc.longitude)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StationFilter {
    pub status: Option<StationStatus>,
    pub station_type: Option<StationType>,
    pub operator_id: Option<String>,
}

impl StationFilter {
    pub fn matches(&self, s: &Station) -> bool {
        self.status.map_or(true, |st| s.status == st)
            && self.station_type.map_or(true, |t| s.station_type == t)
            && self.operator_id.as_ref().map_or(true, |o| &s.operator_id == o)
    }
}

pub fn validate_total_slots(total_slots: i32) -> Result<(), DomainError> {
    if !(MIN_SLOTS..=MAX_SLOTS).contains(&total_slots) {
        return Err(DomainError::Validation(format!(
            "Total slots must be between {} and {}, got {}",
            MIN_SLOTS, MAX_SLOTS, total_slots
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    let len = name.trim().chars().count();
    if len == 0 || len > 100 {
        return Err(DomainError::Validation(
            "Name must be between 1 and 100 characters".into(),
        ));
    }
    Ok(())
}

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), DomainError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(DomainError::Validation(format!(
            "Coordinates out of range: ({}, {})",
            latitude, longitude
        )));
    }
    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────
