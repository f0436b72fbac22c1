//! Charging station entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    // Location
    pub address: String,
    pub city: String,
    pub district: String,
    pub latitude: f64,
    pub longitude: f64,

    /// AC or DC
    pub station_type: String,

    pub total_slots: i32,
    pub available_slots: i32,

    // Operating hours, "HH:MM:SS"
    pub open_time: String,
    pub close_time: String,
    pub is_open_24_hours: bool,

    /// Active, Inactive, Maintenance
    pub status: String,

    pub operator_id: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
