//! SeaORM implementation of StationRepository

use async_trait::async_trait;
use chrono::{DateTime, NaiveTime, Utc};
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    SqlErr,
};
use tracing::debug;

use crate::domain::station::{
    Location, OperatingHours, Station, StationFilter, StationRepository, StationStatus, StationType,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::station;

const TIME_FORMAT: &str = "%H:%M:%S";

pub struct SeaOrmStationRepository {
    db: DatabaseConnection,
}

impl SeaOrmStationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// `UPDATE stations SET <columns>, updated_at = at WHERE id = ?`
    async fn set_columns(
        &self,
        id: &str,
        columns: Vec<(station::Column, SimpleExpr)>,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        let mut update = station::Entity::update_many()
            .col_expr(station::Column::UpdatedAt, Expr::value(at))
            .filter(station::Column::Id.eq(id));
        for (column, value) in columns {
            update = update.col_expr(column, value);
        }
        let res = update.exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(DomainError::not_found("Station", id));
        }
        Ok(())
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn corrupt(id: &str, what: &str, value: &str) -> DomainError {
    DomainError::Storage(format!("station {} has invalid {} '{}'", id, what, value))
}

fn parse_time(id: &str, value: &str) -> DomainResult<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| corrupt(id, "time", value))
}

fn model_to_domain(m: station::Model) -> DomainResult<Station> {
    let station_type =
        StationType::parse(&m.station_type).ok_or_else(|| corrupt(&m.id, "type", &m.station_type))?;
    let status =
        StationStatus::parse(&m.status).ok_or_else(|| corrupt(&m.id, "status", &m.status))?;
    let operating_hours = OperatingHours {
        open_time: parse_time(&m.id, &m.open_time)?,
        close_time: parse_time(&m.id, &m.close_time)?,
        is_open_24_hours: m.is_open_24_hours,
    };

    Ok(Station {
        id: m.id,
        name: m.name,
        location: Location {
            address: m.address,
            city: m.city,
            district: m.district,
            latitude: m.latitude,
            longitude: m.longitude,
        },
        station_type,
        total_slots: m.total_slots,
        available_slots: m.available_slots,
        operating_hours,
        status,
        operator_id: m.operator_id,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(s: Station) -> station::ActiveModel {
    station::ActiveModel {
        id: Set(s.id),
        name: Set(s.name),
        address: Set(s.location.address),
        city: Set(s.location.city),
        district: Set(s.location.district),
        latitude: Set(s.location.latitude),
        longitude: Set(s.location.longitude),
        station_type: Set(s.station_type.as_str().to_string()),
        total_slots: Set(s.total_slots),
        available_slots: Set(s.available_slots),
        open_time: Set(s.operating_hours.open_time.format(TIME_FORMAT).to_string()),
        close_time: Set(s.operating_hours.close_time.format(TIME_FORMAT).to_string()),
        is_open_24_hours: Set(s.operating_hours.is_open_24_hours),
        status: Set(s.status.as_str().to_string()),
        operator_id: Set(s.operator_id),
        created_at: Set(s.created_at),
        updated_at: Set(s.updated_at),
    }
}

// ── StationRepository impl ──────────────────────────────────────

#[async_trait]
impl StationRepository for SeaOrmStationRepository {
    async fn save(&self, s: Station) -> DomainResult<()> {
        debug!("Saving station: {}", s.id);
        let id = s.id.clone();
        match domain_to_active(s).insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                DomainError::Conflict(format!("station {} already exists", id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Station>> {
        station::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn update(&self, s: Station) -> DomainResult<()> {
        debug!("Updating station: {}", s.id);

        let existing = station::Entity::find_by_id(s.id.clone()).one(&self.db).await?;
        if existing.is_none() {
            return Err(DomainError::not_found("Station", s.id));
        }

        domain_to_active(s).update(&self.db).await?;
        Ok(())
    }

    async fn update_available_slots(
        &self,
        id: &str,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.set_columns(
            id,
            vec![(station::Column::AvailableSlots, Expr::value(available_slots))],
            at,
        )
        .await
    }

    async fn update_capacity(
        &self,
        id: &str,
        total_slots: i32,
        available_slots: i32,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        debug!("Updating station capacity: {} -> {}", id, total_slots);
        self.set_columns(
            id,
            vec![
                (station::Column::TotalSlots, Expr::value(total_slots)),
                (station::Column::AvailableSlots, Expr::value(available_slots)),
            ],
            at,
        )
        .await
    }

    async fn update_status(&self, id: &str, status: StationStatus, at: DateTime<Utc>) -> DomainResult<()> {
        debug!("Updating station status: {} -> {}", id, status);
        self.set_columns(
            id,
            vec![(station::Column::Status, Expr::value(status.as_str()))],
            at,
        )
        .await
    }

    async fn find(&self, filter: &StationFilter) -> DomainResult<Vec<Station>> {
        let mut query = station::Entity::find();
        if let Some(status) = filter.status {
            query = query.filter(station::Column::Status.eq(status.as_str()));
        }
        if let Some(station_type) = filter.station_type {
            query = query.filter(station::Column::StationType.eq(station_type.as_str()));
        }
        if let Some(operator_id) = &filter.operator_id {
            query = query.filter(station::Column::OperatorId.eq(operator_id.as_str()));
        }
        let models = query
            .order_by_asc(station::Column::CreatedAt)
            .order_by_asc(station::Column::Id)
            .all(&self.db)
            .await?;
        models.into_iter().map(model_to_domain).collect()
    }
}
