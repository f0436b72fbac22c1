//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use tracing::debug;

use crate::domain::booking::{Booking, BookingFilter, BookingRepository, BookingStatus};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::booking;

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let status = BookingStatus::parse(&m.status).ok_or_else(|| {
        DomainError::Storage(format!("booking {} has unknown status '{}'", m.id, m.status))
    })?;
    Ok(Booking {
        id: m.id,
        user_id: m.user_id,
        station_id: m.station_id,
        start_time: m.start_time,
        end_time: m.end_time,
        vehicle_type: m.vehicle_type,
        status,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(b: Booking) -> booking::ActiveModel {
    booking::ActiveModel {
        id: Set(b.id),
        user_id: Set(b.user_id),
        station_id: Set(b.station_id),
        start_time: Set(b.start_time),
        end_time: Set(b.end_time),
        vehicle_type: Set(b.vehicle_type),
        status: Set(b.status.as_str().to_string()),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    }
}

fn status_values(statuses: &[BookingStatus]) -> Vec<&'static str> {
    statuses.iter().map(|s| s.as_str()).collect()
}

fn collect(models: Vec<booking::Model>) -> DomainResult<Vec<Booking>> {
    models.into_iter().map(model_to_domain).collect()
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn save(&self, b: Booking) -> DomainResult<()> {
        debug!("Saving booking: {}", b.id);
        let id = b.id.clone();
        match domain_to_active(b).insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Err(
                DomainError::Conflict(format!("booking {} already exists", id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn update(&self, b: Booking) -> DomainResult<()> {
        debug!("Updating booking: {}", b.id);

        let existing = booking::Entity::find_by_id(b.id.clone()).one(&self.db).await?;
        if existing.is_none() {
            return Err(DomainError::not_found("Booking", b.id));
        }

        domain_to_active(b).update(&self.db).await?;
        Ok(())
    }

    async fn update_status(
        &self,
        id: &str,
        expected: BookingStatus,
        next: BookingStatus,
        at: DateTime<Utc>,
    ) -> DomainResult<()> {
        debug!("Updating booking status: {} {} -> {}", id, expected, next);

        let res = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(next.as_str()))
            .col_expr(booking::Column::UpdatedAt, Expr::value(at))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(expected.as_str()))
            .exec(&self.db)
            .await?;
        if res.rows_affected > 0 {
            return Ok(());
        }

        match self.find_by_id(id).await? {
            None => Err(DomainError::not_found("Booking", id)),
            Some(current) => Err(DomainError::Conflict(format!(
                "booking {} is {}, expected {}",
                id, current.status, expected
            ))),
        }
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let res = booking::Entity::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Err(DomainError::not_found("Booking", id));
        }
        Ok(())
    }

    async fn find(&self, filter: &BookingFilter) -> DomainResult<Vec<Booking>> {
        let mut query = booking::Entity::find();
        if let Some(user_id) = &filter.user_id {
            query = query.filter(booking::Column::UserId.eq(user_id.as_str()));
        }
        if let Some(station_id) = &filter.station_id {
            query = query.filter(booking::Column::StationId.eq(station_id.as_str()));
        }
        let models = query
            .order_by_asc(booking::Column::CreatedAt)
            .order_by_asc(booking::Column::Id)
            .all(&self.db)
            .await?;
        collect(models)
    }

    async fn find_overlapping(
        &self,
        station_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        statuses: &[BookingStatus],
        exclude_id: Option<&str>,
    ) -> DomainResult<Vec<Booking>> {
        let mut query = booking::Entity::find()
            .filter(booking::Column::StationId.eq(station_id))
            .filter(booking::Column::Status.is_in(status_values(statuses)))
            .filter(booking::Column::StartTime.lt(end))
            .filter(booking::Column::EndTime.gt(start));
        if let Some(id) = exclude_id {
            query = query.filter(booking::Column::Id.ne(id));
        }
        let models = query
            .order_by_asc(booking::Column::StartTime)
            .all(&self.db)
            .await?;
        collect(models)
    }

    async fn count_active_at(
        &self,
        station_id: &str,
        at: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> DomainResult<u64> {
        let count = booking::Entity::find()
            .filter(booking::Column::StationId.eq(station_id))
            .filter(booking::Column::Status.is_in(status_values(statuses)))
            .filter(booking::Column::StartTime.lte(at))
            .filter(booking::Column::EndTime.gte(at))
            .count(&self.db)
            .await?;
        Ok(count)
    }
}
