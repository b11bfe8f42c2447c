//! SeaORM implementation of BookingRepository
//!
//! Every commit runs in one transaction: the slot's row in `slot_versions`
//! is advanced only if it still holds the version the caller read, and the
//! booking row is upserted in the same transaction. A lost compare-and-set
//! rolls the whole write back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use super::{corrupt, db_err, from_minor_units, to_minor_units};
use crate::domain::booking::{
    Booking, BookingRepository, BookingStatus, PaymentStatus, SlotBookings,
};
use crate::domain::tariff::{TariffSnapshot, TariffUnit};
use crate::domain::DomainResult;
use crate::infrastructure::database::entities::{booking, slot_version};
use crate::shared::errors::DomainError;

const LIVE_STATUSES: [&str; 2] = ["pending", "active"];

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn current_version(&self, slot_id: &str) -> DomainResult<i64> {
        Ok(slot_version::Entity::find_by_id(slot_id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map_or(0, |v| v.version))
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let id = Uuid::parse_str(&m.id).map_err(|_| corrupt("Booking", "id", &m.id))?;
    let status =
        BookingStatus::parse(&m.status).ok_or_else(|| corrupt("Booking", "status", &m.status))?;
    let payment_status = PaymentStatus::parse(&m.payment_status)
        .ok_or_else(|| corrupt("Booking", "payment_status", &m.payment_status))?;
    let unit = TariffUnit::parse(&m.tariff_unit)
        .ok_or_else(|| corrupt("Booking", "tariff_unit", &m.tariff_unit))?;

    Ok(Booking {
        id,
        user_id: m.user_id,
        parking_id: m.parking_id,
        slot_id: m.slot_id,
        start_time: m.start_time,
        end_time: m.end_time,
        actual_end_time: m.actual_end_time,
        status,
        payment_status,
        total_price: from_minor_units(m.total_price),
        final_price: m.final_price.map(from_minor_units),
        refund_due: from_minor_units(m.refund_due),
        tariff: TariffSnapshot {
            tariff_id: m.tariff_id,
            unit,
            unit_price: from_minor_units(m.tariff_unit_price),
            currency: m.currency,
        },
        vehicle_id: m.vehicle_id,
        access_token: m.access_token,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

fn domain_to_active(b: &Booking) -> DomainResult<booking::ActiveModel> {
    Ok(booking::ActiveModel {
        id: Set(b.id.to_string()),
        user_id: Set(b.user_id.clone()),
        parking_id: Set(b.parking_id.clone()),
        slot_id: Set(b.slot_id.clone()),
        start_time: Set(b.start_time),
        end_time: Set(b.end_time),
        actual_end_time: Set(b.actual_end_time),
        status: Set(b.status.as_str().to_string()),
        payment_status: Set(b.payment_status.as_str().to_string()),
        total_price: Set(to_minor_units(b.total_price)?),
        final_price: Set(b.final_price.map(to_minor_units).transpose()?),
        refund_due: Set(to_minor_units(b.refund_due)?),
        tariff_id: Set(b.tariff.tariff_id),
        tariff_unit: Set(b.tariff.unit.as_str().to_string()),
        tariff_unit_price: Set(to_minor_units(b.tariff.unit_price)?),
        currency: Set(b.tariff.currency.clone()),
        vehicle_id: Set(b.vehicle_id.clone()),
        access_token: Set(b.access_token.clone()),
        created_at: Set(b.created_at),
        updated_at: Set(b.updated_at),
    })
}

fn models_to_domain(models: Vec<booking::Model>) -> DomainResult<Vec<Booking>> {
    models.into_iter().map(model_to_domain).collect()
}

/// Advance the slot's version from `expected` inside `txn`.
async fn advance_version(
    txn: &DatabaseTransaction,
    slot_id: &str,
    expected: i64,
) -> DomainResult<i64> {
    let stored = slot_version::Entity::find_by_id(slot_id.to_string())
        .one(txn)
        .await
        .map_err(db_err)?;

    let stale = |actual: i64| DomainError::StaleVersion {
        slot_id: slot_id.to_string(),
        expected,
        actual,
    };

    match stored {
        None if expected == 0 => {
            let row = slot_version::ActiveModel {
                slot_id: Set(slot_id.to_string()),
                version: Set(1),
            };
            // A concurrent first writer makes this insert fail; the
            // conflict clause turns that into "no row inserted".
            let inserted = slot_version::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(slot_version::Column::SlotId)
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(txn)
                .await
                .map_err(db_err)?;
            if inserted == 0 {
                return Err(stale(1));
            }
            Ok(1)
        }
        None => Err(stale(0)),
        Some(row) if row.version != expected => Err(stale(row.version)),
        Some(_) => {
            let next = expected + 1;
            let updated = slot_version::Entity::update_many()
                .col_expr(slot_version::Column::Version, Expr::value(next))
                .filter(slot_version::Column::SlotId.eq(slot_id))
                .filter(slot_version::Column::Version.eq(expected))
                .exec(txn)
                .await
                .map_err(db_err)?;
            if updated.rows_affected == 0 {
                return Err(stale(expected + 1));
            }
            Ok(next)
        }
    }
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id.to_string())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(model_to_domain)
            .transpose()
    }

    async fn find_by_user(&self, user_id: &str) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::UserId.eq(user_id))
            .order_by_desc(booking::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }

    async fn load_slot(&self, slot_id: &str) -> DomainResult<SlotBookings> {
        // Version first: a write landing between the two reads leaves the
        // snapshot at an older version, so the next commit fails stale
        // instead of acting on bookings it has not seen.
        let version = self.current_version(slot_id).await?;
        let models = booking::Entity::find()
            .filter(booking::Column::SlotId.eq(slot_id))
            .filter(booking::Column::Status.is_in(LIVE_STATUSES))
            .order_by_asc(booking::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(SlotBookings {
            slot_id: slot_id.to_string(),
            version,
            bookings: models_to_domain(models)?,
        })
    }

    async fn commit(&self, expected_version: i64, b: &Booking) -> DomainResult<i64> {
        let row = domain_to_active(b)?;
        let txn = self.db.begin().await.map_err(db_err)?;

        let version = match advance_version(&txn, &b.slot_id, expected_version).await {
            Ok(v) => v,
            Err(e) => {
                txn.rollback().await.map_err(db_err)?;
                return Err(e);
            }
        };

        booking::Entity::insert(row)
            .on_conflict(
                OnConflict::column(booking::Column::Id)
                    .update_columns([
                        booking::Column::ActualEndTime,
                        booking::Column::Status,
                        booking::Column::PaymentStatus,
                        booking::Column::TotalPrice,
                        booking::Column::FinalPrice,
                        booking::Column::RefundDue,
                        booking::Column::VehicleId,
                        booking::Column::AccessToken,
                        booking::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .map_err(db_err)?;

        txn.commit().await.map_err(db_err)?;
        debug!(booking_id = %b.id, slot_id = %b.slot_id, version, "Booking row committed");
        Ok(version)
    }

    async fn find_pending_started(&self, now: DateTime<Utc>) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::Status.eq(BookingStatus::Pending.as_str()))
            .filter(booking::Column::StartTime.lte(now))
            .order_by_asc(booking::Column::StartTime)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        models_to_domain(models)
    }
}
