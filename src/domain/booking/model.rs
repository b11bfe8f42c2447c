//! Booking domain entity

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::tariff::TariffSnapshot;
use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

/// Booking lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// No further mutation is permitted once terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Holds the slot for its window
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            "refunded" => Some(Self::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reservation of one slot for `[start_time, end_time)` by one requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: String,
    pub parking_id: String,
    pub slot_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Set on completion, may differ from `end_time`
    pub actual_end_time: Option<DateTime<Utc>>,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Price quoted at creation
    pub total_price: Decimal,
    /// Reconciled price, set on completion
    pub final_price: Option<Decimal>,
    /// Amount flagged for refund to the requester
    pub refund_due: Decimal,
    pub tariff: TariffSnapshot,
    pub vehicle_id: Option<String>,
    /// QR payload presented at the gate
    pub access_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Rejects empty or inverted windows.
    pub fn validate_interval(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<()> {
        if start >= end {
            return Err(DomainError::InvalidInterval(format!(
                "start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(())
    }

    pub fn planned_duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Half-open overlap with `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && start < self.end_time
    }

    /// Whether `at` falls inside the booked window
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }

    pub fn is_live(&self) -> bool {
        self.status.is_live()
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tariff::TariffUnit;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, h, m, 0).unwrap()
    }

    fn sample_booking(start: DateTime<Utc>, end: DateTime<Utc>) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            user_id: "U1".into(),
            parking_id: "P1".into(),
            slot_id: "S1".into(),
            start_time: start,
            end_time: end,
            actual_end_time: None,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            total_price: Decimal::new(2000, 2),
            final_price: None,
            refund_due: Decimal::ZERO,
            tariff: TariffSnapshot {
                tariff_id: 1,
                unit: TariffUnit::Hourly,
                unit_price: Decimal::new(1000, 2),
                currency: "EUR".into(),
            },
            vehicle_id: None,
            access_token: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn interval_must_be_non_empty() {
        assert!(Booking::validate_interval(at(9, 0), at(11, 0)).is_ok());
        assert!(matches!(
            Booking::validate_interval(at(9, 0), at(9, 0)),
            Err(DomainError::InvalidInterval(_))
        ));
        assert!(matches!(
            Booking::validate_interval(at(11, 0), at(9, 0)),
            Err(DomainError::InvalidInterval(_))
        ));
    }

    #[test]
    fn touching_windows_do_not_overlap() {
        let b = sample_booking(at(9, 0), at(11, 0));
        assert!(!b.overlaps(at(11, 0), at(12, 0)));
        assert!(!b.overlaps(at(8, 0), at(9, 0)));
    }

    #[test]
    fn partial_and_enclosing_windows_overlap() {
        let b = sample_booking(at(9, 0), at(11, 0));
        assert!(b.overlaps(at(10, 30), at(12, 0)));
        assert!(b.overlaps(at(8, 0), at(9, 1)));
        assert!(b.overlaps(at(9, 30), at(10, 0)));
        assert!(b.overlaps(at(8, 0), at(12, 0)));
    }

    #[test]
    fn covers_is_half_open() {
        let b = sample_booking(at(9, 0), at(11, 0));
        assert!(b.covers(at(9, 0)));
        assert!(b.covers(at(10, 59)));
        assert!(!b.covers(at(11, 0)));
    }

    #[test]
    fn terminal_states() {
        assert!(!BookingStatus::Pending.is_terminal());
        assert!(!BookingStatus::Active.is_terminal());
        assert!(BookingStatus::Completed.is_terminal());
        assert!(BookingStatus::Cancelled.is_terminal());
    }

    #[test]
    fn status_parse_rejects_unknown() {
        assert_eq!(BookingStatus::parse("active"), Some(BookingStatus::Active));
        assert_eq!(BookingStatus::parse("expired"), None);
        assert_eq!(PaymentStatus::parse("refunded"), Some(PaymentStatus::Refunded));
        assert_eq!(PaymentStatus::parse("void"), None);
    }

    #[test]
    fn serializes_with_record_field_names() {
        let b = sample_booking(at(9, 0), at(11, 0));
        let json = serde_json::to_value(&b).unwrap();
        for field in [
            "id",
            "userId",
            "parkingId",
            "slotId",
            "startTime",
            "endTime",
            "actualEndTime",
            "status",
            "paymentStatus",
            "totalPrice",
            "vehicleId",
            "accessToken",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
        assert_eq!(json["status"], "pending");
        let back: Booking = serde_json::from_value(json).unwrap();
        assert_eq!(back, b);
    }
}
