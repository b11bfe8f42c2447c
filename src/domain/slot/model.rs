//! Parking slot domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::booking::{Booking, BookingStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotCategory {
    #[default]
    Standard,
    Disabled,
    Electric,
    Family,
}

impl SlotCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Disabled => "disabled",
            Self::Electric => "electric",
            Self::Family => "family",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "disabled" => Some(Self::Disabled),
            "electric" => Some(Self::Electric),
            "family" => Some(Self::Family),
            _ => None,
        }
    }
}

impl std::fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Occupancy view of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Occupied,
    Reserved,
    Maintenance,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParkingSlot {
    pub id: String,
    pub parking_id: String,
    pub category: SlotCategory,
    /// Externally set override, blocks every booking
    pub maintenance: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ParkingSlot {
    pub fn new(
        id: impl Into<String>,
        parking_id: impl Into<String>,
        category: SlotCategory,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            parking_id: parking_id.into(),
            category,
            maintenance: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derive the slot's status from its bookings at `now`.
    ///
    /// Pure function of its inputs; terminal bookings are ignored.
    pub fn derive_status(&self, bookings: &[Booking], now: DateTime<Utc>) -> SlotStatus {
        if self.maintenance {
            return SlotStatus::Maintenance;
        }

        let live = || {
            bookings
                .iter()
                .filter(|b| b.slot_id == self.id && b.is_live())
        };

        if live().any(|b| b.status == BookingStatus::Active && b.covers(now)) {
            SlotStatus::Occupied
        } else if live().any(|b| b.end_time > now) {
            SlotStatus::Reserved
        } else {
            SlotStatus::Available
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
