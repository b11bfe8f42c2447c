//! Tariff domain entity

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::DomainResult;
use crate::shared::errors::DomainError;

/// Billing unit of a tariff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TariffUnit {
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl TariffUnit {
    /// Length of one billing unit in minutes. A month is 30 days.
    pub fn minutes(&self) -> i64 {
        match self {
            Self::Hourly => 60,
            Self::Daily => 60 * 24,
            Self::Weekly => 60 * 24 * 7,
            Self::Monthly => 60 * 24 * 30,
        }
    }

    pub fn seconds(&self) -> i64 {
        self.minutes() * 60
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hourly => "hourly",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hourly" => Some(Self::Hourly),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

impl std::fmt::Display for TariffUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pricing rule for a parking site (or for every site when `parking_id` is `None`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub id: i32,
    pub name: String,
    pub parking_id: Option<String>,
    pub unit: TariffUnit,
    /// Price of one unit, 2 decimal places
    pub unit_price: Decimal,
    /// Currency code (ISO 4217)
    pub currency: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tariff {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        unit: TariffUnit,
        unit_price: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            name: name.into(),
            parking_id: None,
            unit,
            unit_price,
            currency: currency.into(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn for_parking(mut self, parking_id: impl Into<String>) -> Self {
        self.parking_id = Some(parking_id.into());
        self
    }

    /// Whether this tariff may be applied to a slot of `parking_id`
    pub fn applies_to(&self, parking_id: &str) -> bool {
        self.is_active
            && self
                .parking_id
                .as_deref()
                .map_or(true, |scoped| scoped == parking_id)
    }

    /// Unit prices are whole cents and non-negative, so every store holds
    /// them exactly and quotes agree across stores.
    pub fn validate(&self) -> DomainResult<()> {
        if self.unit_price.is_sign_negative() {
            return Err(DomainError::InvalidTariff(format!(
                "tariff {} has negative unit price {}",
                self.id, self.unit_price
            )));
        }
        if self.unit_price.normalize().scale() > 2 {
            return Err(DomainError::InvalidTariff(format!(
                "tariff {} unit price {} has more than 2 decimal places",
                self.id, self.unit_price
            )));
        }
        if self.currency.trim().is_empty() {
            return Err(DomainError::InvalidTariff(format!(
                "tariff {} has no currency",
                self.id
            )));
        }
        Ok(())
    }

    pub fn snapshot(&self) -> TariffSnapshot {
        TariffSnapshot {
            tariff_id: self.id,
            unit: self.unit,
            unit_price: self.unit_price,
            currency: self.currency.clone(),
        }
    }
}

/// Pricing terms frozen onto a booking when it is quoted. Later edits to the
/// tariff never change an existing booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TariffSnapshot {
    pub tariff_id: i32,
    pub unit: TariffUnit,
    pub unit_price: Decimal,
    pub currency: String,
}

// ── Tests ──────────────────────────────────────────────────────
