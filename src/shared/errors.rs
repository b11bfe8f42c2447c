use thiserror::Error;
use uuid::Uuid;

use crate::domain::booking::BookingStatus;

#[derive(Debug, Clone, Error)]
pub enum DomainError {
    /// `conflicting` is `None` when the slot is blocked by maintenance.
    #[error("Slot {slot_id} is not available for the requested window")]
    SlotConflict {
        slot_id: String,
        conflicting: Option<Uuid>,
    },

    #[error("Invalid transition: cannot {action} a booking in state {from}")]
    InvalidTransition {
        from: BookingStatus,
        action: &'static str,
    },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Tariff terms the pricing rules cannot represent exactly
    #[error("Invalid tariff: {0}")]
    InvalidTariff(String),

    #[error("Slot {0} is busy, retry later")]
    Busy(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Optimistic version check lost against a concurrent writer
    #[error("Stale version for slot {slot_id}: expected {expected}, found {actual}")]
    StaleVersion {
        slot_id: String,
        expected: i64,
        actual: i64,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    /// A stored record that cannot be decoded, or a value the store cannot
    /// hold. Retrying does not help.
    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, field: &'static str, value: impl ToString) -> Self {
        Self::NotFound {
            entity,
            field,
            value: value.to_string(),
        }
    }

    /// Stable, caller-facing code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SlotConflict { .. } => "slot_conflict",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::InvalidInterval(_) => "invalid_interval",
            Self::InvalidTariff(_) => "invalid_tariff",
            Self::InvalidRecord(_) => "invalid_record",
            Self::Busy(_) | Self::StaleVersion { .. } => "busy",
            Self::Unavailable(_) | Self::Storage(_) => "unavailable",
        }
    }

    /// Whether this error is transient and the critical section may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StaleVersion { .. } | Self::Storage(_))
    }

    /// Map an error that survived the retry budget to its caller-facing form.
    pub fn exhausted(self, slot_id: &str) -> Self {
        match self {
            Self::StaleVersion { .. } => Self::Busy(slot_id.to_string()),
            Self::Storage(msg) => Self::Unavailable(msg),
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
