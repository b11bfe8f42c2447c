//! Caller identity as supplied by the auth provider.
//!
//! The engine trusts `(user_id, role)` as given and only uses it for
//! ownership and override checks.

use serde::{Deserialize, Serialize};

use super::booking::Booking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::User,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn owns(&self, booking: &Booking) -> bool {
        self.user_id == booking.user_id
    }

    /// Owner or administrator
    pub fn can_manage(&self, booking: &Booking) -> bool {
        self.is_admin() || self.owns(booking)
    }
}
