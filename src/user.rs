use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::Id;

/// A library patron
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    /// Unique identifier
    pub id: Id,
    /// Full name
    pub name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Contact phone
    #[serde(default)]
    pub phone: String,
    /// Postal address
    #[serde(default)]
    pub address: String,
    /// Date the patron registered
    pub date_joined: NaiveDate,
    /// Loans currently out
    #[serde(default)]
    pub active_borrowings: u32,
    /// Loans ever taken, never decremented
    #[serde(default)]
    pub total_borrowings: u32,
}

impl User {
    /// Whether the patron holds any loan
    #[must_use]
    pub fn has_active_loans(&self) -> bool {
        self.active_borrowings > 0
    }

    /// Count a new loan against both counters
    pub(crate) fn record_borrow(&mut self) {
        self.active_borrowings = self.active_borrowings.saturating_add(1);
        self.total_borrowings = self.total_borrowings.saturating_add(1);
    }

    /// Release one active loan, never going below zero
    pub(crate) fn record_return(&mut self) {
        self.active_borrowings = self.active_borrowings.saturating_sub(1);
    }
}

/// Fields for a new patron
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Postal address
    pub address: String,
}

/// Partial update of a patron; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    /// New name
    pub name: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New phone
    pub phone: Option<String>,
    /// New address
    pub address: Option<String>,
}

impl UserUpdate {
    /// Whether the update would change nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
    }

    /// Apply the supplied fields to `user`
    pub(crate) fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(address) = self.address {
            user.address = address;
        }
    }
}
