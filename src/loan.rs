use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::id::Id;

/// Where a loan request is in its lifecycle
///
/// `Active` is the only non-terminal state; `Returned` is final.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum LoanStatus {
    /// Book is out with the borrower
    #[default]
    Active,
    /// Book came back
    Returned,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Active => "Active",
            Self::Returned => "Returned",
        })
    }
}

/// One borrowing of one book by one user
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoanRequest {
    /// Unique identifier
    pub id: Id,
    /// Borrower
    pub user_id: Id,
    /// Borrowed book
    pub book_id: Id,
    /// Date the loan started
    pub borrow_date: NaiveDate,
    /// Date the book is due back
    pub due_date: NaiveDate,
    /// Date the book came back
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_date: Option<NaiveDate>,
    /// Lifecycle state
    #[serde(default)]
    pub status: LoanStatus,
    /// Number of renewals used
    #[serde(default)]
    pub renewals: u32,
}

impl LoanRequest {
    /// Whether the loan is still out
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Whether the loan is out and its due date precedes `today`
    #[must_use]
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.due_date < today
    }

    /// Whole days between the due date and `on`, zero when not late
    #[must_use]
    pub fn days_overdue(&self, on: NaiveDate) -> u32 {
        days_between(self.due_date, on)
    }
}

/// Whole days from `from` to `to`, zero when `to` is not after `from`
#[must_use]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    u32::try_from(to.signed_duration_since(from).num_days()).unwrap_or(0)
}

/// A flat-rate overdue fine, kept in hundredths of the currency unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Fine(u64);

impl Fine {
    /// No fine
    pub const ZERO: Self = Self(0);

    /// A fine of `cents` hundredths
    #[must_use]
    pub fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Fine for `days` late at `per_day_cents`
    #[must_use]
    pub fn for_days(days: u32, per_day_cents: u64) -> Self {
        Self(u64::from(days).saturating_mul(per_day_cents))
    }

    /// Amount in hundredths
    #[must_use]
    pub fn cents(self) -> u64 {
        self.0
    }

    /// Whether anything is owed
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Fine {
    #[allow(clippy::arithmetic_side_effects)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: a date from a literal
    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(date(2024, 3, 15), date(2024, 3, 20)), 5);
        assert_eq!(days_between(date(2024, 3, 15), date(2024, 3, 15)), 0);
        assert_eq!(days_between(date(2024, 3, 20), date(2024, 3, 15)), 0);
        assert_eq!(days_between(date(2024, 2, 28), date(2024, 3, 1)), 2);
    }

    #[test]
    fn test_fine_display() {
        assert_eq!(Fine::for_days(5, 100).to_string(), "5.00");
        assert_eq!(Fine::from_cents(1234).to_string(), "12.34");
        assert_eq!(Fine::ZERO.to_string(), "0.00");
        assert!(Fine::for_days(0, 100).is_zero());
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_legacy_record_loads() {
        let json = r#"{
            "id": 1, "user_id": "1", "book_id": "3",
            "borrow_date": "2024-03-01", "due_date": "2024-03-15",
            "status": "Active", "renewals": 0
        }"#;
        let request: LoanRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.book_id.get(), 3);
        assert_eq!(request.return_date, None);
        assert!(request.is_overdue(date(2024, 3, 16)));
        assert!(!request.is_overdue(date(2024, 3, 15)));
        assert_eq!(request.days_overdue(date(2024, 3, 20)), 5);
    }
}
