use chrono::NaiveDate;
use serde::Serialize;

use crate::{id::Id, loan::Fine};

/// Lifecycle transitions of a loan request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum LoanEvent {
    /// A request was created in the Active state
    Borrowed {
        /// New request
        request_id: Id,
        /// Borrower
        user_id: Id,
        /// Borrowed book
        book_id: Id,
        /// Initial due date
        due_date: NaiveDate,
    },
    /// An Active request was renewed in place
    Renewed {
        /// Renewed request
        request_id: Id,
        /// Extended due date
        due_date: NaiveDate,
        /// Renewals used so far
        renewals: u32,
    },
    /// An Active request moved to Returned
    Returned {
        /// Closed request
        request_id: Id,
        /// Book back on the shelf
        book_id: Id,
        /// Whole days late
        days_overdue: u32,
        /// Fine owed
        fine: Fine,
    },
}

impl LoanEvent {
    /// The request the event is about
    #[must_use]
    pub fn request_id(&self) -> Id {
        match self {
            Self::Borrowed { request_id, .. }
            | Self::Renewed { request_id, .. }
            | Self::Returned { request_id, .. } => *request_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: an identifier from a literal
    fn id(raw: u32) -> Id {
        Id::new(raw).unwrap_or(Id::FIRST)
    }

    #[test]
    fn test_request_id_of_each_transition() {
        let due_date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default();
        let events = [
            LoanEvent::Borrowed { request_id: id(4), user_id: id(1), book_id: id(2), due_date },
            LoanEvent::Renewed { request_id: id(5), due_date, renewals: 1 },
            LoanEvent::Returned {
                request_id: id(6),
                book_id: id(2),
                days_overdue: 0,
                fine: Fine::ZERO,
            },
        ];
        let ids: Vec<Id> = events.iter().map(LoanEvent::request_id).collect();
        assert_eq!(ids, [id(4), id(5), id(6)]);
    }
}
