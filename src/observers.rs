use std::fmt;

use tracing::{info, info_span, warn};

use crate::events::LoanEvent;

/// Trait for loan lifecycle observation
pub trait LoanObserver: fmt::Debug {
    /// Called after a transition has been applied to the store
    fn on_loan_event(&self, event: &LoanEvent);
}

/// Writes loan transitions to the log under a span keyed by request id
#[derive(Debug)]
pub struct TransitionLogger;

impl LoanObserver for TransitionLogger {
    fn on_loan_event(&self, event: &LoanEvent) {
        let _span = info_span!("loan", request_id = %event.request_id()).entered();
        match event {
            LoanEvent::Borrowed { user_id, book_id, due_date, .. } => {
                info!(%user_id, %book_id, %due_date, "loan created");
            }
            LoanEvent::Renewed { due_date, renewals, .. } => {
                info!(%due_date, renewals, "loan renewed");
            }
            LoanEvent::Returned { book_id, days_overdue, fine, .. } => {
                info!(%book_id, days_overdue, %fine, "loan returned");
            }
        }
    }
}

/// Raises notices for transitions a librarian should act on
#[derive(Debug)]
pub struct NotificationService {
    /// Renewal count that exhausts a request
    pub max_renewals: u32,
}

impl LoanObserver for NotificationService {
    fn on_loan_event(&self, event: &LoanEvent) {
        match event {
            LoanEvent::Returned { request_id, days_overdue, fine, .. } if !fine.is_zero() => {
                warn!(%request_id, days_overdue, %fine, "book returned late, fine due");
            }
            LoanEvent::Renewed { request_id, renewals, .. } if *renewals >= self.max_renewals => {
                warn!(%request_id, "last renewal used, request cannot be renewed again");
            }
            _ => {}
        }
    }
}
