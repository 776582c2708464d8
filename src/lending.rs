//! The loan lifecycle: borrow, renew, return, and the overdue queries.
//!
//! A request moves `Active -> Returned` and never back. Renewal is a
//! self-transition on `Active` that pushes the due date out. Each operation
//! checks every precondition before it touches the store, so a failure
//! leaves books, users and requests exactly as they were.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::{
    book::BookStatus,
    clock::Clock,
    config::LendingPolicy,
    error::{Conflict, Entity, LibraryError},
    events::LoanEvent,
    id::Id,
    loan::{Fine, LoanRequest, LoanStatus, days_between},
    observers::LoanObserver,
    store::{EntityStore, UNKNOWN},
};

/// Number of entries in the popularity ranking
pub const POPULAR_LIMIT: usize = 10;

/// Outcome of a successful borrow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowReceipt {
    /// The new request
    pub request_id: Id,
    /// Title of the borrowed book
    pub book_title: String,
    /// Loan start
    pub borrow_date: NaiveDate,
    /// Loan end
    pub due_date: NaiveDate,
}

/// Outcome of a successful return
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnReceipt {
    /// The closed request
    pub request_id: Id,
    /// Returned book
    pub book_id: Id,
    /// Its title, "Unknown" if the book is gone
    pub book_title: String,
    /// Date stamped on the request
    pub return_date: NaiveDate,
    /// Whole days past the due date, 0 when on time
    pub days_overdue: u32,
    /// Fine owed, zero when on time
    pub fine: Fine,
}

/// Outcome of a successful renewal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewReceipt {
    /// The renewed request
    pub request_id: Id,
    /// Extended due date
    pub due_date: NaiveDate,
    /// Renewals used so far
    pub renewals: u32,
}

/// An active request past its due date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverdueLoan {
    /// The request
    pub request_id: Id,
    /// Borrower
    pub user_id: Id,
    /// Borrower's name, "Unknown" if the user is gone
    pub user_name: String,
    /// Borrowed book
    pub book_id: Id,
    /// Its title, "Unknown" if the book is gone
    pub book_title: String,
    /// Date it was due
    pub due_date: NaiveDate,
    /// Whole days past due
    pub days_overdue: u32,
}

/// A book and how often it was ever borrowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopularBook {
    /// The book
    pub book_id: Id,
    /// Its title, "Unknown" if the book is gone
    pub title: String,
    /// Requests ever made for it
    pub borrow_count: usize,
}

/// Overdue active requests grouped by days overdue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverdueDistribution {
    /// Days overdue to number of requests
    pub by_days: BTreeMap<u32, usize>,
    /// Number of overdue requests
    pub total: usize,
}

/// A request joined with the names it refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestRow<'s> {
    /// The request
    pub request: &'s LoanRequest,
    /// Borrower's name, "Unknown" if the user is gone
    pub user_name: &'s str,
    /// Book title, "Unknown" if the book is gone
    pub book_title: &'s str,
}

/// The loan state machine
#[derive(Debug)]
pub struct Lending<'a> {
    /// Shared library state
    store: &'a mut EntityStore,
    /// Date source for borrow, due and return dates
    clock: &'a dyn Clock,
    /// Loan periods, caps and fine rate
    policy: &'a LendingPolicy,
    /// Notified after each applied transition
    observers: &'a [Box<dyn LoanObserver>],
}

impl<'a> Lending<'a> {
    /// Create a lending view over `store`
    pub fn new(
        store: &'a mut EntityStore,
        clock: &'a dyn Clock,
        policy: &'a LendingPolicy,
        observers: &'a [Box<dyn LoanObserver>],
    ) -> Self {
        Self { store, clock, policy, observers }
    }

    /// Lend a book to a user
    ///
    /// Preconditions are checked in order and the first failure wins: the
    /// user exists, the book exists, the book is available, the user is below
    /// the borrowing cap.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` for a missing user or book,
    /// `Conflict::BookNotAvailable` when the book is out and
    /// `Conflict::BorrowingLimitReached` when the user is at the cap.
    pub fn borrow(&mut self, user_id: Id, book_id: Id) -> Result<BorrowReceipt, LibraryError> {
        let user =
            self.store.user(user_id).ok_or(LibraryError::not_found(Entity::User, user_id))?;
        let book =
            self.store.book(book_id).ok_or(LibraryError::not_found(Entity::Book, book_id))?;
        if !book.is_available() {
            return Err(Conflict::BookNotAvailable.into());
        }
        if user.active_borrowings >= self.policy.borrowing_cap {
            return Err(Conflict::BorrowingLimitReached { cap: self.policy.borrowing_cap }.into());
        }
        let book_title = book.title.clone();
        let request_id =
            self.store.requests.next_id().map_err(|_| LibraryError::IdsExhausted(Entity::Request))?;

        let borrow_date = self.clock.today();
        let due_date = add_days(borrow_date, self.policy.loan_days);

        self.store.requests.insert(LoanRequest {
            id: request_id,
            user_id,
            book_id,
            borrow_date,
            due_date,
            return_date: None,
            status: LoanStatus::Active,
            renewals: 0,
        });
        if let Some(book) = self.store.books.get_mut(book_id) {
            book.status = BookStatus::Borrowed;
        }
        if let Some(user) = self.store.users.get_mut(user_id) {
            user.record_borrow();
        }

        self.notify(&LoanEvent::Borrowed { request_id, user_id, book_id, due_date });
        Ok(BorrowReceipt { request_id, book_title, borrow_date, due_date })
    }

    /// Close an active request and free its book
    ///
    /// The fine is the number of whole days between the due date and today
    /// times the daily rate, or zero when the book is on time.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::ActiveRequestNotFound` when no request has this
    /// identifier or it was already returned.
    pub fn return_book(&mut self, request_id: Id) -> Result<ReturnReceipt, LibraryError> {
        let request = self
            .store
            .requests
            .get_mut(request_id)
            .filter(|r| r.is_active())
            .ok_or(LibraryError::ActiveRequestNotFound(request_id))?;

        let return_date = self.clock.today();
        request.status = LoanStatus::Returned;
        request.return_date = Some(return_date);
        let (book_id, user_id) = (request.book_id, request.user_id);
        let days_overdue = days_between(request.due_date, return_date);
        let fine = Fine::for_days(days_overdue, self.policy.fine_per_day_cents);

        let book_title = match self.store.books.get_mut(book_id) {
            Some(book) => {
                book.status = BookStatus::Available;
                book.title.clone()
            }
            None => UNKNOWN.to_string(),
        };
        if let Some(user) = self.store.users.get_mut(user_id) {
            user.record_return();
        }

        self.notify(&LoanEvent::Returned { request_id, book_id, days_overdue, fine });
        Ok(ReturnReceipt { request_id, book_id, book_title, return_date, days_overdue, fine })
    }

    /// Extend an active request's due date by one renewal period
    ///
    /// The extension counts from the current due date, not from today.
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::ActiveRequestNotFound` when no request has this
    /// identifier or it was already returned, and
    /// `Conflict::MaxRenewalsReached` when the renewals are used up.
    pub fn renew(&mut self, request_id: Id) -> Result<RenewReceipt, LibraryError> {
        let max = self.policy.max_renewals;
        let request = self
            .store
            .requests
            .get_mut(request_id)
            .filter(|r| r.is_active())
            .ok_or(LibraryError::ActiveRequestNotFound(request_id))?;
        if request.renewals >= max {
            return Err(Conflict::MaxRenewalsReached { max }.into());
        }

        request.due_date = add_days(request.due_date, self.policy.renewal_days);
        request.renewals = request.renewals.saturating_add(1);
        let receipt =
            RenewReceipt { request_id, due_date: request.due_date, renewals: request.renewals };

        self.notify(&LoanEvent::Renewed {
            request_id,
            due_date: receipt.due_date,
            renewals: receipt.renewals,
        });
        Ok(receipt)
    }

    /// Active requests due before `today`, resolved against users and books
    ///
    /// The sequence is computed afresh on every call and borrows the store
    /// only while it is iterated.
    pub fn list_overdue(&self, today: NaiveDate) -> impl Iterator<Item = OverdueLoan> {
        let store: &EntityStore = &*self.store;
        store.requests.iter().filter(move |r| r.is_overdue(today)).map(move |r| OverdueLoan {
            request_id: r.id,
            user_id: r.user_id,
            user_name: store.user_name(r.user_id).to_string(),
            book_id: r.book_id,
            book_title: store.book_title(r.book_id).to_string(),
            due_date: r.due_date,
            days_overdue: r.days_overdue(today),
        })
    }

    /// The ten most borrowed books over every request ever made
    ///
    /// Ties keep the order in which the books were first borrowed.
    #[must_use]
    pub fn popularity_ranking(&self) -> Vec<PopularBook> {
        let mut order: Vec<(Id, usize)> = Vec::new();
        let mut slots: BTreeMap<Id, usize> = BTreeMap::new();
        for request in &self.store.requests {
            match slots.get(&request.book_id) {
                Some(&slot) => {
                    if let Some(entry) = order.get_mut(slot) {
                        entry.1 = entry.1.saturating_add(1);
                    }
                }
                None => {
                    slots.insert(request.book_id, order.len());
                    order.push((request.book_id, 1));
                }
            }
        }

        order.sort_by(|a, b| b.1.cmp(&a.1));
        order
            .into_iter()
            .take(POPULAR_LIMIT)
            .map(|(book_id, borrow_count)| PopularBook {
                book_id,
                title: self.store.book_title(book_id).to_string(),
                borrow_count,
            })
            .collect()
    }

    /// Overdue active requests bucketed by whole days overdue on `today`
    #[must_use]
    pub fn overdue_distribution(&self, today: NaiveDate) -> OverdueDistribution {
        let mut distribution = OverdueDistribution::default();
        for request in self.store.requests.iter().filter(|r| r.is_overdue(today)) {
            let bucket = distribution.by_days.entry(request.days_overdue(today)).or_insert(0);
            *bucket = bucket.saturating_add(1);
            distribution.total = distribution.total.saturating_add(1);
        }
        debug!(total = distribution.total, %today, "computed overdue distribution");
        distribution
    }

    /// Every request, joined with user names and book titles
    #[must_use]
    pub fn requests(&self) -> Vec<RequestRow<'_>> {
        let store: &EntityStore = &*self.store;
        store
            .requests
            .iter()
            .map(|request| RequestRow {
                request,
                user_name: store.user_name(request.user_id),
                book_title: store.book_title(request.book_id),
            })
            .collect()
    }

    /// Tell every observer about an applied transition
    fn notify(&self, event: &LoanEvent) {
        for observer in self.observers {
            observer.on_loan_event(event);
        }
    }
}

/// `date` moved `days` forward, saturating at the last representable date
fn add_days(date: NaiveDate, days: u32) -> NaiveDate {
    date.checked_add_days(Days::new(u64::from(days))).unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests;
