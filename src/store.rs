//! In-memory collections of books, users and loan requests.
//!
//! The store owns every record. Records refer to each other only by [`Id`],
//! and every cross-reference is resolved through a lookup that may miss.

use std::{collections::BTreeMap, fmt};

use tracing::debug;

use crate::{
    book::{Book, BookStatus},
    error::Entity,
    id::{Id, IdError},
    loan::LoanRequest,
    user::User,
};

/// A record kept in a [`Collection`]
pub trait Record {
    /// Which collection the record belongs to
    const ENTITY: Entity;

    /// The record's identifier
    fn id(&self) -> Id;
}

impl Record for Book {
    const ENTITY: Entity = Entity::Book;

    fn id(&self) -> Id {
        self.id
    }
}

impl Record for User {
    const ENTITY: Entity = Entity::User;

    fn id(&self) -> Id {
        self.id
    }
}

impl Record for LoanRequest {
    const ENTITY: Entity = Entity::Request;

    fn id(&self) -> Id {
        self.id
    }
}

/// Records of one kind, ordered by identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection<T> {
    /// Records keyed by their identifier
    records: BTreeMap<Id, T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { records: BTreeMap::new() }
    }
}

impl<T: Record> Collection<T> {
    /// Build a collection from loaded records; a repeated identifier keeps the last record
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = T>) -> Self {
        Self { records: records.into_iter().map(|r| (r.id(), r)).collect() }
    }

    /// One greater than the largest identifier, or 1 when empty
    ///
    /// # Errors
    ///
    /// Returns `IdError::Exhausted` when the largest identifier is `u32::MAX`.
    pub fn next_id(&self) -> Result<Id, IdError> {
        let next = match self.records.last_key_value() {
            Some((last, _)) => last.next()?,
            None => Id::FIRST,
        };
        debug!(entity = %T::ENTITY, id = %next, "assigned identifier");
        Ok(next)
    }

    /// Look up a record
    #[must_use]
    pub fn get(&self, id: Id) -> Option<&T> {
        self.records.get(&id)
    }

    /// Look up a record for mutation
    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        self.records.get_mut(&id)
    }

    /// Whether a record with this identifier exists
    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        self.records.contains_key(&id)
    }

    /// Insert a record under its own identifier, replacing any previous one
    pub(crate) fn insert(&mut self, record: T) {
        self.records.insert(record.id(), record);
    }

    /// Remove a record. Only the owning manager's guarded delete calls this.
    pub(crate) fn remove(&mut self, id: Id) -> Option<T> {
        self.records.remove(&id)
    }

    /// Records in ascending identifier order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.values()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection holds no record
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a, T: Record> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::collections::btree_map::Values<'a, Id, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}

/// All library state: the three collections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityStore {
    /// Catalog
    pub(crate) books: Collection<Book>,
    /// Patrons
    pub(crate) users: Collection<User>,
    /// Loan requests, active and returned
    pub(crate) requests: Collection<LoanRequest>,
}

impl EntityStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a store from loaded records
    #[must_use]
    pub fn from_parts(books: Vec<Book>, users: Vec<User>, requests: Vec<LoanRequest>) -> Self {
        Self {
            books: Collection::from_records(books),
            users: Collection::from_records(users),
            requests: Collection::from_records(requests),
        }
    }

    /// The catalog
    #[must_use]
    pub fn books(&self) -> &Collection<Book> {
        &self.books
    }

    /// The patrons
    #[must_use]
    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    /// Every loan request ever made
    #[must_use]
    pub fn requests(&self) -> &Collection<LoanRequest> {
        &self.requests
    }

    /// Look up a book
    #[must_use]
    pub fn book(&self, id: Id) -> Option<&Book> {
        self.books.get(id)
    }

    /// Look up a user
    #[must_use]
    pub fn user(&self, id: Id) -> Option<&User> {
        self.users.get(id)
    }

    /// Look up a loan request
    #[must_use]
    pub fn request(&self, id: Id) -> Option<&LoanRequest> {
        self.requests.get(id)
    }

    /// Title of a book, or "Unknown" when it no longer resolves
    #[must_use]
    pub fn book_title(&self, id: Id) -> &str {
        self.books.get(id).map_or(UNKNOWN, |b| b.title.as_str())
    }

    /// Name of a user, or "Unknown" when it no longer resolves
    #[must_use]
    pub fn user_name(&self, id: Id) -> &str {
        self.users.get(id).map_or(UNKNOWN, |u| u.name.as_str())
    }

    /// The active request holding a book, if any
    #[must_use]
    pub fn active_request_for_book(&self, book_id: Id) -> Option<&LoanRequest> {
        self.requests.iter().find(|r| r.is_active() && r.book_id == book_id)
    }

    /// Active requests held by a user, in identifier order
    pub fn active_requests_for_user(&self, user_id: Id) -> impl Iterator<Item = &LoanRequest> {
        self.requests.iter().filter(move |r| r.is_active() && r.user_id == user_id)
    }

    /// Whether the store has no record at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty() && self.users.is_empty() && self.requests.is_empty()
    }

    /// Check the cross-entity invariants and report every violation
    ///
    /// `borrowing_cap` and `max_renewals` come from the lending policy in
    /// force. An empty result means the store is consistent.
    #[must_use]
    pub fn audit(&self, borrowing_cap: u32, max_renewals: u32) -> Vec<Inconsistency> {
        let mut findings = Vec::new();

        let mut active_by_book: BTreeMap<Id, usize> = BTreeMap::new();
        let mut active_by_user: BTreeMap<Id, u32> = BTreeMap::new();
        for request in self.requests.iter().filter(|r| r.is_active()) {
            let per_book = active_by_book.entry(request.book_id).or_insert(0);
            *per_book = per_book.saturating_add(1);
            let per_user = active_by_user.entry(request.user_id).or_insert(0);
            *per_user = per_user.saturating_add(1);

            if !self.books.contains(request.book_id) {
                findings.push(Inconsistency::DanglingBook {
                    request_id: request.id,
                    book_id: request.book_id,
                });
            }
            if !self.users.contains(request.user_id) {
                findings.push(Inconsistency::DanglingUser {
                    request_id: request.id,
                    user_id: request.user_id,
                });
            }
            if request.renewals > max_renewals {
                findings.push(Inconsistency::TooManyRenewals {
                    request_id: request.id,
                    renewals: request.renewals,
                });
            }
        }

        for book in &self.books {
            let active = active_by_book.get(&book.id).copied().unwrap_or(0);
            let borrowed = book.status == BookStatus::Borrowed;
            if borrowed != (active == 1) {
                findings.push(Inconsistency::BookStatus {
                    book_id: book.id,
                    status: book.status,
                    active_requests: active,
                });
            }
        }

        for user in &self.users {
            let active = active_by_user.get(&user.id).copied().unwrap_or(0);
            if user.active_borrowings != active {
                findings.push(Inconsistency::UserCounter {
                    user_id: user.id,
                    recorded: user.active_borrowings,
                    actual: active,
                });
            }
            if active > borrowing_cap {
                findings.push(Inconsistency::OverCap { user_id: user.id, active });
            }
        }

        findings
    }
}

/// Placeholder for a foreign key that no longer resolves
pub const UNKNOWN: &str = "Unknown";

/// A broken cross-entity invariant found by [`EntityStore::audit`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// Book status disagrees with the number of active requests on it
    BookStatus {
        /// Book involved
        book_id: Id,
        /// Recorded status
        status: BookStatus,
        /// Active requests referencing the book
        active_requests: usize,
    },
    /// User's active counter disagrees with the active requests
    UserCounter {
        /// User involved
        user_id: Id,
        /// Counter on the record
        recorded: u32,
        /// Active requests referencing the user
        actual: u32,
    },
    /// User holds more loans than the cap allows
    OverCap {
        /// User involved
        user_id: Id,
        /// Active requests referencing the user
        active: u32,
    },
    /// Active request names a book that does not exist
    DanglingBook {
        /// Request involved
        request_id: Id,
        /// Missing book
        book_id: Id,
    },
    /// Active request names a user that does not exist
    DanglingUser {
        /// Request involved
        request_id: Id,
        /// Missing user
        user_id: Id,
    },
    /// Request was renewed past the limit
    TooManyRenewals {
        /// Request involved
        request_id: Id,
        /// Renewals recorded
        renewals: u32,
    },
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BookStatus { book_id, status, active_requests } => write!(
                f,
                "book {book_id} is {status} but has {active_requests} active request(s)"
            ),
            Self::UserCounter { user_id, recorded, actual } => write!(
                f,
                "user {user_id} records {recorded} active borrowing(s) but has {actual}"
            ),
            Self::OverCap { user_id, active } => {
                write!(f, "user {user_id} holds {active} loans, above the cap")
            }
            Self::DanglingBook { request_id, book_id } => {
                write!(f, "request {request_id} references missing book {book_id}")
            }
            Self::DanglingUser { request_id, user_id } => {
                write!(f, "request {request_id} references missing user {user_id}")
            }
            Self::TooManyRenewals { request_id, renewals } => {
                write!(f, "request {request_id} was renewed {renewals} times")
            }
        }
    }
}

#[cfg(test)]
mod tests;
