//! Patron management layered on the entity store.

use chrono::NaiveDate;
use tracing::info;

use crate::{
    clock::Clock,
    error::{Conflict, Entity, LibraryError},
    id::Id,
    store::EntityStore,
    user::{NewUser, User, UserUpdate},
};

/// One outstanding loan in a patron's history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Active request
    pub request_id: Id,
    /// Borrowed book
    pub book_id: Id,
    /// Its title, "Unknown" if the book is gone
    pub book_title: String,
    /// Loan start
    pub borrow_date: NaiveDate,
    /// Loan end
    pub due_date: NaiveDate,
}

/// A patron's borrowing summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowingHistory {
    /// Patron
    pub user_id: Id,
    /// Patron's name
    pub name: String,
    /// Loans currently out, as recorded on the patron
    pub active_borrowings: u32,
    /// Loans ever taken
    pub total_borrowings: u32,
    /// The patron's active requests joined with book titles
    pub current: Vec<HistoryEntry>,
}

/// User CRUD and history queries
#[derive(Debug)]
pub struct Patrons<'a> {
    /// Shared library state
    store: &'a mut EntityStore,
    /// Date source for `date_joined`
    clock: &'a dyn Clock,
}

impl<'a> Patrons<'a> {
    /// Create a patron view over `store`
    pub fn new(store: &'a mut EntityStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Register a patron with zeroed counters
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::IdsExhausted` only when no identifier is left.
    pub fn add_user(&mut self, new: NewUser) -> Result<&User, LibraryError> {
        let id = self.store.users.next_id().map_err(|_| LibraryError::IdsExhausted(Entity::User))?;
        let user = User {
            id,
            name: new.name,
            email: new.email,
            phone: new.phone,
            address: new.address,
            date_joined: self.clock.today(),
            active_borrowings: 0,
            total_borrowings: 0,
        };
        info!(user_id = %id, name = %user.name, "user added");
        self.store.users.insert(user);
        self.store.users.get(id).ok_or(LibraryError::not_found(Entity::User, id))
    }

    /// Overwrite the supplied fields of a patron
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no user has this identifier.
    pub fn update_user(&mut self, id: Id, update: UserUpdate) -> Result<&User, LibraryError> {
        let user =
            self.store.users.get_mut(id).ok_or(LibraryError::not_found(Entity::User, id))?;
        update.apply_to(user);
        info!(user_id = %id, "user updated");
        Ok(&*user)
    }

    /// Remove a patron who holds no loan
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no user has this identifier and
    /// `Conflict::UserHasActiveLoans` if the user still has books out.
    pub fn delete_user(&mut self, id: Id) -> Result<User, LibraryError> {
        let user = self.store.users.get(id).ok_or(LibraryError::not_found(Entity::User, id))?;
        if user.has_active_loans() {
            return Err(Conflict::UserHasActiveLoans { active: user.active_borrowings }.into());
        }
        let removed =
            self.store.users.remove(id).ok_or(LibraryError::not_found(Entity::User, id))?;
        info!(user_id = %id, name = %removed.name, "user deleted");
        Ok(removed)
    }

    /// Counters and outstanding loans of one patron
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no user has this identifier.
    pub fn history(&self, id: Id) -> Result<BorrowingHistory, LibraryError> {
        let user = self.store.user(id).ok_or(LibraryError::not_found(Entity::User, id))?;
        let current = self
            .store
            .active_requests_for_user(id)
            .map(|r| HistoryEntry {
                request_id: r.id,
                book_id: r.book_id,
                book_title: self.store.book_title(r.book_id).to_string(),
                borrow_date: r.borrow_date,
                due_date: r.due_date,
            })
            .collect();
        Ok(BorrowingHistory {
            user_id: id,
            name: user.name.clone(),
            active_borrowings: user.active_borrowings,
            total_borrowings: user.total_borrowings,
            current,
        })
    }

    /// Look up one patron
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no user has this identifier.
    pub fn user(&self, id: Id) -> Result<&User, LibraryError> {
        self.store.user(id).ok_or(LibraryError::not_found(Entity::User, id))
    }

    /// Every patron, in identifier order
    #[must_use]
    pub fn users(&self) -> Vec<&User> {
        self.store.users.iter().collect()
    }
}

#[cfg(test)]
mod tests;
