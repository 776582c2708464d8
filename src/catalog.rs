//! Book management layered on the entity store.

use chrono::NaiveDate;
use tracing::info;

use crate::{
    book::{Book, BookStatus, BookUpdate, NewBook},
    clock::Clock,
    error::{Conflict, Entity, LibraryError},
    id::Id,
    store::EntityStore,
};

/// Who holds a borrowed book and until when
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentLoan {
    /// Active request on the book
    pub request_id: Id,
    /// Borrower
    pub user_id: Id,
    /// Due date of the active request
    pub due_date: NaiveDate,
}

/// Result of an availability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    /// Book checked
    pub book_id: Id,
    /// Its title
    pub title: String,
    /// Its recorded status
    pub status: BookStatus,
    /// The active loan, when the book is borrowed and one is on record
    pub loan: Option<CurrentLoan>,
}

/// Book CRUD and availability queries
#[derive(Debug)]
pub struct Catalog<'a> {
    /// Shared library state
    store: &'a mut EntityStore,
    /// Date source for `date_added`
    clock: &'a dyn Clock,
}

impl<'a> Catalog<'a> {
    /// Create a catalog view over `store`
    pub fn new(store: &'a mut EntityStore, clock: &'a dyn Clock) -> Self {
        Self { store, clock }
    }

    /// Add a book, Available and stamped with today's date
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::IdsExhausted` only when no identifier is left.
    pub fn add_book(&mut self, new: NewBook) -> Result<&Book, LibraryError> {
        let id = self.store.books.next_id().map_err(|_| LibraryError::IdsExhausted(Entity::Book))?;
        let book = Book {
            id,
            title: new.title,
            author: new.author,
            isbn: new.isbn,
            category: new.category,
            year: new.year,
            status: BookStatus::Available,
            date_added: self.clock.today(),
        };
        info!(book_id = %id, title = %book.title, "book added");
        self.store.books.insert(book);
        self.store.books.get(id).ok_or(LibraryError::not_found(Entity::Book, id))
    }

    /// Overwrite the supplied fields of a book
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no book has this identifier.
    pub fn update_book(&mut self, id: Id, update: BookUpdate) -> Result<&Book, LibraryError> {
        let book =
            self.store.books.get_mut(id).ok_or(LibraryError::not_found(Entity::Book, id))?;
        update.apply_to(book);
        info!(book_id = %id, "book updated");
        Ok(&*book)
    }

    /// Remove a book that is not on loan
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no book has this identifier and
    /// `Conflict::BookBorrowed` if it is currently borrowed.
    pub fn delete_book(&mut self, id: Id) -> Result<Book, LibraryError> {
        let book = self.store.books.get(id).ok_or(LibraryError::not_found(Entity::Book, id))?;
        if book.status == BookStatus::Borrowed {
            return Err(Conflict::BookBorrowed.into());
        }
        let removed =
            self.store.books.remove(id).ok_or(LibraryError::not_found(Entity::Book, id))?;
        info!(book_id = %id, title = %removed.title, "book deleted");
        Ok(removed)
    }

    /// Report a book's status and, when borrowed, who holds it
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no book has this identifier.
    pub fn check_availability(&self, id: Id) -> Result<Availability, LibraryError> {
        let book = self.store.book(id).ok_or(LibraryError::not_found(Entity::Book, id))?;
        let loan = match book.status {
            BookStatus::Available => None,
            BookStatus::Borrowed => self.store.active_request_for_book(id).map(|r| CurrentLoan {
                request_id: r.id,
                user_id: r.user_id,
                due_date: r.due_date,
            }),
        };
        Ok(Availability { book_id: id, title: book.title.clone(), status: book.status, loan })
    }

    /// Books whose title, author or ISBN contains `term`, ignoring case
    #[must_use]
    pub fn search(&self, term: &str) -> Vec<&Book> {
        let needle = term.trim().to_lowercase();
        self.store
            .books
            .iter()
            .filter(|b| {
                b.title.to_lowercase().contains(&needle)
                    || b.author.to_lowercase().contains(&needle)
                    || b.isbn.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Look up one book
    ///
    /// # Errors
    ///
    /// Returns `LibraryError::NotFound` if no book has this identifier.
    pub fn book(&self, id: Id) -> Result<&Book, LibraryError> {
        self.store.book(id).ok_or(LibraryError::not_found(Entity::Book, id))
    }

    /// Every book, in identifier order
    #[must_use]
    pub fn books(&self) -> Vec<&Book> {
        self.store.books.iter().collect()
    }
}
