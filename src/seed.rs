//! Sample records for a first run.

use chrono::NaiveDate;
use tracing::info;

use crate::{
    book::{Book, BookStatus},
    id::Id,
    loan::{LoanRequest, LoanStatus},
    store::{Collection, EntityStore},
    user::User,
};

/// Which collections [`seed_empty_collections`] filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Books were seeded
    pub books: bool,
    /// Users were seeded
    pub users: bool,
    /// Requests were seeded
    pub requests: bool,
}

impl SeedReport {
    /// Whether anything was written
    #[must_use]
    pub fn any(self) -> bool {
        self.books || self.users || self.requests
    }
}

/// Fill each empty collection with the sample records; populated ones stay as they are
pub fn seed_empty_collections(store: &mut EntityStore) -> SeedReport {
    let mut report = SeedReport::default();
    if store.books.is_empty() {
        store.books = Collection::from_records(sample_books());
        report.books = true;
    }
    if store.users.is_empty() {
        store.users = Collection::from_records(sample_users());
        report.users = true;
    }
    if store.requests.is_empty() {
        store.requests = Collection::from_records(sample_requests());
        report.requests = true;
    }
    if report.any() {
        info!(?report, "seeded sample records");
    }
    report
}

/// Three books, the third of them out on loan
#[must_use]
pub fn sample_books() -> Vec<Book> {
    vec![
        book(
            1,
            ["The Great Gatsby", "F. Scott Fitzgerald", "9780743273565", "Fiction"],
            1925,
            date(2024, 1, 15),
        ),
        book(
            2,
            ["To Kill a Mockingbird", "Harper Lee", "9780061120084", "Fiction"],
            1960,
            date(2024, 1, 20),
        ),
        Book {
            status: BookStatus::Borrowed,
            ..book(
                3,
                ["1984", "George Orwell", "9780451524935", "Science Fiction"],
                1949,
                date(2024, 2, 10),
            )
        },
    ]
}

/// Two patrons, the first holding the sample loan
#[must_use]
pub fn sample_users() -> Vec<User> {
    vec![
        User {
            id: id(1),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: "123-456-7890".to_string(),
            address: "123 Main St".to_string(),
            date_joined: date(2024, 1, 10),
            active_borrowings: 1,
            total_borrowings: 3,
        },
        User {
            id: id(2),
            name: "Jane Smith".to_string(),
            email: "jane@example.com".to_string(),
            phone: "987-654-3210".to_string(),
            address: "456 Oak Ave".to_string(),
            date_joined: date(2024, 2, 1),
            active_borrowings: 0,
            total_borrowings: 2,
        },
    ]
}

/// One active loan of book 3 to user 1
#[must_use]
pub fn sample_requests() -> Vec<LoanRequest> {
    vec![LoanRequest {
        id: id(1),
        user_id: id(1),
        book_id: id(3),
        borrow_date: date(2024, 3, 1),
        due_date: date(2024, 3, 15),
        return_date: None,
        status: LoanStatus::Active,
        renewals: 0,
    }]
}

/// An available sample book from its title, author, ISBN and category
fn book(
    raw_id: u32,
    [title, author, isbn, category]: [&str; 4],
    year: u32,
    added: NaiveDate,
) -> Book {
    Book {
        id: id(raw_id),
        title: title.to_string(),
        author: author.to_string(),
        isbn: isbn.to_string(),
        category: category.to_string(),
        year,
        status: BookStatus::Available,
        date_added: added,
    }
}

/// Sample identifiers are literals known to be positive
fn id(raw: u32) -> Id {
    Id::new(raw).unwrap_or(Id::FIRST)
}

/// Sample dates are literals known to be valid
fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}
