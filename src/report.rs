//! Read-only summaries of the library and their text rendering.

use chrono::NaiveDate;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

use crate::{
    book::{Book, BookStatus},
    catalog::Availability,
    id::Id,
    lending::{OverdueDistribution, OverdueLoan, PopularBook, RequestRow},
    loan::LoanStatus,
    patrons::BorrowingHistory,
    store::EntityStore,
    user::User,
};

/// Category name used for books filed without one
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Widest title or email shown in a table
const TITLE_WIDTH: usize = 28;
/// Widest name or author shown in a table
const NAME_WIDTH: usize = 18;

/// Counts across the whole library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryStatistics {
    /// Books in the catalog
    pub total_books: usize,
    /// Books on the shelf
    pub available_books: usize,
    /// Books out on loan
    pub borrowed_books: usize,
    /// Registered patrons
    pub total_users: usize,
    /// Requests still active
    pub active_loans: usize,
    /// Books per category, in the order categories first appear
    pub categories: Vec<(String, usize)>,
}

/// Compute [`LibraryStatistics`] for `store`
#[must_use]
pub fn library_statistics(store: &EntityStore) -> LibraryStatistics {
    let mut stats = LibraryStatistics {
        total_books: store.books().len(),
        total_users: store.users().len(),
        active_loans: store.requests().iter().filter(|r| r.is_active()).count(),
        ..LibraryStatistics::default()
    };

    for book in store.books() {
        let counter = match book.status {
            BookStatus::Available => &mut stats.available_books,
            BookStatus::Borrowed => &mut stats.borrowed_books,
        };
        *counter = counter.saturating_add(1);

        let category = match book.category.trim() {
            "" => UNCATEGORIZED,
            _ => book.category.as_str(),
        };
        match stats.categories.iter_mut().find(|(name, _)| name == category) {
            Some((_, count)) => *count = count.saturating_add(1),
            None => stats.categories.push((category.to_string(), 1)),
        }
    }
    stats
}

/// One patron's borrowing counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserActivity {
    /// Patron
    pub user_id: Id,
    /// Patron's name
    pub name: String,
    /// Loans out now
    pub active_borrowings: u32,
    /// Loans ever taken
    pub total_borrowings: u32,
}

/// Borrowing counters for every patron, in identifier order
#[must_use]
pub fn user_activity(store: &EntityStore) -> Vec<UserActivity> {
    store
        .users()
        .iter()
        .map(|u| UserActivity {
            user_id: u.id,
            name: u.name.clone(),
            active_borrowings: u.active_borrowings,
            total_borrowings: u.total_borrowings,
        })
        .collect()
}

/// Keep at most `width` characters of `text`, marking the cut with "..."
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Render rows as a rounded table with a centered header
fn render<R: Tabled>(rows: &[R]) -> String {
    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();
    format!("{table}\n")
}

/// Table row for a book
#[derive(Tabled)]
struct BookRow {
    /// Identifier
    #[tabled(rename = "ID")]
    id: Id,
    /// Title, clipped
    #[tabled(rename = "Title")]
    title: String,
    /// Author, clipped
    #[tabled(rename = "Author")]
    author: String,
    /// Shelf status
    #[tabled(rename = "Status")]
    status: BookStatus,
    /// ISBN as recorded
    #[tabled(rename = "ISBN")]
    isbn: String,
}

/// Table row for a patron
#[derive(Tabled)]
struct UserRow {
    /// Identifier
    #[tabled(rename = "ID")]
    id: Id,
    /// Name, clipped
    #[tabled(rename = "Name")]
    name: String,
    /// Email, clipped
    #[tabled(rename = "Email")]
    email: String,
    /// Phone as recorded
    #[tabled(rename = "Phone")]
    phone: String,
}

/// Table row for a loan request
#[derive(Tabled)]
struct RequestTableRow {
    /// Request identifier
    #[tabled(rename = "Req ID")]
    id: Id,
    /// Borrower's name
    #[tabled(rename = "User")]
    user: String,
    /// Book title
    #[tabled(rename = "Book")]
    book: String,
    /// Lifecycle state
    #[tabled(rename = "Status")]
    status: LoanStatus,
    /// Loan start
    #[tabled(rename = "Borrowed")]
    borrowed: NaiveDate,
    /// Loan end
    #[tabled(rename = "Due")]
    due: NaiveDate,
    /// Renewals used
    #[tabled(rename = "Renewals")]
    renewals: u32,
}

/// Table row for the popularity ranking
#[derive(Tabled)]
struct PopularRow {
    /// Position, from 1
    #[tabled(rename = "Rank")]
    rank: usize,
    /// Book title
    #[tabled(rename = "Book")]
    title: String,
    /// Requests ever made
    #[tabled(rename = "Borrowings")]
    borrowings: usize,
}

/// Table row for user activity
#[derive(Tabled)]
struct ActivityRow {
    /// Patron's name
    #[tabled(rename = "User")]
    name: String,
    /// Loans out now
    #[tabled(rename = "Active")]
    active: u32,
    /// Loans ever taken
    #[tabled(rename = "Total")]
    total: u32,
}

/// Text rendering of library state for the command line
#[derive(Debug)]
pub struct ReportFormatter;

impl ReportFormatter {
    /// Table of books
    #[must_use]
    pub fn books_table(books: &[&Book]) -> String {
        if books.is_empty() {
            return "No books found.\n".to_string();
        }
        let rows: Vec<BookRow> = books
            .iter()
            .map(|book| BookRow {
                id: book.id,
                title: clip(&book.title, TITLE_WIDTH),
                author: clip(&book.author, NAME_WIDTH),
                status: book.status,
                isbn: book.isbn.clone(),
            })
            .collect();
        render(&rows)
    }

    /// Table of users
    #[must_use]
    pub fn users_table(users: &[&User]) -> String {
        if users.is_empty() {
            return "No users found.\n".to_string();
        }
        let rows: Vec<UserRow> = users
            .iter()
            .map(|user| UserRow {
                id: user.id,
                name: clip(&user.name, NAME_WIDTH),
                email: clip(&user.email, TITLE_WIDTH),
                phone: user.phone.clone(),
            })
            .collect();
        render(&rows)
    }

    /// Table of requests with resolved names
    #[must_use]
    pub fn requests_table(rows: &[RequestRow<'_>]) -> String {
        if rows.is_empty() {
            return "No requests recorded.\n".to_string();
        }
        let rows: Vec<RequestTableRow> = rows
            .iter()
            .map(|row| RequestTableRow {
                id: row.request.id,
                user: clip(row.user_name, NAME_WIDTH),
                book: clip(row.book_title, TITLE_WIDTH),
                status: row.request.status,
                borrowed: row.request.borrow_date,
                due: row.request.due_date,
                renewals: row.request.renewals,
            })
            .collect();
        render(&rows)
    }

    /// Overdue loans, one block each, with a total
    #[must_use]
    pub fn overdue_list(loans: &[OverdueLoan]) -> String {
        if loans.is_empty() {
            return "No overdue books!\n".to_string();
        }
        let blocks: String = loans
            .iter()
            .map(|loan| {
                format!(
                    "User: {}\nBook: {}\nDue Date: {} ({} day(s) OVERDUE)\nRequest ID: {}\n{}\n",
                    loan.user_name,
                    loan.book_title,
                    loan.due_date,
                    loan.days_overdue,
                    loan.request_id,
                    "-".repeat(40)
                )
            })
            .collect();
        format!("{blocks}Total overdue books: {}\n", loans.len())
    }

    /// Ranked table of the most borrowed books
    #[must_use]
    pub fn popularity_table(ranking: &[PopularBook]) -> String {
        if ranking.is_empty() {
            return "No books have been borrowed yet.\n".to_string();
        }
        let rows: Vec<PopularRow> = (1_usize..)
            .zip(ranking)
            .map(|(rank, entry)| PopularRow {
                rank,
                title: clip(&entry.title, TITLE_WIDTH),
                borrowings: entry.borrow_count,
            })
            .collect();
        render(&rows)
    }

    /// Overdue counts bucketed by days late
    #[must_use]
    pub fn distribution_table(distribution: &OverdueDistribution) -> String {
        let mut out = format!("Total Overdue Books: {}\n", distribution.total);
        if !distribution.by_days.is_empty() {
            out.push_str("\nOverdue Distribution:\n");
            for (days, count) in &distribution.by_days {
                out.push_str(&format!("  {days} day(s) overdue: {count} book(s)\n"));
            }
        }
        out
    }

    /// Library-wide counts and the category breakdown
    #[must_use]
    pub fn statistics(stats: &LibraryStatistics) -> String {
        let mut out = format!(
            "Total Books: {}\nAvailable Books: {}\nBorrowed Books: {}\n\
             Total Users: {}\nActive Borrowings: {}\n",
            stats.total_books,
            stats.available_books,
            stats.borrowed_books,
            stats.total_users,
            stats.active_loans
        );
        if !stats.categories.is_empty() {
            out.push_str("\nBooks by Category:\n");
            for (category, count) in &stats.categories {
                out.push_str(&format!("  {category}: {count}\n"));
            }
        }
        out
    }

    /// Per-patron active and total borrowings
    #[must_use]
    pub fn activity_table(activity: &[UserActivity]) -> String {
        if activity.is_empty() {
            return "No users found.\n".to_string();
        }
        let rows: Vec<ActivityRow> = activity
            .iter()
            .map(|entry| ActivityRow {
                name: clip(&entry.name, NAME_WIDTH),
                active: entry.active_borrowings,
                total: entry.total_borrowings,
            })
            .collect();
        render(&rows)
    }

    /// A patron's counters and current loans
    #[must_use]
    pub fn history(history: &BorrowingHistory) -> String {
        let header = format!(
            "Borrowing History for {}\nActive Borrowings: {}\nTotal Borrowings: {}\n\n\
             Current Borrowings:\n",
            history.name, history.active_borrowings, history.total_borrowings
        );
        if history.current.is_empty() {
            return format!("{header}No active borrowings\n");
        }
        let entries: String = history
            .current
            .iter()
            .map(|entry| {
                format!(
                    "Book: {}\nBorrowed on: {}\nDue on: {}\n{}\n",
                    entry.book_title,
                    entry.borrow_date,
                    entry.due_date,
                    "-".repeat(40)
                )
            })
            .collect();
        header + &entries
    }

    /// Status of one book and, when borrowed, its holder
    #[must_use]
    pub fn availability(availability: &Availability) -> String {
        let summary = format!(
            "Book: {}\nStatus: {} ({})\n",
            availability.title,
            availability.status,
            availability.status.get_description()
        );
        match availability.loan {
            Some(loan) => format!(
                "{summary}Borrowed by: User {}\nDue Date: {}\n",
                loan.user_id, loan.due_date
            ),
            None => summary,
        }
    }
}
