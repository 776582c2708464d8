use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, de::IgnoredAny};
use tracing::warn;

use crate::id::Id;

/// Represents the possible states of a catalog entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum BookStatus {
    /// Book is on the shelf and can be borrowed
    #[default]
    Available,
    /// Book is out on an active loan
    Borrowed,
}

impl BookStatus {
    /// Get a human-readable description of the status
    #[must_use]
    pub fn get_description(self) -> &'static str {
        match self {
            Self::Available => "Book is available for borrowing",
            Self::Borrowed => "Book is currently borrowed",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Available => "Available",
            Self::Borrowed => "Borrowed",
        })
    }
}

/// A catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Book {
    /// Unique identifier
    pub id: Id,
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// ISBN as printed, not validated
    pub isbn: String,
    /// Free-form shelf category
    #[serde(default)]
    pub category: String,
    /// Publication year, 0 when unknown
    #[serde(default, deserialize_with = "deserialize_year")]
    pub year: u32,
    /// Whether the book is on loan
    #[serde(default)]
    pub status: BookStatus,
    /// Date the book entered the catalog
    pub date_added: NaiveDate,
}

/// Fields for a new catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewBook {
    /// Title
    pub title: String,
    /// Author
    pub author: String,
    /// ISBN
    pub isbn: String,
    /// Category
    pub category: String,
    /// Publication year
    pub year: u32,
}

/// Partial update of a catalog entry; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookUpdate {
    /// New title
    pub title: Option<String>,
    /// New author
    pub author: Option<String>,
    /// New ISBN
    pub isbn: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New publication year
    pub year: Option<u32>,
    /// New status. The caller owns keeping it consistent with the loans.
    pub status: Option<BookStatus>,
}

impl BookUpdate {
    /// Whether the update would change nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.isbn.is_none()
            && self.category.is_none()
            && self.year.is_none()
            && self.status.is_none()
    }

    /// Apply the supplied fields to `book`
    pub(crate) fn apply_to(self, book: &mut Book) {
        if let Some(title) = self.title {
            book.title = title;
        }
        if let Some(author) = self.author {
            book.author = author;
        }
        if let Some(isbn) = self.isbn {
            book.isbn = isbn;
        }
        if let Some(category) = self.category {
            book.category = category;
        }
        if let Some(year) = self.year {
            book.year = year;
        }
        if let Some(status) = self.status {
            book.status = status;
        }
    }
}

impl Book {
    /// Whether the book can be borrowed right now
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }
}

/// Read a publication year written as a number or as free text
///
/// Text that is not a whole number, and any other JSON value, reads as 0,
/// the unknown year.
fn deserialize_year<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    /// The shapes a stored year comes in
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawYear {
        /// `1925`
        Number(u32),
        /// `"1925"`, `""` or `"c. 1000"`
        Text(String),
        /// Anything else
        Other(IgnoredAny),
    }

    Ok(match RawYear::deserialize(deserializer)? {
        RawYear::Number(year) => year,
        RawYear::Text(text) => {
            let trimmed = text.trim();
            trimmed.parse().unwrap_or_else(|_| {
                if !trimmed.is_empty() {
                    warn!(year = %trimmed, "publication year is not a number, reading it as 0");
                }
                0
            })
        }
        RawYear::Other(_) => {
            warn!("publication year has an unexpected type, reading it as 0");
            0
        }
    })
}
