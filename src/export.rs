//! CSV projection of the three collections.

use std::{
    borrow::Cow,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use tracing::info;

use crate::{error::StorageError, store::EntityStore};

/// Header row of the books export
pub const BOOKS_HEADER: &str = "ID,Title,Author,ISBN,Category,Year,Status,Date Added";
/// Header row of the users export
pub const USERS_HEADER: &str =
    "ID,Name,Email,Phone,Address,Date Joined,Active Borrowings,Total Borrowings";
/// Header row of the requests export
pub const REQUESTS_HEADER: &str =
    "ID,User ID,Book ID,Borrow Date,Due Date,Return Date,Status,Renewals";

/// Files written by one export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    /// Books CSV
    pub books: PathBuf,
    /// Users CSV
    pub users: PathBuf,
    /// Requests CSV
    pub requests: PathBuf,
}

/// Write the three collections as CSV files into `dir`
///
/// File names carry `timestamp` as `YYYYMMDD_HHMMSS`. The store is only read.
///
/// # Errors
///
/// Returns `StorageError::Io` when the directory or a file cannot be written.
pub fn export_csv(
    store: &EntityStore,
    dir: &Path,
    timestamp: NaiveDateTime,
) -> Result<ExportPaths, StorageError> {
    fs::create_dir_all(dir).map_err(|e| StorageError::io(dir, e))?;
    let stamp = timestamp.format("%Y%m%d_%H%M%S").to_string();
    let paths = ExportPaths {
        books: dir.join(format!("books_export_{stamp}.csv")),
        users: dir.join(format!("users_export_{stamp}.csv")),
        requests: dir.join(format!("requests_export_{stamp}.csv")),
    };

    write_csv(
        &paths.books,
        BOOKS_HEADER,
        store.books().iter().map(|b| {
            vec![
                b.id.to_string(),
                b.title.clone(),
                b.author.clone(),
                b.isbn.clone(),
                b.category.clone(),
                b.year.to_string(),
                b.status.to_string(),
                b.date_added.to_string(),
            ]
        }),
    )?;
    write_csv(
        &paths.users,
        USERS_HEADER,
        store.users().iter().map(|u| {
            vec![
                u.id.to_string(),
                u.name.clone(),
                u.email.clone(),
                u.phone.clone(),
                u.address.clone(),
                u.date_joined.to_string(),
                u.active_borrowings.to_string(),
                u.total_borrowings.to_string(),
            ]
        }),
    )?;
    write_csv(
        &paths.requests,
        REQUESTS_HEADER,
        store.requests().iter().map(|r| {
            vec![
                r.id.to_string(),
                r.user_id.to_string(),
                r.book_id.to_string(),
                r.borrow_date.to_string(),
                r.due_date.to_string(),
                r.return_date.as_ref().map(ToString::to_string).unwrap_or_default(),
                r.status.to_string(),
                r.renewals.to_string(),
            ]
        }),
    )?;

    info!(dir = %dir.display(), %stamp, "exported library data");
    Ok(paths)
}

/// Write one header line and one line per row
fn write_csv(
    path: &Path,
    header: &str,
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<(), StorageError> {
    let file = File::create(path).map_err(|e| StorageError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{header}").map_err(|e| StorageError::io(path, e))?;
    for row in rows {
        let line: Vec<Cow<'_, str>> = row.iter().map(|field| escape_field(field)).collect();
        writeln!(writer, "{}", line.join(",")).map_err(|e| StorageError::io(path, e))?;
    }
    writer.flush().map_err(|e| StorageError::io(path, e))
}

/// Quote a field when it holds a separator, a quote or a line break
#[must_use]
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
