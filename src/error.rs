use std::{fmt, io, path::PathBuf};

use crate::id::Id;

/// The collection an identifier was looked up in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// Catalog entry
    Book,
    /// Library patron
    User,
    /// Loan request
    Request,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Book => "book",
            Self::User => "user",
            Self::Request => "request",
        })
    }
}

/// Lifecycle rule that blocked an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Conflict {
    /// Borrow attempted on a book that is already out
    #[error("book is not available")]
    BookNotAvailable,
    /// Borrow attempted by a user already at the borrowing cap
    #[error("borrowing limit reached ({cap} books)")]
    BorrowingLimitReached {
        /// The cap in force
        cap: u32,
    },
    /// Renew attempted on a request that used all its renewals
    #[error("maximum renewals reached ({max})")]
    MaxRenewalsReached {
        /// The renewal limit in force
        max: u32,
    },
    /// Delete attempted on a borrowed book
    #[error("cannot delete a book while it is borrowed")]
    BookBorrowed,
    /// Delete attempted on a user holding loans
    #[error("cannot delete a user with {active} active borrowing(s)")]
    UserHasActiveLoans {
        /// Outstanding loans
        active: u32,
    },
}

/// Coarse classification of a [`LibraryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A referenced identifier does not resolve
    NotFound,
    /// The operation would break a lifecycle invariant
    Conflict,
}

/// Failure of a catalog, patron or lending operation
///
/// Every failing operation leaves the store exactly as it found it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LibraryError {
    /// No record with this identifier in the collection
    #[error("{entity} {id} not found")]
    NotFound {
        /// Collection searched
        entity: Entity,
        /// Identifier searched for
        id: Id,
    },
    /// Return or renew on a request that is missing or already returned
    #[error("active request {0} not found")]
    ActiveRequestNotFound(Id),
    /// A lifecycle rule rejected the operation
    #[error(transparent)]
    Conflict(#[from] Conflict),
    /// No identifier left to assign in a collection
    #[error("{0} identifiers exhausted")]
    IdsExhausted(Entity),
}

impl LibraryError {
    /// Shorthand for [`LibraryError::NotFound`]
    #[must_use]
    pub fn not_found(entity: Entity, id: Id) -> Self {
        Self::NotFound { entity, id }
    }

    /// Which of the two failure families this error belongs to
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::ActiveRequestNotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) | Self::IdsExhausted(_) => ErrorKind::Conflict,
        }
    }
}

/// Failure reading or writing files around the core
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem failure
    #[error("{}: {source}", path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        source: io::Error,
    },
    /// A collection file held malformed JSON
    #[error("{}: {source}", path.display())]
    Json {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        source: serde_json::Error,
    },
    /// The configuration file could not be parsed
    #[error("{}: {source}", path.display())]
    Config {
        /// File involved
        path: PathBuf,
        /// Underlying failure
        source: toml::de::Error,
    },
}

impl StorageError {
    /// Wrap an I/O failure with the path it happened on
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    /// Wrap a JSON failure with the path it happened on
    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json { path: path.into(), source }
    }
}
