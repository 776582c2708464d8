//! Where the library keeps its files and which lending rules it applies.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StorageError;

/// Lending rules
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LendingPolicy {
    /// Length of a fresh loan
    pub loan_days: u32,
    /// Extension granted by one renewal
    pub renewal_days: u32,
    /// Renewals allowed per request
    pub max_renewals: u32,
    /// Active loans allowed per user
    pub borrowing_cap: u32,
    /// Fine per whole day late, in hundredths
    pub fine_per_day_cents: u64,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        Self {
            loan_days: 14,
            renewal_days: 7,
            max_renewals: 2,
            borrowing_cap: 5,
            fine_per_day_cents: 100,
        }
    }
}

/// Library configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Directory holding the collection files
    pub data_dir: PathBuf,
    /// Book collection file name, relative to `data_dir`
    pub books_file: String,
    /// User collection file name, relative to `data_dir`
    pub users_file: String,
    /// Request collection file name, relative to `data_dir`
    pub requests_file: String,
    /// Directory CSV exports are written to; `data_dir` when unset
    pub export_dir: Option<PathBuf>,
    /// Lending rules
    pub policy: LendingPolicy,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            books_file: "books.json".to_string(),
            users_file: "users.json".to_string(),
            requests_file: "requests.json".to_string(),
            export_dir: None,
            policy: LendingPolicy::default(),
        }
    }
}

impl LibraryConfig {
    /// Defaults rooted at `data_dir`
    #[must_use]
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Self::default() }
    }

    /// Read a TOML configuration file; absent keys keep their defaults
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` when the file cannot be read and
    /// `StorageError::Config` when it is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        debug!(path = %path.display(), "loading configuration");
        let text = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        toml::from_str(&text)
            .map_err(|source| StorageError::Config { path: path.to_path_buf(), source })
    }

    /// Path of the book collection file
    #[must_use]
    pub fn books_path(&self) -> PathBuf {
        self.data_dir.join(&self.books_file)
    }

    /// Path of the user collection file
    #[must_use]
    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(&self.users_file)
    }

    /// Path of the request collection file
    #[must_use]
    pub fn requests_path(&self) -> PathBuf {
        self.data_dir.join(&self.requests_file)
    }

    /// Directory CSV exports go to
    #[must_use]
    pub fn export_dir(&self) -> &Path {
        self.export_dir.as_deref().unwrap_or(&self.data_dir)
    }
}
