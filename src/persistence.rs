//! Flat-file persistence: one pretty-printed JSON array per collection.
//!
//! A missing file loads as an empty collection. Saving rewrites each file in
//! full through a temporary sibling and a rename, so a reader never sees a
//! half-written collection.

use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::{config::LibraryConfig, error::StorageError, store::EntityStore};

/// Load all three collections named by `config`
///
/// # Errors
///
/// Returns `StorageError::Io` when a file exists but cannot be read and
/// `StorageError::Json` when it does not hold a JSON array of records.
pub fn load_store(config: &LibraryConfig) -> Result<EntityStore, StorageError> {
    let books = read_collection(&config.books_path())?;
    let users = read_collection(&config.users_path())?;
    let requests = read_collection(&config.requests_path())?;
    let store = EntityStore::from_parts(books, users, requests);
    info!(
        books = store.books().len(),
        users = store.users().len(),
        requests = store.requests().len(),
        "loaded library state"
    );
    Ok(store)
}

/// Rewrite all three collection files named by `config`
///
/// # Errors
///
/// Returns `StorageError::Io` when a file cannot be written and
/// `StorageError::Json` when a record cannot be serialized.
pub fn save_store(store: &EntityStore, config: &LibraryConfig) -> Result<(), StorageError> {
    write_collection(&config.books_path(), store.books())?;
    write_collection(&config.users_path(), store.users())?;
    write_collection(&config.requests_path(), store.requests())?;
    info!(data_dir = %config.data_dir.display(), "saved library state");
    Ok(())
}

/// Read a JSON array of records; a missing file is an empty collection
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn read_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StorageError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "collection file missing, starting empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(StorageError::io(path, e)),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(&bytes).map_err(|e| StorageError::json(path, e))
}

/// Write records as a pretty JSON array, replacing `path` atomically
///
/// # Errors
///
/// Fails when the directory cannot be created or the file cannot be written.
pub fn write_collection<T, I>(path: &Path, records: I) -> Result<(), StorageError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
    }

    let records: Vec<T> = records.into_iter().collect();
    let tmp_path = tmp_write_path(path);
    let write_result = (|| -> Result<(), StorageError> {
        let file = File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &records)
            .map_err(|e| StorageError::json(path, e))?;
        writer.write_all(b"\n").map_err(|e| StorageError::io(&tmp_path, e))?;
        let file = writer.into_inner().map_err(|e| StorageError::io(&tmp_path, e.into_error()))?;
        file.sync_all().map_err(|e| StorageError::io(&tmp_path, e))
    })();

    if let Err(error) = write_result {
        drop(fs::remove_file(&tmp_path));
        return Err(error);
    }

    fs::rename(&tmp_path, path).map_err(|e| {
        drop(fs::remove_file(&tmp_path));
        StorageError::io(path, e)
    })?;
    debug!(path = %path.display(), records = records.len(), "wrote collection");
    Ok(())
}

/// Sibling path used while a collection is being written
fn tmp_write_path(path: &Path) -> PathBuf {
    let mut tmp: OsString = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
