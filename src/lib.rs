//! Library lending system: catalog, patrons and the loan lifecycle.
//!
//! This crate keeps books, users and loan requests in an explicit
//! [`EntityStore`], exposes book and patron management on top of it, and
//! implements the borrow / renew / return state machine with due dates,
//! overdue tracking and flat-rate fines. State is persisted as flat JSON
//! files by the caller after each successful mutation.

pub mod book;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod id;
pub mod lending;
pub mod loan;
pub mod observers;
pub mod patrons;
pub mod persistence;
pub mod report;
pub mod seed;
pub mod store;
pub mod system;
pub mod user;

pub use book::{Book, BookStatus, BookUpdate, NewBook};
pub use catalog::{Availability, Catalog};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{LendingPolicy, LibraryConfig};
pub use error::{Conflict, Entity, ErrorKind, LibraryError, StorageError};
pub use events::LoanEvent;
pub use id::Id;
pub use lending::Lending;
pub use loan::{Fine, LoanRequest, LoanStatus};
pub use observers::LoanObserver;
pub use patrons::Patrons;
pub use store::EntityStore;
pub use system::LibrarySystem;
pub use user::{NewUser, User, UserUpdate};
