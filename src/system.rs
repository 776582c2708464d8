use std::fmt;

use tracing::warn;

use crate::{
    catalog::Catalog,
    clock::{Clock, SystemClock},
    config::{LendingPolicy, LibraryConfig},
    error::StorageError,
    lending::Lending,
    observers::{LoanObserver, NotificationService, TransitionLogger},
    patrons::Patrons,
    persistence,
    store::{EntityStore, Inconsistency},
};

/// Library lending system
///
/// Owns the entity store and lends it to the catalog, patron and lending
/// views one operation at a time. Saving is left to the caller, who is
/// expected to call [`LibrarySystem::save`] after each successful mutation.
pub struct LibrarySystem {
    /// Books, users and requests
    store: EntityStore,
    /// Date source
    clock: Box<dyn Clock>,
    /// Lending rules in force
    policy: LendingPolicy,
    /// Registered loan observers
    observers: Vec<Box<dyn LoanObserver>>,
}

// Manual implementation of Debug for LibrarySystem
impl fmt::Debug for LibrarySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibrarySystem")
            .field("books", &self.store.books().len())
            .field("users", &self.store.users().len())
            .field("requests", &self.store.requests().len())
            .field("clock", &self.clock)
            .field("policy", &self.policy)
            .field("observers_count", &self.observers.len())
            .finish()
    }
}

impl LibrarySystem {
    /// Create a system over `store` with no observers
    #[must_use]
    pub fn new(store: EntityStore, clock: Box<dyn Clock>, policy: LendingPolicy) -> Self {
        Self { store, clock, policy, observers: Vec::new() }
    }

    /// Load the collections named by `config`, using the wall clock and the
    /// standard observers
    ///
    /// Invariant violations found in the loaded files are logged, not fatal.
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` when a collection file cannot be read or parsed.
    pub fn open(config: &LibraryConfig) -> Result<Self, StorageError> {
        let store = persistence::load_store(config)?;
        let mut system = Self::new(store, Box::new(SystemClock), config.policy.clone());
        system.register_standard_observers();
        for finding in system.audit() {
            warn!(%finding, "inconsistent library data");
        }
        Ok(system)
    }

    /// Rewrite every collection file named by `config`
    ///
    /// # Errors
    ///
    /// Returns a `StorageError` when a file cannot be written.
    pub fn save(&self, config: &LibraryConfig) -> Result<(), StorageError> {
        persistence::save_store(&self.store, config)
    }

    /// Register an observer to be notified of loan transitions
    pub fn register_observer(&mut self, observer: Box<dyn LoanObserver>) {
        self.observers.push(observer);
    }

    /// Attach the transition logger and the notification service
    pub fn register_standard_observers(&mut self) {
        self.register_observer(Box::new(TransitionLogger));
        self.register_observer(Box::new(NotificationService {
            max_renewals: self.policy.max_renewals,
        }));
    }

    /// Book management
    pub fn catalog(&mut self) -> Catalog<'_> {
        Catalog::new(&mut self.store, self.clock.as_ref())
    }

    /// Patron management
    pub fn patrons(&mut self) -> Patrons<'_> {
        Patrons::new(&mut self.store, self.clock.as_ref())
    }

    /// The loan lifecycle
    pub fn lending(&mut self) -> Lending<'_> {
        Lending::new(&mut self.store, self.clock.as_ref(), &self.policy, &self.observers)
    }

    /// Read access to every collection
    #[must_use]
    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Mutable access to every collection, for bootstrap seeding
    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    /// Lending rules in force
    #[must_use]
    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    /// Today according to the system's clock
    #[must_use]
    pub fn today(&self) -> chrono::NaiveDate {
        self.clock.today()
    }

    /// Cross-entity invariant violations under the current policy
    #[must_use]
    pub fn audit(&self) -> Vec<Inconsistency> {
        self.store.audit(self.policy.borrowing_cap, self.policy.max_renewals)
    }
}
