use chrono::NaiveDate;
use pretty_assertions::assert_eq;

use super::*;
use crate::{
    loan::LoanStatus,
    seed::{sample_books, sample_requests, sample_users},
};

/// Helper: an identifier from a literal
fn id(raw: u32) -> Id {
    Id::new(raw).unwrap_or(Id::FIRST)
}

/// Helper: a date from a literal
fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Helper: the sample store, which is consistent
fn setup_test_store() -> EntityStore {
    EntityStore::from_parts(sample_books(), sample_users(), sample_requests())
}

#[test]
fn test_next_id_starts_at_one() {
    let store = EntityStore::new();
    assert_eq!(store.books().next_id(), Ok(Id::FIRST));
    assert!(store.is_empty());
}

#[test]
fn test_next_id_follows_the_largest() {
    // Gaps are not reused
    let mut books = sample_books();
    books.retain(|b| b.id != id(2));
    let store = EntityStore::from_parts(books, Vec::new(), Vec::new());
    assert_eq!(store.books().next_id(), Ok(id(4)));
}

#[test]
fn test_next_id_exhausted() {
    let mut books = sample_books();
    books.truncate(1);
    for book in &mut books {
        book.id = id(u32::MAX);
    }
    let store = EntityStore::from_parts(books, Vec::new(), Vec::new());
    assert_eq!(store.books().next_id(), Err(IdError::Exhausted));
}

#[test]
fn test_iteration_is_in_id_order() {
    let mut books = sample_books();
    books.reverse();
    let store = EntityStore::from_parts(books, Vec::new(), Vec::new());
    let ids: Vec<u32> = store.books().iter().map(|b| b.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_lookups_that_miss() {
    let store = setup_test_store();
    assert!(store.book(id(99)).is_none());
    assert!(store.user(id(99)).is_none());
    assert!(store.request(id(99)).is_none());
    assert_eq!(store.book_title(id(99)), UNKNOWN);
    assert_eq!(store.user_name(id(99)), UNKNOWN);
    assert_eq!(store.book_title(id(3)), "1984");
}

#[test]
fn test_active_request_lookups() {
    let store = setup_test_store();
    assert_eq!(store.active_request_for_book(id(3)).map(|r| r.id), Some(id(1)));
    assert!(store.active_request_for_book(id(1)).is_none());
    assert_eq!(store.active_requests_for_user(id(1)).count(), 1);
    assert_eq!(store.active_requests_for_user(id(2)).count(), 0);
}

#[test]
fn test_sample_store_passes_audit() {
    let store = setup_test_store();
    assert_eq!(store.audit(5, 2), Vec::new());
}

#[test]
fn test_audit_reports_status_and_counter_drift() {
    let mut store = setup_test_store();

    // Close the sample request without touching the book or the user
    if let Some(request) = store.requests.get_mut(id(1)) {
        request.status = LoanStatus::Returned;
        request.return_date = Some(date(2024, 3, 10));
    }

    let findings = store.audit(5, 2);
    assert_eq!(
        findings,
        vec![
            Inconsistency::BookStatus {
                book_id: id(3),
                status: BookStatus::Borrowed,
                active_requests: 0,
            },
            Inconsistency::UserCounter { user_id: id(1), recorded: 1, actual: 0 },
        ]
    );
    assert_eq!(
        findings.first().map(ToString::to_string).as_deref(),
        Some("book 3 is Borrowed but has 0 active request(s)")
    );
}

#[test]
fn test_audit_reports_dangling_references_and_limits() {
    let mut store = setup_test_store();
    store.requests.insert(LoanRequest {
        id: id(2),
        user_id: id(7),
        book_id: id(8),
        borrow_date: date(2024, 3, 1),
        due_date: date(2024, 3, 15),
        return_date: None,
        status: LoanStatus::Active,
        renewals: 3,
    });

    let findings = store.audit(5, 2);
    assert!(findings.contains(&Inconsistency::DanglingBook { request_id: id(2), book_id: id(8) }));
    assert!(findings.contains(&Inconsistency::DanglingUser { request_id: id(2), user_id: id(7) }));
    assert!(findings.contains(&Inconsistency::TooManyRenewals { request_id: id(2), renewals: 3 }));

    // A cap of zero puts the sample borrower over the limit
    let strict = setup_test_store().audit(0, 2);
    assert_eq!(strict, vec![Inconsistency::OverCap { user_id: id(1), active: 1 }]);
}
