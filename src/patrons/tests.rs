use pretty_assertions::assert_eq;

use super::*;
use crate::{
    clock::FixedClock,
    seed::{sample_books, sample_requests, sample_users},
    store::UNKNOWN,
};

/// Helper: an identifier from a literal
fn id(raw: u32) -> Id {
    Id::new(raw).unwrap_or(Id::FIRST)
}

/// Helper: a date from a literal
fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

/// Helper: the sample store, user 1 holding book 3
fn setup_test_store() -> EntityStore {
    EntityStore::from_parts(sample_books(), sample_users(), sample_requests())
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_add_user_starts_with_zero_counters() {
    let mut store = setup_test_store();
    let clock = FixedClock(date(2024, 5, 1));
    let mut patrons = Patrons::new(&mut store, &clock);

    let user = patrons
        .add_user(NewUser {
            name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            ..NewUser::default()
        })
        .unwrap();
    assert_eq!(user.id, id(3));
    assert_eq!(user.date_joined, date(2024, 5, 1));
    assert_eq!((user.active_borrowings, user.total_borrowings), (0, 0));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_update_user() {
    let mut store = setup_test_store();
    let clock = FixedClock(date(2024, 5, 1));
    let mut patrons = Patrons::new(&mut store, &clock);

    let update = UserUpdate { phone: Some("555-0100".to_string()), ..UserUpdate::default() };
    assert!(!update.is_empty());
    let user = patrons.update_user(id(2), update).unwrap();
    assert_eq!(user.phone, "555-0100");
    assert_eq!(user.name, "Jane Smith");
    assert_eq!(user.total_borrowings, 2);

    assert!(patrons.update_user(id(5), UserUpdate::default()).is_err());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_delete_user() {
    let mut store = setup_test_store();
    let before = store.clone();
    let clock = FixedClock(date(2024, 5, 1));
    let mut patrons = Patrons::new(&mut store, &clock);

    // John Doe still has a book out
    let refused = patrons.delete_user(id(1));
    assert_eq!(refused, Err(Conflict::UserHasActiveLoans { active: 1 }.into()));

    let removed = patrons.delete_user(id(2)).unwrap();
    assert_eq!(removed.name, "Jane Smith");
    assert!(patrons.user(id(2)).is_err());

    assert_eq!(store.users().len(), 1);
    assert_eq!(store.user(id(1)), before.user(id(1)));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_history_lists_active_requests() {
    let mut store = setup_test_store();
    let clock = FixedClock(date(2024, 5, 1));
    let patrons = Patrons::new(&mut store, &clock);

    let history = patrons.history(id(1)).unwrap();
    assert_eq!(history.name, "John Doe");
    assert_eq!((history.active_borrowings, history.total_borrowings), (1, 3));
    assert_eq!(
        history.current,
        vec![HistoryEntry {
            request_id: id(1),
            book_id: id(3),
            book_title: "1984".to_string(),
            borrow_date: date(2024, 3, 1),
            due_date: date(2024, 3, 15),
        }]
    );

    let idle = patrons.history(id(2)).unwrap();
    assert!(idle.current.is_empty());

    assert_eq!(patrons.history(id(9)), Err(LibraryError::not_found(Entity::User, id(9))));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_history_with_missing_book() {
    let mut books = sample_books();
    books.retain(|b| b.id != id(3));
    let mut store = EntityStore::from_parts(books, sample_users(), sample_requests());
    let clock = FixedClock(date(2024, 5, 1));
    let patrons = Patrons::new(&mut store, &clock);

    let history = patrons.history(id(1)).unwrap();
    assert_eq!(history.current.first().map(|e| e.book_title.as_str()), Some(UNKNOWN));
}
