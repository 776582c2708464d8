use std::{cell::RefCell, rc::Rc};

use pretty_assertions::assert_eq;

use super::*;
use crate::{
    clock::FixedClock,
    error::ErrorKind,
    observers::recording::RecordingObserver,
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

/// Everything a `Lending` view borrows, owned by the test
struct Fixture {
    /// Library state, seeded with the sample records
    store: EntityStore,
    /// Fixed date
    clock: FixedClock,
    /// Rules in force
    policy: LendingPolicy,
    /// A single recording observer
    observers: Vec<Box<dyn LoanObserver>>,
    /// Events the observer saw
    events: Rc<RefCell<Vec<LoanEvent>>>,
}

impl Fixture {
    /// The lending view over the fixture
    fn lending(&mut self) -> Lending<'_> {
        Lending::new(&mut self.store, &self.clock, &self.policy, &self.observers)
    }

    /// Move the clock
    fn set_today(&mut self, today: NaiveDate) {
        self.clock = FixedClock(today);
    }

    /// Events seen so far
    fn events(&self) -> Vec<LoanEvent> {
        self.events.borrow().clone()
    }
}

/// Helper: sample store (book 3 out to user 1, due 2024-03-15) on 2024-04-01
fn setup_test_fixture() -> Fixture {
    let recorder = RecordingObserver::default();
    let events = Rc::clone(&recorder.events);
    Fixture {
        store: EntityStore::from_parts(sample_books(), sample_users(), sample_requests()),
        clock: FixedClock(date(2024, 4, 1)),
        policy: LendingPolicy::default(),
        observers: vec![Box::new(recorder)],
        events,
    }
}

/// Helper: a closed request, for history-only scenarios
fn returned_request(raw_id: u32, user: u32, book: u32) -> LoanRequest {
    LoanRequest {
        id: id(raw_id),
        user_id: id(user),
        book_id: id(book),
        borrow_date: date(2024, 1, 2),
        due_date: date(2024, 1, 16),
        return_date: Some(date(2024, 1, 10)),
        status: LoanStatus::Returned,
        renewals: 0,
    }
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_borrow() {
    let mut fixture = setup_test_fixture();

    let receipt = fixture.lending().borrow(id(2), id(1)).unwrap();
    assert_eq!(
        receipt,
        BorrowReceipt {
            request_id: id(2),
            book_title: "The Great Gatsby".to_string(),
            borrow_date: date(2024, 4, 1),
            due_date: date(2024, 4, 15),
        }
    );

    let store = &fixture.store;
    assert_eq!(store.book(id(1)).map(|b| b.status), Some(BookStatus::Borrowed));
    let user = store.user(id(2)).unwrap();
    assert_eq!((user.active_borrowings, user.total_borrowings), (1, 3));
    let request = store.request(id(2)).unwrap();
    assert!(request.is_active());
    assert_eq!(request.renewals, 0);
    assert_eq!(request.return_date, None);
    assert!(store.audit(5, 2).is_empty());

    assert_eq!(
        fixture.events(),
        vec![LoanEvent::Borrowed {
            request_id: id(2),
            user_id: id(2),
            book_id: id(1),
            due_date: date(2024, 4, 15),
        }]
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_borrow_returned_book_again() {
    let mut fixture = setup_test_fixture();
    fixture.lending().return_book(id(1)).unwrap();

    // Book 3 is back on the shelf, so user 1 may take it again
    let receipt = fixture.lending().borrow(id(1), id(3)).unwrap();
    assert_eq!(receipt.request_id, id(2));
    assert_eq!(receipt.due_date, date(2024, 4, 15));

    let user = fixture.store.user(id(1)).unwrap();
    assert_eq!((user.active_borrowings, user.total_borrowings), (1, 4));
    assert_eq!(fixture.store.active_request_for_book(id(3)).map(|r| r.id), Some(id(2)));
    assert!(fixture.store.audit(5, 2).is_empty());
}

#[test]
fn test_borrow_checks_preconditions_in_order() {
    let mut fixture = setup_test_fixture();
    let before = fixture.store.clone();

    // Missing user wins over missing book
    let err = fixture.lending().borrow(id(9), id(9));
    assert_eq!(err, Err(LibraryError::not_found(Entity::User, id(9))));

    let err = fixture.lending().borrow(id(2), id(9));
    assert_eq!(err, Err(LibraryError::not_found(Entity::Book, id(9))));

    let err = fixture.lending().borrow(id(2), id(3));
    assert_eq!(err, Err(Conflict::BookNotAvailable.into()));

    // Unavailable book wins over the cap
    fixture.policy.borrowing_cap = 1;
    let err = fixture.lending().borrow(id(1), id(3));
    assert_eq!(err, Err(Conflict::BookNotAvailable.into()));

    let err = fixture.lending().borrow(id(1), id(1));
    assert_eq!(err, Err(Conflict::BorrowingLimitReached { cap: 1 }.into()));

    assert_eq!(fixture.store, before);
    assert!(fixture.events().is_empty());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_borrowing_cap() {
    let mut fixture = setup_test_fixture();
    fixture.policy.borrowing_cap = 2;

    fixture.lending().borrow(id(2), id(1)).unwrap();
    fixture.lending().borrow(id(2), id(2)).unwrap();

    let mut dune = sample_books().remove(0);
    dune.id = id(4);
    dune.title = "Dune".to_string();
    fixture.store.books.insert(dune);
    let err = fixture.lending().borrow(id(2), id(4)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(fixture.store.user(id(2)).map(|u| u.active_borrowings), Some(2));
    assert_eq!(fixture.store.book(id(4)).map(|b| b.status), Some(BookStatus::Available));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_default_cap_allows_five_loans() {
    let mut fixture = setup_test_fixture();
    for raw in [4, 5, 6, 7, 8] {
        let mut copy = sample_books().remove(0);
        copy.id = id(raw);
        fixture.store.books.insert(copy);
    }

    for book in [1, 2, 4, 5, 6] {
        fixture.lending().borrow(id(2), id(book)).unwrap();
    }
    assert_eq!(fixture.store.user(id(2)).map(|u| u.active_borrowings), Some(5));

    let before = fixture.store.clone();
    let sixth = fixture.lending().borrow(id(2), id(7));
    assert_eq!(sixth, Err(Conflict::BorrowingLimitReached { cap: 5 }.into()));
    assert_eq!(fixture.store, before);
    assert_eq!(fixture.events().len(), 5);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_overdue_book() {
    let mut fixture = setup_test_fixture();
    fixture.set_today(date(2024, 3, 20));

    let receipt = fixture.lending().return_book(id(1)).unwrap();
    assert_eq!(receipt.book_title, "1984");
    assert_eq!(receipt.days_overdue, 5);
    assert_eq!(receipt.fine, Fine::from_cents(500));
    assert_eq!(receipt.fine.to_string(), "5.00");

    let store = &fixture.store;
    let request = store.request(id(1)).unwrap();
    assert_eq!(request.status, LoanStatus::Returned);
    assert_eq!(request.return_date, Some(date(2024, 3, 20)));
    assert_eq!(store.book(id(3)).map(|b| b.status), Some(BookStatus::Available));
    let user = store.user(id(1)).unwrap();
    assert_eq!((user.active_borrowings, user.total_borrowings), (0, 3));
    assert!(store.audit(5, 2).is_empty());

    assert_eq!(
        fixture.events(),
        vec![LoanEvent::Returned {
            request_id: id(1),
            book_id: id(3),
            days_overdue: 5,
            fine: Fine::from_cents(500),
        }]
    );
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_on_due_date_has_no_fine() {
    let mut fixture = setup_test_fixture();
    fixture.set_today(date(2024, 3, 15));

    let receipt = fixture.lending().return_book(id(1)).unwrap();
    assert_eq!(receipt.days_overdue, 0);
    assert!(receipt.fine.is_zero());
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_is_terminal() {
    let mut fixture = setup_test_fixture();
    fixture.lending().return_book(id(1)).unwrap();
    let after_first = fixture.store.clone();

    let again = fixture.lending().return_book(id(1));
    assert_eq!(again, Err(LibraryError::ActiveRequestNotFound(id(1))));
    let missing = fixture.lending().return_book(id(7));
    assert_eq!(missing, Err(LibraryError::ActiveRequestNotFound(id(7))));

    assert_eq!(fixture.store, after_first);
    assert_eq!(fixture.events().len(), 1);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_with_deleted_book() {
    let mut fixture = setup_test_fixture();
    fixture.store.books.remove(id(3));

    let receipt = fixture.lending().return_book(id(1)).unwrap();
    assert_eq!(receipt.book_title, UNKNOWN);
    assert_eq!(fixture.store.user(id(1)).map(|u| u.active_borrowings), Some(0));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_return_with_counter_already_at_zero() {
    let mut fixture = setup_test_fixture();
    if let Some(user) = fixture.store.users.get_mut(id(1)) {
        user.active_borrowings = 0;
    }

    fixture.lending().return_book(id(1)).unwrap();

    let store = &fixture.store;
    assert_eq!(store.user(id(1)).map(|u| u.active_borrowings), Some(0));
    assert_eq!(store.request(id(1)).map(|r| r.status), Some(LoanStatus::Returned));
    assert_eq!(store.book(id(3)).map(|b| b.status), Some(BookStatus::Available));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_renew_until_limit() {
    let mut fixture = setup_test_fixture();

    // Extensions count from the due date, not from today
    let first = fixture.lending().renew(id(1)).unwrap();
    assert_eq!(first.due_date, date(2024, 3, 22));
    assert_eq!(first.renewals, 1);

    let second = fixture.lending().renew(id(1)).unwrap();
    assert_eq!(second.due_date, date(2024, 3, 29));
    assert_eq!(second.renewals, 2);

    let before = fixture.store.clone();
    let third = fixture.lending().renew(id(1));
    assert_eq!(third, Err(Conflict::MaxRenewalsReached { max: 2 }.into()));
    assert_eq!(fixture.store, before);

    assert_eq!(fixture.events().len(), 2);
    assert!(matches!(
        fixture.events().last(),
        Some(LoanEvent::Renewed { renewals: 2, .. })
    ));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_renew_requires_active_request() {
    let mut fixture = setup_test_fixture();
    fixture.lending().return_book(id(1)).unwrap();

    let returned = fixture.lending().renew(id(1));
    assert_eq!(returned, Err(LibraryError::ActiveRequestNotFound(id(1))));
    let missing = fixture.lending().renew(id(8));
    assert_eq!(missing.map_err(|e| LibraryError::kind(&e)), Err(ErrorKind::NotFound));
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_full_lifecycle_events() {
    let mut fixture = setup_test_fixture();

    let borrowed = fixture.lending().borrow(id(2), id(2)).unwrap();
    fixture.lending().renew(borrowed.request_id).unwrap();
    fixture.set_today(date(2024, 4, 30));
    let returned = fixture.lending().return_book(borrowed.request_id).unwrap();

    // Due 2024-04-15, renewed to 2024-04-22, back on 2024-04-30
    assert_eq!(returned.days_overdue, 8);
    assert_eq!(returned.fine.to_string(), "8.00");

    let request_ids: Vec<Id> = fixture.events().iter().map(LoanEvent::request_id).collect();
    assert_eq!(request_ids, vec![id(2), id(2), id(2)]);
    assert!(matches!(
        fixture.events().as_slice(),
        [LoanEvent::Borrowed { .. }, LoanEvent::Renewed { .. }, LoanEvent::Returned { .. }]
    ));
}

#[test]
fn test_list_overdue() {
    let mut fixture = setup_test_fixture();
    let lending = fixture.lending();

    let overdue: Vec<OverdueLoan> = lending.list_overdue(date(2024, 3, 20)).collect();
    assert_eq!(
        overdue,
        vec![OverdueLoan {
            request_id: id(1),
            user_id: id(1),
            user_name: "John Doe".to_string(),
            book_id: id(3),
            book_title: "1984".to_string(),
            due_date: date(2024, 3, 15),
            days_overdue: 5,
        }]
    );

    // Asking again gives the same answer
    let again: Vec<OverdueLoan> = lending.list_overdue(date(2024, 3, 20)).collect();
    assert_eq!(again, overdue);

    // Not overdue on the due date itself
    assert_eq!(lending.list_overdue(date(2024, 3, 15)).count(), 0);
}

#[test]
#[allow(clippy::unwrap_used)]
fn test_returned_requests_are_never_overdue() {
    let mut fixture = setup_test_fixture();
    fixture.lending().return_book(id(1)).unwrap();
    assert_eq!(fixture.lending().list_overdue(date(2025, 1, 1)).count(), 0);
}

#[test]
fn test_popularity_ranking_keeps_first_borrowed_order_on_ties() {
    let mut fixture = setup_test_fixture();
    // Book 3 once (sample), then 1, 2, 2, 1 and a book that was deleted
    for (raw_id, book) in [(2, 1), (3, 2), (4, 2), (5, 1), (6, 42)] {
        fixture.store.requests.insert(returned_request(raw_id, 2, book));
    }

    let ranking = fixture.lending().popularity_ranking();
    let rows: Vec<(u32, &str, usize)> =
        ranking.iter().map(|p| (p.book_id.get(), p.title.as_str(), p.borrow_count)).collect();
    assert_eq!(
        rows,
        vec![
            (1, "The Great Gatsby", 2),
            (2, "To Kill a Mockingbird", 2),
            (3, "1984", 1),
            (42, UNKNOWN, 1),
        ]
    );
}

#[test]
fn test_popularity_ranking_is_capped() {
    let mut fixture = setup_test_fixture();
    for raw in 2..=20 {
        fixture.store.requests.insert(returned_request(raw, 2, raw));
    }
    assert_eq!(fixture.lending().popularity_ranking().len(), POPULAR_LIMIT);
}

#[test]
fn test_overdue_distribution() {
    let mut fixture = setup_test_fixture();
    for (raw_id, due) in [(2, date(2024, 3, 15)), (3, date(2024, 3, 18)), (4, date(2024, 3, 25))] {
        fixture.store.requests.insert(LoanRequest {
            due_date: due,
            status: LoanStatus::Active,
            return_date: None,
            ..returned_request(raw_id, 2, 1)
        });
    }

    let distribution = fixture.lending().overdue_distribution(date(2024, 3, 20));
    assert_eq!(distribution.total, 3);
    assert_eq!(distribution.by_days.into_iter().collect::<Vec<_>>(), vec![(2, 1), (5, 2)]);

    let none = fixture.lending().overdue_distribution(date(2024, 3, 1));
    assert_eq!(none, OverdueDistribution::default());
}

#[test]
fn test_requests_join_names() {
    let mut fixture = setup_test_fixture();
    fixture.store.requests.insert(returned_request(2, 9, 1));
    let lending = fixture.lending();

    let rows = lending.requests();
    let joined: Vec<(u32, &str, &str)> =
        rows.iter().map(|r| (r.request.id.get(), r.user_name, r.book_title)).collect();
    assert_eq!(joined, vec![(1, "John Doe", "1984"), (2, UNKNOWN, "The Great Gatsby")]);
}

#[test]
fn test_add_days_saturates() {
    assert_eq!(add_days(date(2024, 2, 20), 14), date(2024, 3, 5));
    assert_eq!(add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
}
