use medsched_core::{
    AccountScope, BearerToken, DayGroupNode, DayOfWeek, DraftValues, FieldKey, GridError,
    GridService, NodeLevel, PersistTicket, PersonNode, ReminderEntryNode, ReminderStore,
    ReminderTree, StoreFailure, StoreResult, SyncError, TimeOfDay, TokenProvider,
};
use std::cell::RefCell;
use uuid::Uuid;

struct StaticTokens;

impl TokenProvider for StaticTokens {
    fn bearer_token(&self) -> StoreResult<BearerToken> {
        Ok(BearerToken::new("test-token"))
    }
}

struct NoTokens;

impl TokenProvider for NoTokens {
    fn bearer_token(&self) -> StoreResult<BearerToken> {
        Err(StoreFailure::TokenUnavailable {
            message: "session expired".to_string(),
        })
    }
}

/// Store whose replace outcome is configured per test.
struct FlakyStore {
    outcome: RefCell<Result<(), StoreFailure>>,
}

impl FlakyStore {
    fn failing(failure: StoreFailure) -> Self {
        Self {
            outcome: RefCell::new(Err(failure)),
        }
    }
}

impl ReminderStore for FlakyStore {
    fn fetch_tree(&self, _scope: &AccountScope, _token: &BearerToken) -> StoreResult<ReminderTree> {
        Err(StoreFailure::Unavailable {
            message: "fetch not under test".to_string(),
        })
    }

    fn replace_tree(&self, _tree: &ReminderTree, _token: &BearerToken) -> StoreResult<()> {
        self.outcome.borrow().clone()
    }
}

fn seed_tree() -> ReminderTree {
    let mut ana = PersonNode::new("Ana");
    let mut monday = DayGroupNode::new(DayOfWeek::Monday);
    monday
        .entries
        .push(ReminderEntryNode::new("Ibuprofen", TimeOfDay::try_new(8, 0).unwrap()));
    ana.groups.push(monday);
    ReminderTree::new(vec![ana, PersonNode::new("Rui")])
}

#[test]
fn optimistic_delete_is_visible_before_the_remote_settles() {
    let tree = seed_tree();
    let rui_id = tree.persons[1].id;
    let mut grid = GridService::with_tree(tree);

    let pending = grid.delete_node(rui_id, NodeLevel::Person).unwrap();

    assert!(grid.is_busy());
    assert_eq!(grid.tree().persons.len(), 1);

    grid.resolve_sync(pending.ticket, Ok(())).unwrap();
    assert!(!grid.is_busy());
    assert_eq!(grid.tree().persons.len(), 1);
}

#[test]
fn failed_persist_restores_the_pre_mutation_snapshot() {
    let tree = seed_tree();
    let before = tree.clone();
    let rui_id = tree.persons[1].id;
    let mut grid = GridService::with_tree(tree);

    let pending = grid.delete_node(rui_id, NodeLevel::Person).unwrap();
    let err = grid
        .resolve_sync(
            pending.ticket,
            Err(StoreFailure::Rejected {
                status: 502,
                message: "bad gateway".to_string(),
            }),
        )
        .expect_err("failed persist must surface");

    assert!(matches!(
        err,
        GridError::Sync(SyncError::Persist {
            failure: StoreFailure::Rejected { status: 502, .. }
        })
    ));
    assert_eq!(grid.tree(), &before);
    assert!(!grid.is_busy());
}

#[test]
fn timeout_counts_as_failure_and_rolls_back() {
    let tree = seed_tree();
    let before = tree.clone();
    let entry_id = tree.persons[0].groups[0].entries[0].id;
    let mut grid = GridService::with_tree(tree);
    let store = FlakyStore::failing(StoreFailure::Timeout);

    grid.begin_edit(entry_id, NodeLevel::Entry).unwrap();
    let mut change = DraftValues::new();
    change.insert(FieldKey::TimeOfDay, "20:00".to_string());
    grid.update_draft(change).unwrap();

    let err = grid
        .save_active_edit_via(&store, &StaticTokens)
        .expect_err("timed out persist must surface");
    assert!(matches!(
        err,
        GridError::Sync(SyncError::Persist {
            failure: StoreFailure::Timeout
        })
    ));
    assert_eq!(grid.tree(), &before);
}

#[test]
fn token_failure_during_transport_rolls_back_like_any_persist_failure() {
    let tree = seed_tree();
    let before = tree.clone();
    let rui_id = tree.persons[1].id;
    let mut grid = GridService::with_tree(tree);
    let store = FlakyStore::failing(StoreFailure::Timeout);

    let err = grid
        .delete_node_via(&store, &NoTokens, rui_id, NodeLevel::Person)
        .expect_err("missing token must fail the persist");
    assert!(matches!(
        err,
        GridError::Sync(SyncError::Persist {
            failure: StoreFailure::TokenUnavailable { .. }
        })
    ));
    assert_eq!(grid.tree(), &before);
    assert!(!grid.is_busy());
}

#[test]
fn mutations_are_serialized_while_a_persist_is_in_flight() {
    let tree = seed_tree();
    let entry_id = tree.persons[0].groups[0].entries[0].id;
    let rui_id = tree.persons[1].id;
    let mut grid = GridService::with_tree(tree);

    let pending = grid.delete_node(rui_id, NodeLevel::Person).unwrap();

    // A save attempted while busy keeps its session and draft for retry.
    grid.begin_edit(entry_id, NodeLevel::Entry).unwrap();
    let mut change = DraftValues::new();
    change.insert(FieldKey::TimeOfDay, "20:00".to_string());
    grid.update_draft(change).unwrap();
    let err = grid.save_active_edit().expect_err("busy save must fail");
    assert_eq!(err, GridError::Sync(SyncError::PersistInFlight));
    assert!(grid.is_editing(entry_id));

    // Deletes, inserts and reloads are rejected the same way.
    assert_eq!(
        grid.delete_node(entry_id, NodeLevel::Entry),
        Err(GridError::Sync(SyncError::PersistInFlight))
    );
    assert_eq!(
        grid.add_person("Maria").unwrap_err(),
        GridError::Sync(SyncError::PersistInFlight)
    );
    assert_eq!(
        grid.install_tree(ReminderTree::default()),
        Err(GridError::Sync(SyncError::PersistInFlight))
    );

    // After the in-flight call settles the retried save goes through.
    grid.resolve_sync(pending.ticket, Ok(())).unwrap();
    let retried = grid.save_active_edit().unwrap();
    grid.resolve_sync(retried.ticket, Ok(())).unwrap();
    assert_eq!(
        grid.tree().persons[0].groups[0].entries[0].time_of_day,
        TimeOfDay::try_new(20, 0).unwrap()
    );
}

#[test]
fn cancelling_an_edit_does_not_disturb_an_in_flight_persist() {
    let tree = seed_tree();
    let entry_id = tree.persons[0].groups[0].entries[0].id;
    let rui_id = tree.persons[1].id;
    let mut grid = GridService::with_tree(tree);

    let pending = grid.delete_node(rui_id, NodeLevel::Person).unwrap();
    let after_delete = grid.tree().clone();

    grid.begin_edit(entry_id, NodeLevel::Entry).unwrap();
    grid.cancel_edit();

    assert!(grid.is_busy());
    assert_eq!(grid.tree(), &after_delete);
    grid.resolve_sync(pending.ticket, Ok(())).unwrap();
    assert_eq!(grid.tree(), &after_delete);
}

#[test]
fn resolve_rejects_stale_tickets_without_losing_the_persist() {
    let tree = seed_tree();
    let rui_id = tree.persons[1].id;
    let mut grid = GridService::with_tree(tree);

    let pending = grid.delete_node(rui_id, NodeLevel::Person).unwrap();
    let stale = PersistTicket::from_value(pending.ticket.value() + 7);

    let err = grid
        .resolve_sync(stale, Ok(()))
        .expect_err("stale ticket must not resolve");
    assert!(matches!(err, GridError::Sync(SyncError::TicketMismatch { .. })));
    assert!(grid.is_busy());

    grid.resolve_sync(pending.ticket, Ok(())).unwrap();
    assert!(!grid.is_busy());
}

#[test]
fn resolve_without_a_pending_persist_is_an_error() {
    let mut grid = GridService::with_tree(seed_tree());
    let err = grid
        .resolve_sync(PersistTicket::from_value(1), Ok(()))
        .expect_err("nothing to resolve");
    assert_eq!(err, GridError::Sync(SyncError::NoPersistInFlight));
}

#[test]
fn delete_of_a_missing_row_does_not_open_a_persist_window() {
    let mut grid = GridService::with_tree(seed_tree());
    let err = grid
        .delete_node(Uuid::new_v4(), NodeLevel::DayGroup)
        .expect_err("missing row must fail");
    assert!(matches!(err, GridError::Mutation(_)));
    assert!(!grid.is_busy());
}
