//! The engine that brings the local store to parity with the provider.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;

use crate::{
    Error,
    account::update_account_balances,
    connection::{LinkedConnection, get_connections_for_user, update_cursor},
    provider::{ProviderClient, TransactionDelta},
    transaction::{Transaction, delete_transaction, insert_transaction_if_new, upsert_transaction},
};

/// Counts of feed records applied across one sync run.
///
/// The counts follow the provider's batches: a record the store already
/// agreed with still counts, since the batch carried it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    /// Transactions the feed reported as added.
    pub added: usize,
    /// Transactions the feed reported as modified.
    pub modified: usize,
    /// Transactions the feed reported as removed.
    pub removed: usize,
}

/// A cooperative cancellation handle for a sync run.
///
/// Cancellation is honored at the batch boundary: the engine stops
/// requesting further batches and leaves the persisted cursor at the last
/// completed batch, which is always safe to resume from.
#[derive(Debug, Clone, Default)]
pub struct SyncCancellation(Arc<AtomicBool>);

impl SyncCancellation {
    /// Create a handle that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that in-flight sync runs stop after their current batch.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// The per-connection outcome of a multi-connection sync run.
#[derive(Debug)]
pub struct ConnectionSyncReport {
    /// The connection the slot belongs to.
    pub connection_id: String,
    /// The connection's own outcome; one connection failing does not abort
    /// its siblings.
    pub result: Result<SyncOutcome, Error>,
}

/// Bring the local store up to date with the provider for one connection.
///
/// Runs the balance refresh first, then pulls the transaction change feed
/// from the connection's stored cursor until the provider reports no more
/// pages. Every batch is applied and its cursor persisted in a single
/// database transaction; a provider failure mid-run therefore leaves the
/// connection resumable from the last completed batch, and re-applying a
/// redelivered batch is a no-op thanks to the idempotent upsert and delete
/// semantics of the transaction store.
///
/// The database lock is never held across a provider call.
///
/// # Errors
/// This function will return a:
/// - [Error::ProviderUnavailable] or [Error::ProviderRejected] if the
///   provider call fails; the cursor stays at the last applied batch,
/// - [Error::DatabaseLockError] if the database lock is poisoned,
/// - or [Error::SqlError] if applying a batch fails.
pub async fn sync_connection(
    record: &LinkedConnection,
    provider: &dyn ProviderClient,
    cancellation: &SyncCancellation,
    db_connection: &Mutex<Connection>,
) -> Result<SyncOutcome, Error> {
    let snapshots = provider.fetch_account_balances(&record.access_token).await?;
    {
        let connection = db_connection.lock().map_err(|_| Error::DatabaseLockError)?;
        for snapshot in &snapshots {
            if !update_account_balances(snapshot, &connection)? {
                tracing::debug!(
                    "Skipping balance refresh for unknown account {} on connection {}",
                    snapshot.account_id,
                    record.id
                );
            }
        }
    }

    let mut cursor = record.cursor.clone();
    let mut outcome = SyncOutcome::default();

    loop {
        if cancellation.is_cancelled() {
            tracing::info!(
                "Sync of connection {} cancelled after {} added, {} modified, {} removed",
                record.id,
                outcome.added,
                outcome.modified,
                outcome.removed
            );
            break;
        }

        let delta = provider
            .fetch_transaction_delta(&record.access_token, cursor.as_deref())
            .await?;

        {
            let connection = db_connection.lock().map_err(|_| Error::DatabaseLockError)?;
            apply_delta_batch(&delta, record, &connection)?;
        }

        outcome.added += delta.added.len();
        outcome.modified += delta.modified.len();
        outcome.removed += delta.removed.len();

        cursor = Some(delta.next_cursor);

        if !delta.has_more {
            break;
        }
    }

    tracing::info!(
        "Synced connection {}: {} added, {} modified, {} removed",
        record.id,
        outcome.added,
        outcome.modified,
        outcome.removed
    );

    Ok(outcome)
}

/// Sync every connection belonging to `user_id`, reporting each outcome in
/// its own slot.
///
/// A failure on one connection is recorded in its slot and does not abort
/// the remaining connections.
///
/// # Errors
/// This function will return a:
/// - [Error::DatabaseLockError] if the database lock is poisoned,
/// - or [Error::SqlError] if the connection list cannot be read.
pub async fn sync_all_connections(
    user_id: &str,
    provider: &dyn ProviderClient,
    cancellation: &SyncCancellation,
    db_connection: &Mutex<Connection>,
) -> Result<Vec<ConnectionSyncReport>, Error> {
    let records = {
        let connection = db_connection.lock().map_err(|_| Error::DatabaseLockError)?;
        get_connections_for_user(user_id, &connection)?
    };

    let mut reports = Vec::with_capacity(records.len());
    for record in records {
        let result = sync_connection(&record, provider, cancellation, db_connection).await;

        if let Err(error) = &result {
            tracing::error!("Could not sync connection {}: {error}", record.id);
        }

        reports.push(ConnectionSyncReport {
            connection_id: record.id,
            result,
        });
    }

    Ok(reports)
}

/// Apply one delta batch and persist its cursor as a single atomic step.
///
/// Within a batch: added records are inserted with duplicates skipped,
/// modified records update-or-insert so they win over an added record
/// carrying the same ID, and removals run last so a modify and a removal of
/// the same ID resolve to the removal.
fn apply_delta_batch(
    delta: &TransactionDelta,
    record: &LinkedConnection,
    connection: &Connection,
) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    for dto in &delta.added {
        insert_transaction_if_new(&Transaction::from_dto(dto, &record.user_id), &transaction)?;
    }

    for dto in &delta.modified {
        upsert_transaction(&Transaction::from_dto(dto, &record.user_id), &transaction)?;
    }

    for removed in &delta.removed {
        delete_transaction(&removed.id, &transaction)?;
    }

    update_cursor(&record.id, &delta.next_cursor, &transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod sync_tests {
    use std::sync::Mutex;

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{create_account, get_account},
        connection::{LinkedConnection, NewConnection, create_connection, get_connection},
        db::initialize,
        provider::stub::{StubProvider, stub_delta, stub_snapshot, stub_txn},
        transaction::{count_transactions, get_transaction},
    };

    use super::{SyncCancellation, SyncOutcome, sync_all_connections, sync_connection};

    fn new_test_db() -> Mutex<Connection> {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        Mutex::new(conn)
    }

    fn link_test_connection(id: &str, db: &Mutex<Connection>) -> LinkedConnection {
        let conn = db.lock().unwrap();
        let record = create_connection(
            NewConnection {
                id,
                user_id: "user-1",
                access_token: "access-test-1",
                institution_id: "ins_1",
                institution_name: "First Test Bank",
            },
            &conn,
        )
        .unwrap();
        create_account(
            &stub_snapshot(&format!("acc-{id}"), 100.0, 100.0),
            id,
            "user-1",
            &conn,
        )
        .unwrap();
        record
    }

    #[tokio::test]
    async fn first_sync_applies_batches_and_persists_the_cursor() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new()
            .push_batch(stub_delta(
                vec![
                    stub_txn("txn-1", "acc-item-1", 10.0, date!(2025 - 12 - 01)),
                    stub_txn("txn-2", "acc-item-1", 20.0, date!(2025 - 12 - 02)),
                ],
                vec![],
                &[],
                "cursor-1",
                true,
            ))
            .push_batch(stub_delta(
                vec![stub_txn("txn-3", "acc-item-1", 30.0, date!(2025 - 12 - 03))],
                vec![],
                &[],
                "cursor-2",
                false,
            ));

        let outcome = sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SyncOutcome {
                added: 3,
                modified: 0,
                removed: 0
            }
        );
        let conn = db.lock().unwrap();
        assert_eq!(count_transactions(&conn).unwrap(), 3);
        let stored = get_connection("item-1", "user-1", &conn).unwrap();
        assert_eq!(stored.cursor.as_deref(), Some("cursor-2"));
        // The first fetch carried no cursor, the second carried batch one's.
        assert_eq!(
            provider.cursors_requested(),
            vec![None, Some("cursor-1".to_owned())]
        );
    }

    #[tokio::test]
    async fn resumes_from_the_stored_cursor() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new().push_batch(stub_delta(
            vec![stub_txn("txn-1", "acc-item-1", 10.0, date!(2025 - 12 - 01))],
            vec![],
            &[],
            "cursor-1",
            false,
        ));
        sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        let record = {
            let conn = db.lock().unwrap();
            get_connection("item-1", "user-1", &conn).unwrap()
        };
        let provider = StubProvider::new().push_batch(stub_delta(
            vec![],
            vec![],
            &[],
            "cursor-2",
            false,
        ));
        sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        assert_eq!(
            provider.cursors_requested(),
            vec![Some("cursor-1".to_owned())]
        );
    }

    #[tokio::test]
    async fn replaying_a_batch_is_idempotent() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let added = vec![
            stub_txn("txn-1", "acc-item-1", 10.0, date!(2025 - 12 - 01)),
            stub_txn("txn-2", "acc-item-1", 20.0, date!(2025 - 12 - 02)),
        ];
        let provider = StubProvider::new().push_batch(stub_delta(
            added.clone(),
            vec![],
            &["txn-gone"],
            "cursor-1",
            false,
        ));
        sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        // Simulate a crash before the cursor advanced: the same batch is
        // delivered again on the next run.
        let provider = StubProvider::new().push_batch(stub_delta(
            added,
            vec![],
            &["txn-gone"],
            "cursor-1",
            false,
        ));
        let outcome = sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        assert_eq!(outcome.added, 2);
        let conn = db.lock().unwrap();
        assert_eq!(count_transactions(&conn).unwrap(), 2);
        assert_eq!(
            get_connection("item-1", "user-1", &conn).unwrap().cursor.as_deref(),
            Some("cursor-1")
        );
    }

    #[tokio::test]
    async fn modified_wins_over_added_in_the_same_batch() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let stale = stub_txn("txn-1", "acc-item-1", 10.0, date!(2025 - 12 - 01));
        let mut authoritative = stale.clone();
        authoritative.amount = 12.5;
        let provider = StubProvider::new().push_batch(stub_delta(
            vec![stale],
            vec![authoritative],
            &[],
            "cursor-1",
            false,
        ));

        sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        let conn = db.lock().unwrap();
        assert_eq!(get_transaction("txn-1", &conn).unwrap().amount, 12.5);
    }

    #[tokio::test]
    async fn modify_for_an_unseen_transaction_inserts_it() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new().push_batch(stub_delta(
            vec![],
            vec![stub_txn("txn-new", "acc-item-1", 5.0, date!(2025 - 12 - 01))],
            &[],
            "cursor-1",
            false,
        ));

        let outcome = sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        assert_eq!(outcome.modified, 1);
        let conn = db.lock().unwrap();
        assert!(get_transaction("txn-new", &conn).is_ok());
    }

    #[tokio::test]
    async fn removal_wins_over_a_modify_in_the_same_batch() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new()
            .push_batch(stub_delta(
                vec![stub_txn("txn-1", "acc-item-1", 10.0, date!(2025 - 12 - 01))],
                vec![],
                &[],
                "cursor-1",
                true,
            ))
            .push_batch(stub_delta(
                vec![],
                vec![stub_txn("txn-1", "acc-item-1", 99.0, date!(2025 - 12 - 01))],
                &["txn-1"],
                "cursor-2",
                false,
            ));

        sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        let conn = db.lock().unwrap();
        assert_eq!(get_transaction("txn-1", &conn), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn removal_of_an_unknown_transaction_is_not_an_error() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new().push_batch(stub_delta(
            vec![],
            vec![],
            &["txn-never-stored"],
            "cursor-1",
            false,
        ));

        let outcome = sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        assert_eq!(outcome.removed, 1);
    }

    #[tokio::test]
    async fn removal_deletes_the_stored_transaction() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new()
            .push_batch(stub_delta(
                vec![stub_txn("txn-1", "acc-item-1", 10.0, date!(2025 - 12 - 01))],
                vec![],
                &[],
                "cursor-1",
                true,
            ))
            .push_batch(stub_delta(vec![], vec![], &["txn-1"], "cursor-2", false));

        sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        let conn = db.lock().unwrap();
        assert_eq!(get_transaction("txn-1", &conn), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn provider_failure_keeps_the_cursor_at_the_last_applied_batch() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new()
            .push_batch(stub_delta(
                vec![stub_txn("txn-1", "acc-item-1", 10.0, date!(2025 - 12 - 01))],
                vec![],
                &[],
                "cursor-1",
                true,
            ))
            .push_error(Error::ProviderUnavailable("timed out".to_owned()));

        let result = sync_connection(&record, &provider, &SyncCancellation::new(), &db).await;

        assert!(matches!(result, Err(Error::ProviderUnavailable(_))));
        let conn = db.lock().unwrap();
        // The first batch landed and its checkpoint survived the failure.
        assert_eq!(count_transactions(&conn).unwrap(), 1);
        assert_eq!(
            get_connection("item-1", "user-1", &conn).unwrap().cursor.as_deref(),
            Some("cursor-1")
        );
    }

    #[tokio::test]
    async fn balance_refresh_updates_known_accounts_only() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let provider = StubProvider::new()
            .with_balances(vec![
                stub_snapshot("acc-item-1", 55.5, 44.4),
                stub_snapshot("acc-unknown", 1.0, 1.0),
            ])
            .push_batch(stub_delta(vec![], vec![], &[], "cursor-1", false));

        sync_connection(&record, &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        let conn = db.lock().unwrap();
        let account = get_account("acc-item-1", &conn).unwrap();
        assert_eq!(account.current_balance, Some(55.5));
        assert_eq!(account.available_balance, Some(44.4));
        let unknown: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM account WHERE id = 'acc-unknown'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(unknown, 0);
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_next_batch() {
        let db = new_test_db();
        let record = link_test_connection("item-1", &db);
        let cancellation = SyncCancellation::new();
        cancellation.cancel();
        // No batches scripted: a fetch after cancellation would panic the stub.
        let provider = StubProvider::new();

        let outcome = sync_connection(&record, &provider, &cancellation, &db)
            .await
            .unwrap();

        assert_eq!(outcome, SyncOutcome::default());
        assert!(provider.cursors_requested().is_empty());
    }

    #[tokio::test]
    async fn one_failing_connection_does_not_abort_its_siblings() {
        let db = new_test_db();
        link_test_connection("item-1", &db);
        link_test_connection("item-2", &db);
        // Scripted in connection order: item-1 fails, item-2 succeeds.
        let provider = StubProvider::new()
            .push_error(Error::ProviderRejected("ITEM_LOGIN_REQUIRED".to_owned()))
            .push_batch(stub_delta(
                vec![stub_txn("txn-1", "acc-item-2", 10.0, date!(2025 - 12 - 01))],
                vec![],
                &[],
                "cursor-1",
                false,
            ));

        let reports = sync_all_connections("user-1", &provider, &SyncCancellation::new(), &db)
            .await
            .unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].connection_id, "item-1");
        assert!(matches!(
            reports[0].result,
            Err(Error::ProviderRejected(_))
        ));
        assert_eq!(reports[1].connection_id, "item-2");
        assert_eq!(
            reports[1].result,
            Ok(SyncOutcome {
                added: 1,
                modified: 0,
                removed: 0
            })
        );
    }

    #[tokio::test]
    async fn syncing_a_user_without_connections_reports_nothing() {
        let db = new_test_db();

        let reports = sync_all_connections("user-1", &StubProvider::new(), &SyncCancellation::new(), &db)
            .await
            .unwrap();

        assert!(reports.is_empty());
    }
}
