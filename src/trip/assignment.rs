//! The link between a transaction and a trip.

use std::collections::HashSet;

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{AssignmentId, TripId},
    transaction::TransactionId,
};

/// One transaction's membership in one trip.
///
/// The pair (trip, transaction) is unique: a transaction appears in at most
/// one assignment per trip, though it may still appear in other trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripAssignment {
    /// The ID of the assignment row.
    pub id: AssignmentId,
    /// The trip the transaction was assigned to.
    pub trip_id: TripId,
    /// The assigned transaction.
    pub transaction_id: TransactionId,
    /// How likely the transaction belongs to the trip, in [0, 1].
    pub confidence: f64,
    /// Whether the user assigned the transaction directly. Manual
    /// assignments always carry confidence 1.0.
    pub is_manual: bool,
    /// When the assignment was created.
    pub created_at: OffsetDateTime,
}

/// Create the trip assignment table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_trip_assignment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS trip_assignment (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                trip_id INTEGER NOT NULL,
                transaction_id TEXT NOT NULL,
                confidence REAL NOT NULL DEFAULT 1.0,
                is_manual INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(trip_id) REFERENCES trip(id) ON UPDATE CASCADE ON DELETE CASCADE,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id) ON UPDATE CASCADE ON DELETE CASCADE,
                UNIQUE(trip_id, transaction_id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_trip_assignment_transaction ON trip_assignment(transaction_id)",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('trip_assignment', 0)",
        (),
    )?;

    Ok(())
}

/// Insert an assignment, treating a duplicate (trip, transaction) pair as
/// success.
///
/// Returns `true` when a row was inserted and `false` when the pair was
/// already assigned. Concurrent auto-matches and manual adds therefore
/// cannot double-assign a transaction.
///
/// # Errors
/// This function will return an [Error::SqlError] if the trip or the
/// transaction does not exist, or there is some other SQL error.
pub fn insert_assignment_if_new(
    trip_id: TripId,
    transaction_id: &str,
    confidence: f64,
    is_manual: bool,
    connection: &Connection,
) -> Result<bool, Error> {
    let result = connection.execute(
        "INSERT INTO trip_assignment (trip_id, transaction_id, confidence, is_manual, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        (
            trip_id,
            transaction_id,
            confidence,
            is_manual,
            OffsetDateTime::now_utc(),
        ),
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )) => Ok(false),
        Err(error) => Err(error.into()),
    }
}

/// The IDs of all transactions already assigned to `trip_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_assigned_transaction_ids(
    trip_id: TripId,
    connection: &Connection,
) -> Result<HashSet<TransactionId>, Error> {
    connection
        .prepare("SELECT transaction_id FROM trip_assignment WHERE trip_id = :trip_id")?
        .query_map(&[(":trip_id", &trip_id)], |row| row.get(0))?
        .map(|maybe_id| maybe_id.map_err(Error::from))
        .collect()
}

/// Retrieve an assignment by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored assignment,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_assignment(
    id: AssignmentId,
    connection: &Connection,
) -> Result<TripAssignment, Error> {
    let assignment = connection
        .prepare(
            "SELECT id, trip_id, transaction_id, confidence, is_manual, created_at
             FROM trip_assignment WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_assignment_row)?;

    Ok(assignment)
}

/// Delete the assignments of the given transactions to `trip_id`, cascading
/// their overrides.
///
/// Returns the number of assignments actually removed; IDs that were never
/// assigned simply do not count.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn remove_assignments(
    trip_id: TripId,
    transaction_ids: &[String],
    connection: &Connection,
) -> Result<usize, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Deferred)?;

    let mut removed = 0;
    {
        let mut delete_override = transaction.prepare(
            "DELETE FROM trip_override WHERE trip_assignment_id IN
             (SELECT id FROM trip_assignment WHERE trip_id = ?1 AND transaction_id = ?2)",
        )?;
        let mut delete_assignment = transaction
            .prepare("DELETE FROM trip_assignment WHERE trip_id = ?1 AND transaction_id = ?2")?;

        for transaction_id in transaction_ids {
            delete_override.execute((trip_id, transaction_id))?;
            removed += delete_assignment.execute((trip_id, transaction_id))?;
        }
    }

    transaction.commit()?;

    Ok(removed)
}

fn map_assignment_row(row: &Row) -> Result<TripAssignment, rusqlite::Error> {
    Ok(TripAssignment {
        id: row.get(0)?,
        trip_id: row.get(1)?,
        transaction_id: row.get(2)?,
        confidence: row.get(3)?,
        is_manual: row.get(4)?,
        created_at: row.get(5)?,
    })
}
