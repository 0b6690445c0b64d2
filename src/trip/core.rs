//! The core data model and database queries for trips.

use rusqlite::{Connection, Row, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, database_id::TripId};

/// A user-defined, date-bounded grouping of transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// The ID of the trip.
    pub id: TripId,
    /// The user who owns the trip.
    pub user_id: String,
    /// The display name, e.g. "Peru - Dec 2025".
    pub name: String,
    /// An optional free-form description.
    pub description: Option<String>,
    /// The first day of the trip, inclusive.
    pub start_date: Date,
    /// The last day of the trip, inclusive.
    pub end_date: Date,
    /// The user's home currency; spending in any other currency counts as
    /// foreign for the matcher.
    pub home_currency: String,
    /// Whether the trip is still shown as current.
    pub is_active: bool,
}

/// The user-editable fields of a trip.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    /// The display name.
    pub name: String,
    /// An optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// The first day of the trip, inclusive.
    pub start_date: Date,
    /// The last day of the trip, inclusive.
    pub end_date: Date,
    /// The user's home currency.
    #[serde(default = "default_home_currency")]
    pub home_currency: String,
}

fn default_home_currency() -> String {
    "USD".to_owned()
}

impl TripDraft {
    fn validate(&self) -> Result<(), Error> {
        if self.name.trim().is_empty() {
            return Err(Error::EmptyTripName);
        }

        if self.start_date > self.end_date {
            return Err(Error::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        Ok(())
    }
}

/// Create the trip table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_trip_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS trip (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL,
                home_currency TEXT NOT NULL DEFAULT 'USD',
                is_active INTEGER NOT NULL DEFAULT 1
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_trip_user ON trip(user_id)",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('trip', 0)",
        (),
    )?;

    Ok(())
}

/// Create a new trip for `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTripName] if the name is empty,
/// - [Error::InvalidDateRange] if the start date is after the end date,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_trip(draft: TripDraft, user_id: &str, connection: &Connection) -> Result<Trip, Error> {
    draft.validate()?;

    let trip = connection
        .prepare(
            "INSERT INTO trip (user_id, name, description, start_date, end_date, home_currency, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
             RETURNING id, user_id, name, description, start_date, end_date, home_currency, is_active",
        )?
        .query_row(
            (
                user_id,
                draft.name.trim(),
                &draft.description,
                draft.start_date,
                draft.end_date,
                &draft.home_currency,
            ),
            map_trip_row,
        )?;

    Ok(trip)
}

/// Retrieve a trip owned by `user_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a trip owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_trip(id: TripId, user_id: &str, connection: &Connection) -> Result<Trip, Error> {
    let trip = connection
        .prepare(
            "SELECT id, user_id, name, description, start_date, end_date, home_currency, is_active
             FROM trip WHERE id = ?1 AND user_id = ?2",
        )?
        .query_one((id, user_id), map_trip_row)?;

    Ok(trip)
}

/// Retrieve all trips belonging to `user_id`, most recent first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_trips_for_user(user_id: &str, connection: &Connection) -> Result<Vec<Trip>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, description, start_date, end_date, home_currency, is_active
             FROM trip WHERE user_id = :user_id ORDER BY start_date DESC, id DESC",
        )?
        .query_map(&[(":user_id", &user_id)], map_trip_row)?
        .map(|maybe_trip| maybe_trip.map_err(Error::from))
        .collect()
}

/// Update a trip owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::EmptyTripName] if the new name is empty,
/// - [Error::InvalidDateRange] if the new start date is after the new end date,
/// - [Error::NotFound] if `id` does not refer to a trip owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_trip(
    id: TripId,
    user_id: &str,
    draft: TripDraft,
    is_active: bool,
    connection: &Connection,
) -> Result<Trip, Error> {
    draft.validate()?;

    let rows_affected = connection.execute(
        "UPDATE trip
         SET name = ?1, description = ?2, start_date = ?3, end_date = ?4,
             home_currency = ?5, is_active = ?6
         WHERE id = ?7 AND user_id = ?8",
        (
            draft.name.trim(),
            &draft.description,
            draft.start_date,
            draft.end_date,
            &draft.home_currency,
            is_active,
            id,
            user_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_trip(id, user_id, connection)
}

/// Delete a trip owned by `user_id`, along with its assignments and their
/// overrides.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a trip owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_trip(id: TripId, user_id: &str, connection: &Connection) -> Result<(), Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Deferred)?;

    transaction.execute(
        "DELETE FROM trip_override WHERE trip_assignment_id IN
         (SELECT id FROM trip_assignment WHERE trip_id = ?1)",
        [id],
    )?;
    transaction.execute("DELETE FROM trip_assignment WHERE trip_id = ?1", [id])?;
    let rows_affected = transaction.execute(
        "DELETE FROM trip WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        // Drops the transaction without committing, leaving any assignments
        // of a trip the caller does not own untouched.
        return Err(Error::NotFound);
    }

    transaction.commit()?;

    Ok(())
}

fn map_trip_row(row: &Row) -> Result<Trip, rusqlite::Error> {
    Ok(Trip {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        home_currency: row.get(6)?,
        is_active: row.get(7)?,
    })
}
