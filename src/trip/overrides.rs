//! Category overrides layered on top of trip assignments.
//!
//! An override re-categorizes a transaction within one trip without ever
//! mutating the underlying transaction record.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::{AssignmentId, DatabaseId},
};

/// A per-trip annotation for one assignment. At most one exists per
/// assignment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripOverride {
    /// The ID of the override row.
    pub id: DatabaseId,
    /// The assignment the override annotates.
    pub trip_assignment_id: AssignmentId,
    /// Replaces the transaction's category within this trip.
    pub category_override: Option<String>,
    /// Replaces the transaction's subcategory within this trip.
    pub subcategory_override: Option<String>,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// The user-editable fields of an override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideDraft {
    /// Replaces the transaction's category within this trip.
    #[serde(default)]
    pub category_override: Option<String>,
    /// Replaces the transaction's subcategory within this trip.
    #[serde(default)]
    pub subcategory_override: Option<String>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Create the trip override table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_trip_override_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS trip_override (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                trip_assignment_id INTEGER NOT NULL UNIQUE,
                category_override TEXT,
                subcategory_override TEXT,
                notes TEXT,
                FOREIGN KEY(trip_assignment_id) REFERENCES trip_assignment(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('trip_override', 0)",
        (),
    )?;

    Ok(())
}

/// Set the override for an assignment, replacing any existing one.
///
/// # Errors
/// This function will return an [Error::SqlError] if `assignment_id` does
/// not refer to a stored assignment, or there is some other SQL error.
pub fn set_override(
    assignment_id: AssignmentId,
    draft: &OverrideDraft,
    connection: &Connection,
) -> Result<TripOverride, Error> {
    let rows_affected = connection.execute(
        "UPDATE trip_override
         SET category_override = ?2, subcategory_override = ?3, notes = ?4
         WHERE trip_assignment_id = ?1",
        (
            assignment_id,
            &draft.category_override,
            &draft.subcategory_override,
            &draft.notes,
        ),
    )?;

    if rows_affected == 0 {
        connection.execute(
            "INSERT INTO trip_override (trip_assignment_id, category_override, subcategory_override, notes)
             VALUES (?1, ?2, ?3, ?4)",
            (
                assignment_id,
                &draft.category_override,
                &draft.subcategory_override,
                &draft.notes,
            ),
        )?;
    }

    get_override(assignment_id, connection)
}

/// Retrieve the override for an assignment, if one exists.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if the assignment has no override,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_override(
    assignment_id: AssignmentId,
    connection: &Connection,
) -> Result<TripOverride, Error> {
    let record = connection
        .prepare(
            "SELECT id, trip_assignment_id, category_override, subcategory_override, notes
             FROM trip_override WHERE trip_assignment_id = :id",
        )?
        .query_one(&[(":id", &assignment_id)], map_override_row)?;

    Ok(record)
}

/// Delete the override for an assignment.
///
/// Returns `true` when an override existed; clearing an absent override is
/// not an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_override(
    assignment_id: AssignmentId,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM trip_override WHERE trip_assignment_id = :id",
        &[(":id", &assignment_id)],
    )?;

    Ok(rows_affected > 0)
}

fn map_override_row(row: &Row) -> Result<TripOverride, rusqlite::Error> {
    Ok(TripOverride {
        id: row.get(0)?,
        trip_assignment_id: row.get(1)?,
        category_override: row.get(2)?,
        subcategory_override: row.get(3)?,
        notes: row.get(4)?,
    })
}
