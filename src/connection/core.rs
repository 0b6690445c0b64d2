//! The core data model and database queries for linked connections.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::OffsetDateTime;

use crate::Error;

/// The provider-issued identifier for a linked connection.
pub type ConnectionId = String;

/// One authorized link between a user and a financial institution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedConnection {
    /// The provider-issued item ID.
    pub id: ConnectionId,
    /// The user who authorized the link.
    pub user_id: String,
    /// The credential for provider calls. Never serialized.
    #[serde(skip_serializing)]
    pub access_token: String,
    /// The provider's identifier for the institution.
    pub institution_id: String,
    /// The display name of the institution.
    pub institution_name: String,
    /// The opaque sync checkpoint, `None` before the first sync.
    ///
    /// Only the sync engine writes this field, and only after the batch it
    /// finalizes has been durably applied.
    pub cursor: Option<String>,
    /// When the connection was linked.
    pub created_at: OffsetDateTime,
    /// When the connection was last updated (cursor writes included).
    pub updated_at: OffsetDateTime,
}

/// The fields needed to store a freshly exchanged connection.
#[derive(Debug)]
pub struct NewConnection<'a> {
    /// The provider-issued item ID.
    pub id: &'a str,
    /// The user who authorized the link.
    pub user_id: &'a str,
    /// The access token returned by the token exchange.
    pub access_token: &'a str,
    /// The provider's identifier for the institution.
    pub institution_id: &'a str,
    /// The display name of the institution.
    pub institution_name: &'a str,
}

/// Create the connection table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_connection_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS connection (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                access_token TEXT NOT NULL,
                institution_id TEXT NOT NULL,
                institution_name TEXT NOT NULL,
                cursor TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_connection_user ON connection(user_id)",
        (),
    )?;

    Ok(())
}

/// Store a connection created by a successful token exchange.
///
/// # Errors
/// This function will return an [Error::SqlError] if the connection ID
/// already exists or there is some other SQL error.
pub fn create_connection(
    new_connection: NewConnection,
    connection: &Connection,
) -> Result<LinkedConnection, Error> {
    let now = OffsetDateTime::now_utc();

    let record = connection
        .prepare(
            "INSERT INTO connection
             (id, user_id, access_token, institution_id, institution_name, cursor, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)
             RETURNING id, user_id, access_token, institution_id, institution_name, cursor, created_at, updated_at",
        )?
        .query_row(
            (
                new_connection.id,
                new_connection.user_id,
                new_connection.access_token,
                new_connection.institution_id,
                new_connection.institution_name,
                now,
            ),
            map_connection_row,
        )?;

    Ok(record)
}

/// Retrieve a connection owned by `user_id` from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a connection owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_connection(
    id: &str,
    user_id: &str,
    connection: &Connection,
) -> Result<LinkedConnection, Error> {
    let record = connection
        .prepare(
            "SELECT id, user_id, access_token, institution_id, institution_name, cursor, created_at, updated_at
             FROM connection WHERE id = :id AND user_id = :user_id",
        )?
        .query_one(&[(":id", &id), (":user_id", &user_id)], map_connection_row)?;

    Ok(record)
}

/// Retrieve all connections belonging to `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_connections_for_user(
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<LinkedConnection>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, access_token, institution_id, institution_name, cursor, created_at, updated_at
             FROM connection WHERE user_id = :user_id ORDER BY created_at ASC, id ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_connection_row)?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// Persist the sync cursor for a connection.
///
/// The caller is expected to run this inside the same SQL transaction that
/// applies the batch the cursor finalizes.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored connection,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_cursor(id: &str, cursor: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE connection SET cursor = ?1, updated_at = ?2 WHERE id = ?3",
        (cursor, OffsetDateTime::now_utc(), id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Delete a connection owned by `user_id`, cascading to its accounts,
/// their transactions, and any trip assignments of those transactions.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a connection owned by the user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn delete_connection(id: &str, user_id: &str, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM connection WHERE id = ?1 AND user_id = ?2",
        (id, user_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_connection_row(row: &Row) -> Result<LinkedConnection, rusqlite::Error> {
    Ok(LinkedConnection {
        id: row.get(0)?,
        user_id: row.get(1)?,
        access_token: row.get(2)?,
        institution_id: row.get(3)?,
        institution_name: row.get(4)?,
        cursor: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}
