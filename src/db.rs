//! Database initialization for the application's domain models.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error, account::create_account_table, connection::create_connection_table,
    transaction::create_transaction_table,
    trip::{create_trip_assignment_table, create_trip_override_table, create_trip_table},
};

/// Create the tables for the domain models.
///
/// Tables are created inside a single exclusive transaction so that a
/// half-initialized schema is never left behind.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_connection_table(&transaction)?;
    create_account_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_trip_table(&transaction)?;
    create_trip_assignment_table(&transaction)?;
    create_trip_override_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
