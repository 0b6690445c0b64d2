//! The core data model and database queries for transactions.

use rusqlite::{Connection, Row};
use serde::Serialize;
use time::Date;

use crate::{Error, provider::TransactionDto};

/// The provider-issued identifier for a transaction.
///
/// Globally unique and immutable; used as the idempotency key for upserts.
pub type TransactionId = String;

/// The fallback currency when the provider does not report one.
const DEFAULT_CURRENCY: &str = "USD";

/// The description used when the provider reports neither a name nor a
/// merchant.
const UNKNOWN_DESCRIPTION: &str = "Unknown";

/// A transaction mirrored from the provider's change feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The provider-issued transaction ID.
    pub id: TransactionId,
    /// The account the transaction belongs to.
    pub account_id: String,
    /// The user who owns the transaction.
    pub user_id: String,
    /// The signed amount. Positive values are outflows, matching the
    /// provider's convention.
    pub amount: f64,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The cleaned-up merchant name, when the provider derived one.
    pub merchant_name: Option<String>,
    /// The primary category assigned by the provider.
    pub category: Option<String>,
    /// The detailed category assigned by the provider.
    pub subcategory: Option<String>,
    /// The date the transaction posted. No time component.
    pub date: Date,
    /// The date the transaction was authorized, when known.
    pub authorized_date: Option<Date>,
    /// Whether the transaction is still pending settlement.
    pub pending: bool,
}

impl Transaction {
    /// Build a local record from a provider DTO for `user_id`.
    pub fn from_dto(dto: &TransactionDto, user_id: &str) -> Self {
        let description = if !dto.name.trim().is_empty() {
            dto.name.clone()
        } else if let Some(merchant_name) = &dto.merchant_name {
            merchant_name.clone()
        } else {
            UNKNOWN_DESCRIPTION.to_owned()
        };

        Self {
            id: dto.id.clone(),
            account_id: dto.account_id.clone(),
            user_id: user_id.to_owned(),
            amount: dto.amount,
            currency_code: dto
                .currency_code
                .clone()
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
            description,
            merchant_name: dto.merchant_name.clone(),
            category: dto.category_primary.clone(),
            subcategory: dto.category_detailed.clone(),
            date: dto.date,
            authorized_date: dto.authorized_date,
            pending: dto.pending,
        }
    }
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id TEXT PRIMARY KEY,
                account_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                amount REAL NOT NULL,
                currency_code TEXT NOT NULL,
                description TEXT NOT NULL,
                merchant_name TEXT,
                category TEXT,
                subcategory TEXT,
                date TEXT NOT NULL,
                authorized_date TEXT,
                pending INTEGER NOT NULL DEFAULT 0,
                FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Composite index used by the trip matcher's date-window scan.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date)",
        (),
    )?;

    Ok(())
}

/// Insert a transaction, treating a duplicate ID as success.
///
/// Returns `true` when a row was inserted and `false` when the ID was
/// already present. Redelivery of an already-applied batch is therefore a
/// no-op rather than an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if `account_id` does not
/// refer to a stored account or there is some other SQL error.
pub fn insert_transaction_if_new(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<bool, Error> {
    let result = connection.execute(
        "INSERT INTO \"transaction\"
         (id, account_id, user_id, amount, currency_code, description, merchant_name,
          category, subcategory, date, authorized_date, pending)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        (
            &transaction.id,
            &transaction.account_id,
            &transaction.user_id,
            transaction.amount,
            &transaction.currency_code,
            &transaction.description,
            &transaction.merchant_name,
            &transaction.category,
            &transaction.subcategory,
            transaction.date,
            transaction.authorized_date,
            transaction.pending,
        ),
    );

    match result {
        Ok(_) => Ok(true),
        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code:
                    rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY | rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        )) => Ok(false),
        Err(error) => Err(error.into()),
    }
}

/// Update a transaction by ID, inserting it when the ID is not known
/// locally.
///
/// The insert fallback covers modify records the provider emits for
/// transactions an earlier partial failure prevented us from storing.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn upsert_transaction(
    transaction: &Transaction,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
         SET amount = ?2, currency_code = ?3, description = ?4, merchant_name = ?5,
             category = ?6, subcategory = ?7, date = ?8, authorized_date = ?9, pending = ?10
         WHERE id = ?1",
        (
            &transaction.id,
            transaction.amount,
            &transaction.currency_code,
            &transaction.description,
            &transaction.merchant_name,
            &transaction.category,
            &transaction.subcategory,
            transaction.date,
            transaction.authorized_date,
            transaction.pending,
        ),
    )?;

    if rows_affected == 0 {
        insert_transaction_if_new(transaction, connection)?;
    }

    Ok(())
}

/// Delete a transaction by ID.
///
/// Returns `true` when a row was deleted. Absence of the ID is not an
/// error; the provider may remove transactions we never stored.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_transaction(id: &str, connection: &Connection) -> Result<bool, Error> {
    let rows_affected =
        connection.execute("DELETE FROM \"transaction\" WHERE id = :id", &[(":id", &id)])?;

    Ok(rows_affected > 0)
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: &str, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, account_id, user_id, amount, currency_code, description, merchant_name,
                    category, subcategory, date, authorized_date, pending
             FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub(crate) fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        account_id: row.get(1)?,
        user_id: row.get(2)?,
        amount: row.get(3)?,
        currency_code: row.get(4)?,
        description: row.get(5)?,
        merchant_name: row.get(6)?,
        category: row.get(7)?,
        subcategory: row.get(8)?,
        date: row.get(9)?,
        authorized_date: row.get(10)?,
        pending: row.get(11)?,
    })
}
