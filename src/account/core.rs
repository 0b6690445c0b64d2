//! The core data model and database queries for accounts.

use rusqlite::{Connection, Row};
use serde::Serialize;

use crate::{Error, provider::AccountSnapshot};

/// The provider-issued identifier for an account.
pub type AccountId = String;

/// The fallback currency when the provider does not report one.
const DEFAULT_CURRENCY: &str = "USD";

/// A bank account or credit card at a linked institution.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// The provider-issued account ID.
    pub id: AccountId,
    /// The connection the account was discovered through.
    pub connection_id: String,
    /// The user who owns the account.
    pub user_id: String,
    /// The display name of the account.
    pub name: String,
    /// The institution's official name for the account.
    pub official_name: Option<String>,
    /// The last 2-4 digits of the account number.
    pub mask: Option<String>,
    /// The account type, e.g. "depository" or "credit".
    #[serde(rename = "type")]
    pub kind: String,
    /// The account subtype, e.g. "checking".
    pub subtype: Option<String>,
    /// The posted balance from the most recent refresh.
    pub current_balance: Option<f64>,
    /// The available balance from the most recent refresh.
    pub available_balance: Option<f64>,
    /// ISO 4217 currency code of the balances.
    pub currency_code: String,
    /// Whether the account is still reported by the institution.
    pub is_active: bool,
}

/// Create the account table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
                id TEXT PRIMARY KEY,
                connection_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                name TEXT NOT NULL,
                official_name TEXT,
                mask TEXT,
                type TEXT NOT NULL,
                subtype TEXT,
                current_balance REAL,
                available_balance REAL,
                currency_code TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                FOREIGN KEY(connection_id) REFERENCES connection(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_account_user ON account(user_id)",
        (),
    )?;

    Ok(())
}

/// Store an account discovered at link time from a provider snapshot.
///
/// # Errors
/// This function will return an [Error::SqlError] if `connection_id` does
/// not refer to a stored connection or there is some other SQL error.
pub fn create_account(
    snapshot: &AccountSnapshot,
    connection_id: &str,
    user_id: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let currency_code = snapshot
        .balances
        .currency_code
        .clone()
        .unwrap_or_else(|| DEFAULT_CURRENCY.to_owned());

    let account = connection
        .prepare(
            "INSERT INTO account
             (id, connection_id, user_id, name, official_name, mask, type, subtype,
              current_balance, available_balance, currency_code, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1)
             RETURNING id, connection_id, user_id, name, official_name, mask, type, subtype,
                       current_balance, available_balance, currency_code, is_active",
        )?
        .query_row(
            (
                &snapshot.account_id,
                connection_id,
                user_id,
                &snapshot.name,
                &snapshot.official_name,
                &snapshot.mask,
                &snapshot.kind,
                &snapshot.subtype,
                snapshot.balances.current,
                snapshot.balances.available,
                currency_code,
            ),
            map_account_row,
        )?;

    Ok(account)
}

/// Update the balance fields of an already-known account in place.
///
/// Returns `true` when a stored account matched the snapshot's ID. Unknown
/// accounts are left alone: account discovery happens only at link time.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn update_account_balances(
    snapshot: &AccountSnapshot,
    connection: &Connection,
) -> Result<bool, Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET current_balance = ?1, available_balance = ?2 WHERE id = ?3",
        (
            snapshot.balances.current,
            snapshot.balances.available,
            &snapshot.account_id,
        ),
    )?;

    Ok(rows_affected > 0)
}

/// Retrieve all accounts belonging to `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_accounts_for_user(
    user_id: &str,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, connection_id, user_id, name, official_name, mask, type, subtype,
                    current_balance, available_balance, currency_code, is_active
             FROM account WHERE user_id = :user_id ORDER BY name ASC",
        )?
        .query_map(&[(":user_id", &user_id)], map_account_row)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// Retrieve an account from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored account,
/// - or [Error::SqlError] if there is some other SQL error.
#[cfg(test)]
pub fn get_account(id: &str, connection: &Connection) -> Result<Account, Error> {
    let account = connection
        .prepare(
            "SELECT id, connection_id, user_id, name, official_name, mask, type, subtype,
                    current_balance, available_balance, currency_code, is_active
             FROM account WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_account_row)?;

    Ok(account)
}

fn map_account_row(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        connection_id: row.get(1)?,
        user_id: row.get(2)?,
        name: row.get(3)?,
        official_name: row.get(4)?,
        mask: row.get(5)?,
        kind: row.get(6)?,
        subtype: row.get(7)?,
        current_balance: row.get(8)?,
        available_balance: row.get(9)?,
        currency_code: row.get(10)?,
        is_active: row.get(11)?,
    })
}
