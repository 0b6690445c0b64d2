//! The read-only spending summary for a trip.
//!
//! Everything here is recomputed on demand from stored state and never
//! persisted, so it can be rebuilt idempotently at any time.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{Error, database_id::{AssignmentId, TripId}, transaction::TransactionId};

/// Assignments below this confidence are flagged for review. Manual
/// assignments carry confidence 1.0 and are therefore never flagged.
const REVIEW_THRESHOLD: f64 = 0.6;

/// The category reported when neither an override nor the provider supplies
/// one.
const UNCATEGORIZED: &str = "Uncategorized";

/// One assigned transaction with its account, institution, and override
/// context, as shown on a trip's transaction list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripTransactionRow {
    /// The ID of the assignment row.
    pub assignment_id: AssignmentId,
    /// The assignment's confidence score.
    pub confidence: f64,
    /// Whether the user assigned the transaction directly.
    pub is_manual: bool,
    /// The provider-issued transaction ID.
    pub transaction_id: TransactionId,
    /// The signed amount.
    pub amount: f64,
    /// ISO 4217 currency code.
    pub currency_code: String,
    /// The transaction description.
    pub description: String,
    /// The cleaned-up merchant name, when known.
    pub merchant_name: Option<String>,
    /// The provider category, when known.
    pub category: Option<String>,
    /// The provider subcategory, when known.
    pub subcategory: Option<String>,
    /// The date the transaction posted.
    pub date: Date,
    /// Whether the transaction is still pending settlement.
    pub pending: bool,
    /// The display name of the transaction's account.
    pub account_name: String,
    /// The institution the account belongs to.
    pub institution_name: String,
    /// The category override for this trip, if any.
    pub category_override: Option<String>,
    /// The subcategory override for this trip, if any.
    pub subcategory_override: Option<String>,
    /// Free-form override notes, if any.
    pub notes: Option<String>,
}

impl TripTransactionRow {
    /// The category the row counts under: override if present, else the
    /// transaction's own category, else "Uncategorized".
    fn effective_category(&self) -> &str {
        self.category_override
            .as_deref()
            .or(self.category.as_deref())
            .unwrap_or(UNCATEGORIZED)
    }
}

/// Aggregate spending figures for a trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    /// The sum of signed amounts across all assigned transactions.
    pub total_spend: f64,
    /// How many transactions are assigned.
    pub transaction_count: usize,
    /// Summed amounts keyed by effective category.
    pub category_breakdown: BTreeMap<String, f64>,
    /// Assignments with confidence below 0.6.
    pub needs_review: usize,
    /// Assignments at or above the review threshold.
    pub reviewed: usize,
}

/// Headline figures for a trip's detail view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStats {
    /// How many transactions are assigned.
    pub transaction_count: usize,
    /// The sum of signed amounts across all assigned transactions.
    pub total_spend: f64,
}

/// The assigned transactions of `trip_id` with account, institution, and
/// override context, most recent first.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_trip_transactions(
    trip_id: TripId,
    connection: &Connection,
) -> Result<Vec<TripTransactionRow>, Error> {
    connection
        .prepare(
            "SELECT ta.id, ta.confidence, ta.is_manual,
                    t.id, t.amount, t.currency_code, t.description, t.merchant_name,
                    t.category, t.subcategory, t.date, t.pending,
                    a.name, c.institution_name,
                    o.category_override, o.subcategory_override, o.notes
             FROM trip_assignment ta
             INNER JOIN \"transaction\" t ON ta.transaction_id = t.id
             INNER JOIN account a ON t.account_id = a.id
             INNER JOIN connection c ON a.connection_id = c.id
             LEFT JOIN trip_override o ON o.trip_assignment_id = ta.id
             WHERE ta.trip_id = :trip_id
             ORDER BY t.date DESC, t.id ASC",
        )?
        .query_map(&[(":trip_id", &trip_id)], |row| {
            Ok(TripTransactionRow {
                assignment_id: row.get(0)?,
                confidence: row.get(1)?,
                is_manual: row.get(2)?,
                transaction_id: row.get(3)?,
                amount: row.get(4)?,
                currency_code: row.get(5)?,
                description: row.get(6)?,
                merchant_name: row.get(7)?,
                category: row.get(8)?,
                subcategory: row.get(9)?,
                date: row.get(10)?,
                pending: row.get(11)?,
                account_name: row.get(12)?,
                institution_name: row.get(13)?,
                category_override: row.get(14)?,
                subcategory_override: row.get(15)?,
                notes: row.get(16)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// Compute the spending summary over a trip's transaction rows.
///
/// Pure over its input; no side effects.
pub fn summarize(rows: &[TripTransactionRow]) -> TripSummary {
    let total_spend = rows.iter().map(|row| row.amount).sum();

    let mut category_breakdown: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        *category_breakdown
            .entry(row.effective_category().to_owned())
            .or_insert(0.0) += row.amount;
    }

    let needs_review = rows
        .iter()
        .filter(|row| row.confidence < REVIEW_THRESHOLD)
        .count();

    TripSummary {
        total_spend,
        transaction_count: rows.len(),
        category_breakdown,
        needs_review,
        reviewed: rows.len() - needs_review,
    }
}

/// Headline transaction count and total spend for a trip.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn get_trip_stats(trip_id: TripId, connection: &Connection) -> Result<TripStats, Error> {
    let (transaction_count, total_spend) = connection
        .prepare(
            "SELECT COUNT(t.id), COALESCE(SUM(t.amount), 0)
             FROM trip_assignment ta
             INNER JOIN \"transaction\" t ON ta.transaction_id = t.id
             WHERE ta.trip_id = :trip_id",
        )?
        .query_one(&[(":trip_id", &trip_id)], |row| {
            Ok((row.get::<usize, u32>(0)? as usize, row.get(1)?))
        })?;

    Ok(TripStats {
        transaction_count,
        total_spend,
    })
}
