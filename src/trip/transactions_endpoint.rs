//! Route handlers for a trip's transaction list and manual assignment.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::{Error, database_id::TripId};

use super::{
    core::get_trip,
    matcher::{add_transactions_to_trip, remove_transactions_from_trip},
    summary::{get_trip_transactions, summarize},
    trips_endpoint::TripState,
};

/// The request body for adding or removing trip transactions.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIdsPayload {
    /// The provider-issued transaction IDs to add or remove.
    #[serde(default)]
    pub transaction_ids: Vec<String>,
}

/// A route handler for reading a trip's assigned transactions together with
/// the spending summary.
pub async fn get_trip_transactions_endpoint(
    State(state): State<TripState>,
    Path(trip_id): Path<TripId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    if let Err(error) = get_trip(trip_id, &state.user_id, &connection) {
        return error.into_response();
    }

    match get_trip_transactions(trip_id, &connection) {
        Ok(rows) => {
            let summary = summarize(&rows);
            Json(json!({ "transactions": rows, "summary": summary })).into_response()
        }
        Err(error) => {
            tracing::error!("Could not list transactions for trip {trip_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler for manually assigning transactions to a trip.
pub async fn add_trip_transactions_endpoint(
    State(state): State<TripState>,
    Path(trip_id): Path<TripId>,
    Json(payload): Json<TransactionIdsPayload>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let trip = match get_trip(trip_id, &state.user_id, &connection) {
        Ok(trip) => trip,
        Err(error) => return error.into_response(),
    };

    match add_transactions_to_trip(&trip, &payload.transaction_ids, &connection) {
        Ok(outcome) => Json(outcome).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for removing transactions from a trip.
pub async fn remove_trip_transactions_endpoint(
    State(state): State<TripState>,
    Path(trip_id): Path<TripId>,
    Json(payload): Json<TransactionIdsPayload>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let trip = match get_trip(trip_id, &state.user_id, &connection) {
        Ok(trip) => trip,
        Err(error) => return error.into_response(),
    };

    match remove_transactions_from_trip(&trip, &payload.transaction_ids, &connection) {
        Ok(removed) => Json(json!({ "removed": removed })).into_response(),
        Err(error) => error.into_response(),
    }
}
