//! Route handler for previewing or executing trip auto-assignment.

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
    matcher::{MatchMode, MatchOptions, MatchReport, match_transactions},
    trips_endpoint::TripState,
};

/// The request body for a match run.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPayload {
    /// Preview by default; execute commits the assignments.
    #[serde(default)]
    pub mode: MatchMode,
    /// Count non-home-currency spending as evidence. On by default, like
    /// the trip review screen.
    #[serde(default = "default_include_foreign_currency")]
    pub include_foreign_currency: bool,
    /// Case-insensitive substrings matched against merchants and
    /// descriptions.
    #[serde(default)]
    pub merchant_patterns: Vec<String>,
}

fn default_include_foreign_currency() -> bool {
    true
}

/// A route handler that runs the trip matcher in preview or execute mode.
pub async fn match_trip_endpoint(
    State(state): State<TripState>,
    Path(trip_id): Path<TripId>,
    Json(payload): Json<MatchPayload>,
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

    let options = MatchOptions {
        include_foreign_currency: payload.include_foreign_currency,
        merchant_patterns: payload.merchant_patterns,
    };

    match match_transactions(&trip, payload.mode, &options, &connection) {
        Ok(MatchReport::Preview {
            eligible_count,
            tiers,
            sample,
        }) => Json(json!({
            "mode": "preview",
            "trip": { "name": trip.name, "startDate": trip.start_date, "endDate": trip.end_date },
            "eligibleCount": eligible_count,
            "tierBreakdown": tiers,
            "sample": sample,
        }))
        .into_response(),
        Ok(MatchReport::Execute {
            assigned_count,
            tiers,
        }) => Json(json!({
            "mode": "execute",
            "assignedCount": assigned_count,
            "tierBreakdown": tiers,
        }))
        .into_response(),
        Err(error) => {
            tracing::error!("Could not match transactions for trip {trip_id}: {error}");
            error.into_response()
        }
    }
}
