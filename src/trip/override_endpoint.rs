//! Route handlers for per-trip category overrides.

use axum::{
    Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::{
    Error,
    database_id::{AssignmentId, TripId},
};

use super::{
    assignment::get_assignment,
    core::get_trip,
    overrides::{OverrideDraft, delete_override, set_override},
    trips_endpoint::TripState,
};

/// A route handler that sets or replaces the override on an assignment.
pub async fn set_override_endpoint(
    State(state): State<TripState>,
    Path((trip_id, assignment_id)): Path<(TripId, AssignmentId)>,
    Json(draft): Json<OverrideDraft>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    if let Err(error) = check_assignment_in_trip(trip_id, assignment_id, &state, &connection) {
        return error.into_response();
    }

    match set_override(assignment_id, &draft, &connection) {
        Ok(record) => Json(json!({ "override": record })).into_response(),
        Err(error) => {
            tracing::error!("Could not set override on assignment {assignment_id}: {error}");
            error.into_response()
        }
    }
}

/// A route handler that clears the override on an assignment. Clearing an
/// absent override succeeds with `cleared: false`.
pub async fn clear_override_endpoint(
    State(state): State<TripState>,
    Path((trip_id, assignment_id)): Path<(TripId, AssignmentId)>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    if let Err(error) = check_assignment_in_trip(trip_id, assignment_id, &state, &connection) {
        return error.into_response();
    }

    match delete_override(assignment_id, &connection) {
        Ok(cleared) => Json(json!({ "cleared": cleared })).into_response(),
        Err(error) => {
            tracing::error!("Could not clear override on assignment {assignment_id}: {error}");
            error.into_response()
        }
    }
}

/// Verify that the trip belongs to the requesting user and the assignment
/// belongs to the trip.
fn check_assignment_in_trip(
    trip_id: TripId,
    assignment_id: AssignmentId,
    state: &TripState,
    connection: &rusqlite::Connection,
) -> Result<(), Error> {
    get_trip(trip_id, &state.user_id, connection)?;

    let assignment = get_assignment(assignment_id, connection)?;
    if assignment.trip_id != trip_id {
        return Err(Error::NotFound);
    }

    Ok(())
}
