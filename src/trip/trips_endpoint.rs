//! Route handlers for trip CRUD.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{AppState, Error, database_id::TripId};

use super::{
    core::{TripDraft, create_trip, delete_trip, get_trip, get_trips_for_user, update_trip},
    summary::get_trip_stats,
};

/// The state needed for trip CRUD.
#[derive(Clone)]
pub struct TripState {
    /// The database connection for managing trips.
    pub(super) db_connection: Arc<Mutex<Connection>>,
    /// The principal whose trips are managed.
    pub(super) user_id: String,
}

impl FromRef<AppState> for TripState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id.clone(),
        }
    }
}

/// A route handler for listing all of the user's trips, most recent first.
pub async fn get_trips_endpoint(State(state): State<TripState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_trips_for_user(&state.user_id, &connection) {
        Ok(trips) => Json(json!({ "trips": trips })).into_response(),
        Err(error) => {
            tracing::error!("Could not list trips: {error}");
            error.into_response()
        }
    }
}

/// A route handler for creating a trip.
pub async fn create_trip_endpoint(
    State(state): State<TripState>,
    Json(draft): Json<TripDraft>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match create_trip(draft, &state.user_id, &connection) {
        Ok(trip) => (StatusCode::CREATED, Json(json!({ "trip": trip }))).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for reading one trip with its headline stats.
pub async fn get_trip_endpoint(
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

    let trip = match get_trip(trip_id, &state.user_id, &connection) {
        Ok(trip) => trip,
        Err(error) => return error.into_response(),
    };

    match get_trip_stats(trip_id, &connection) {
        Ok(stats) => Json(json!({ "trip": trip, "stats": stats })).into_response(),
        Err(error) => {
            tracing::error!("Could not compute stats for trip {trip_id}: {error}");
            error.into_response()
        }
    }
}

/// The request body for updating a trip.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTripPayload {
    /// The new values for the trip's editable fields.
    #[serde(flatten)]
    pub draft: TripDraft,
    /// Whether the trip is still shown as current.
    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

fn default_is_active() -> bool {
    true
}

/// A route handler for updating a trip.
pub async fn update_trip_endpoint(
    State(state): State<TripState>,
    Path(trip_id): Path<TripId>,
    Json(payload): Json<UpdateTripPayload>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match update_trip(
        trip_id,
        &state.user_id,
        payload.draft,
        payload.is_active,
        &connection,
    ) {
        Ok(trip) => Json(json!({ "trip": trip })).into_response(),
        Err(error) => error.into_response(),
    }
}

/// A route handler for deleting a trip along with its assignments and their
/// overrides.
pub async fn delete_trip_endpoint(
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

    match delete_trip(trip_id, &state.user_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_response(),
    }
}

#[cfg(test)]
mod endpoint_tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{AppState, build_router, provider::stub::StubProvider};

    fn new_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            Arc::new(StubProvider::new()),
            "user-1",
        )
        .unwrap();
        TestServer::new(build_router(state))
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let server = new_test_server();

        let created = server
            .post("/api/trips")
            .json(&json!({
                "name": "Peru - Dec 2025",
                "startDate": "2025-12-01",
                "endDate": "2025-12-10",
            }))
            .await;
        created.assert_status(StatusCode::CREATED);
        let created: Value = created.json();
        assert_eq!(created["trip"]["homeCurrency"], "USD");

        let listed = server.get("/api/trips").await;
        listed.assert_status(StatusCode::OK);
        let listed: Value = listed.json();
        assert_eq!(listed["trips"].as_array().unwrap().len(), 1);
        assert_eq!(listed["trips"][0]["name"], "Peru - Dec 2025");
    }

    #[tokio::test]
    async fn create_with_inverted_dates_is_rejected() {
        let server = new_test_server();

        let response = server
            .post("/api/trips")
            .json(&json!({
                "name": "Backwards",
                "startDate": "2025-12-10",
                "endDate": "2025-12-01",
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_includes_stats() {
        let server = new_test_server();
        let created: Value = server
            .post("/api/trips")
            .json(&json!({
                "name": "Peru - Dec 2025",
                "startDate": "2025-12-01",
                "endDate": "2025-12-10",
            }))
            .await
            .json();
        let trip_id = created["trip"]["id"].as_i64().unwrap();

        let response = server.get(&format!("/api/trips/{trip_id}")).await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        assert_eq!(body["stats"]["transactionCount"], 0);
        assert_eq!(body["stats"]["totalSpend"], 0.0);
    }

    #[tokio::test]
    async fn update_and_delete_round_trip() {
        let server = new_test_server();
        let created: Value = server
            .post("/api/trips")
            .json(&json!({
                "name": "Peru - Dec 2025",
                "startDate": "2025-12-01",
                "endDate": "2025-12-10",
            }))
            .await
            .json();
        let trip_id = created["trip"]["id"].as_i64().unwrap();

        let updated = server
            .put(&format!("/api/trips/{trip_id}"))
            .json(&json!({
                "name": "Peru + Bolivia",
                "startDate": "2025-12-01",
                "endDate": "2025-12-14",
                "isActive": false,
            }))
            .await;
        updated.assert_status(StatusCode::OK);
        let updated: Value = updated.json();
        assert_eq!(updated["trip"]["name"], "Peru + Bolivia");
        assert_eq!(updated["trip"]["isActive"], false);

        let deleted = server.delete(&format!("/api/trips/{trip_id}")).await;
        deleted.assert_status(StatusCode::OK);

        let missing = server.get(&format!("/api/trips/{trip_id}")).await;
        missing.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_trip_is_not_found() {
        let server = new_test_server();

        let response = server.get("/api/trips/999").await;

        response.assert_status(StatusCode::NOT_FOUND);
    }
}
