//! Route handlers for listing and revoking linked connections.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, Error};

use super::core::{delete_connection, get_connections_for_user};

/// The state needed to manage connections.
#[derive(Clone)]
pub struct ConnectionState {
    /// The database connection for reading and deleting connections.
    db_connection: Arc<Mutex<Connection>>,
    /// The principal whose connections are managed.
    user_id: String,
}

impl FromRef<AppState> for ConnectionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id.clone(),
        }
    }
}

/// A route handler for listing the user's linked connections.
///
/// Access tokens are never serialized into the response.
pub async fn get_connections_endpoint(State(state): State<ConnectionState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_connections_for_user(&state.user_id, &connection) {
        Ok(records) => Json(json!({ "connections": records })).into_response(),
        Err(error) => {
            tracing::error!("Could not list connections: {error}");
            error.into_response()
        }
    }
}

/// A route handler that revokes a connection, cascading to its accounts and
/// their transactions.
pub async fn delete_connection_endpoint(
    State(state): State<ConnectionState>,
    Path(connection_id): Path<String>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match delete_connection(&connection_id, &state.user_id, &connection) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(error) => error.into_response(),
    }
}
