//! Route handler for syncing connections against the provider.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    AppState, Error, connection::get_connection, provider::ProviderClient,
};

use super::coordinator::{SyncCancellation, SyncOutcome, sync_all_connections, sync_connection};

/// The state needed to run a sync.
#[derive(Clone)]
pub struct SyncState {
    /// The database connection the sync engine checkpoints into.
    db_connection: Arc<Mutex<Connection>>,
    /// The provider serving the change feed.
    provider: Arc<dyn ProviderClient>,
    /// The principal whose connections are synced.
    user_id: String,
}

impl FromRef<AppState> for SyncState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            provider: state.provider.clone(),
            user_id: state.user_id.clone(),
        }
    }
}

/// The request body for a sync run.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    /// Sync only this connection; all of the user's connections otherwise.
    #[serde(default)]
    pub connection_id: Option<String>,
}

/// One connection's slot in a multi-connection sync response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionSyncSlot {
    connection_id: String,
    #[serde(flatten)]
    outcome: Option<SyncOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// A route handler that syncs one connection, or every connection the user
/// has linked when no ID is given.
///
/// A failing connection in a multi-connection run is reported in its own
/// slot; the run itself still succeeds.
pub async fn sync_endpoint(
    State(state): State<SyncState>,
    Json(payload): Json<SyncPayload>,
) -> Response {
    let cancellation = SyncCancellation::new();

    match payload.connection_id {
        Some(connection_id) => {
            let record = {
                let connection = match state.db_connection.lock() {
                    Ok(connection) => connection,
                    Err(error) => {
                        tracing::error!("could not acquire database lock: {error}");
                        return Error::DatabaseLockError.into_response();
                    }
                };

                match get_connection(&connection_id, &state.user_id, &connection) {
                    Ok(record) => record,
                    Err(error) => return error.into_response(),
                }
            };

            match sync_connection(
                &record,
                state.provider.as_ref(),
                &cancellation,
                &state.db_connection,
            )
            .await
            {
                Ok(outcome) => Json(outcome).into_response(),
                Err(error) => {
                    tracing::error!("Could not sync connection {connection_id}: {error}");
                    error.into_response()
                }
            }
        }
        None => {
            let reports = match sync_all_connections(
                &state.user_id,
                state.provider.as_ref(),
                &cancellation,
                &state.db_connection,
            )
            .await
            {
                Ok(reports) => reports,
                Err(error) => {
                    tracing::error!("Could not sync connections: {error}");
                    return error.into_response();
                }
            };

            if reports.is_empty() {
                return Error::NotFound.into_response();
            }

            let connections: Vec<ConnectionSyncSlot> = reports
                .into_iter()
                .map(|report| match report.result {
                    Ok(outcome) => ConnectionSyncSlot {
                        connection_id: report.connection_id,
                        outcome: Some(outcome),
                        error: None,
                    },
                    Err(error) => ConnectionSyncSlot {
                        connection_id: report.connection_id,
                        outcome: None,
                        error: Some(error.to_string()),
                    },
                })
                .collect();

            Json(json!({ "connections": connections })).into_response()
        }
    }
}
