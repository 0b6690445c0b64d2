//! Route handler for listing the user's accounts.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde_json::json;

use crate::{AppState, Error, account::get_accounts_for_user};

/// The state needed to list accounts.
#[derive(Clone)]
pub struct AccountListState {
    /// The database connection for reading accounts.
    db_connection: Arc<Mutex<Connection>>,
    /// The principal whose accounts are listed.
    user_id: String,
}

impl FromRef<AppState> for AccountListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            user_id: state.user_id.clone(),
        }
    }
}

/// A route handler for listing all of the user's accounts.
pub async fn get_accounts_endpoint(State(state): State<AccountListState>) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    match get_accounts_for_user(&state.user_id, &connection) {
        Ok(accounts) => Json(json!({ "accounts": accounts })).into_response(),
        Err(error) => {
            tracing::error!("Could not list accounts: {error}");
            error.into_response()
        }
    }
}
