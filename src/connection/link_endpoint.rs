//! Route handlers for the account linking flow.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;

use crate::{
    AppState, Error,
    account::create_account,
    connection::{NewConnection, create_connection},
    provider::ProviderClient,
};

/// The state needed to run the linking flow.
#[derive(Clone)]
pub struct LinkState {
    /// The database connection for storing connections and accounts.
    db_connection: Arc<Mutex<Connection>>,
    /// The provider used to create link sessions and exchange tokens.
    provider: Arc<dyn ProviderClient>,
    /// The principal the link belongs to.
    user_id: String,
}

impl FromRef<AppState> for LinkState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            provider: state.provider.clone(),
            user_id: state.user_id.clone(),
        }
    }
}

/// A route handler for creating a link session token for the client-side
/// linking widget.
pub async fn create_link_token_endpoint(State(state): State<LinkState>) -> Response {
    match state.provider.create_link_session(&state.user_id).await {
        Ok(session) => Json(json!({ "linkToken": session.link_token })).into_response(),
        Err(error) => {
            tracing::error!("Could not create link session: {error}");
            error.into_response()
        }
    }
}

/// The request body for exchanging a public token.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeTokenPayload {
    /// The public token produced by a completed link session.
    #[serde(default)]
    pub public_token: String,
    /// The provider's identifier for the chosen institution.
    #[serde(default)]
    pub institution_id: Option<String>,
    /// The display name of the chosen institution.
    #[serde(default)]
    pub institution_name: Option<String>,
}

/// A route handler that exchanges a public token for a stored connection
/// and discovers its accounts.
pub async fn exchange_public_token_endpoint(
    State(state): State<LinkState>,
    Json(payload): Json<ExchangeTokenPayload>,
) -> Response {
    if payload.public_token.trim().is_empty() {
        return Error::EmptyPublicToken.into_response();
    }

    let exchange = match state
        .provider
        .exchange_public_token(&payload.public_token)
        .await
    {
        Ok(exchange) => exchange,
        Err(error) => {
            tracing::error!("Could not exchange public token: {error}");
            return error.into_response();
        }
    };

    // Account discovery happens here and only here; sync refreshes balances
    // but never creates accounts.
    let snapshots = match state
        .provider
        .fetch_account_balances(&exchange.access_token)
        .await
    {
        Ok(snapshots) => snapshots,
        Err(error) => {
            tracing::error!(
                "Could not fetch accounts for new connection {}: {error}",
                exchange.item_id
            );
            return error.into_response();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let new_connection = NewConnection {
        id: &exchange.item_id,
        user_id: &state.user_id,
        access_token: &exchange.access_token,
        institution_id: payload.institution_id.as_deref().unwrap_or("unknown"),
        institution_name: payload
            .institution_name
            .as_deref()
            .unwrap_or("Unknown Institution"),
    };

    if let Err(error) = create_connection(new_connection, &connection) {
        tracing::error!("Could not store connection {}: {error}", exchange.item_id);
        return error.into_response();
    }

    for snapshot in &snapshots {
        if let Err(error) = create_account(snapshot, &exchange.item_id, &state.user_id, &connection)
        {
            tracing::error!(
                "Could not store account {} for connection {}: {error}",
                snapshot.account_id,
                exchange.item_id
            );
            return error.into_response();
        }
    }

    (
        StatusCode::CREATED,
        Json(json!({
            "connectionId": exchange.item_id,
            "accountCount": snapshots.len(),
        })),
    )
        .into_response()
}
