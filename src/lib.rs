//! Tripledger keeps a local ledger of bank accounts and transactions in sync
//! with an upstream account-aggregation provider, and groups transactions
//! into user-defined trips for travel expense tracking.
//!
//! This library provides a JSON REST API on top of two core pieces: a
//! cursor-driven transaction sync engine and a confidence-scored trip
//! matcher.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod account;
mod app_state;
mod connection;
mod database_id;
mod db;
mod endpoints;
mod logging;
mod provider;
mod routing;
mod sync;
mod transaction;
mod trip;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use provider::{HttpProviderClient, ProviderClient, ProviderConfig};
pub use routing::build_router;
pub use sync::{SyncCancellation, SyncOutcome};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The provider could not be reached, or the request timed out.
    ///
    /// The operation that failed is safe to retry once the provider is
    /// reachable again; no local state was advanced past the failure.
    #[error("the aggregation provider is unavailable: {0}")]
    ProviderUnavailable(String),

    /// The provider rejected the stored credential.
    ///
    /// This is not retryable: the user has to re-link the connection before
    /// it can be synced again.
    #[error("the aggregation provider rejected the request: {0}")]
    ProviderRejected(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the
    /// parameters (e.g., ID) are correct and that the resource has been
    /// created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// A trip was created or updated with a start date after its end date.
    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange {
        /// The start date of the rejected range.
        start: Date,
        /// The end date of the rejected range.
        end: Date,
    },

    /// An empty string was used as a trip name.
    #[error("Trip name cannot be empty")]
    EmptyTripName,

    /// A trip assignment request carried an empty transaction ID list.
    #[error("the transaction ID list cannot be empty")]
    EmptyTransactionIds,

    /// A link token exchange was requested without a public token.
    #[error("a public token is required to exchange for an access token")]
    EmptyPublicToken,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, message) = match &self {
            Error::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Error::InvalidDateRange { .. }
            | Error::EmptyTripName
            | Error::EmptyTransactionIds
            | Error::EmptyPublicToken => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::ProviderUnavailable(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            Error::ProviderRejected(_) => (
                StatusCode::FORBIDDEN,
                "the provider rejected the stored credential, reconnect the account".to_owned(),
            ),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred, check the server logs for more details."
                        .to_owned(),
                )
            }
        };

        (status_code, Json(json!({ "error": message }))).into_response()
    }
}
