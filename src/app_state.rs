//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, db::initialize, provider::ProviderClient};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,

    /// The client for the upstream account-aggregation provider.
    pub provider: Arc<dyn ProviderClient>,

    /// The principal every core operation is scoped to.
    // TODO: Resolve the principal from an authentication layer instead of
    // fixing it at startup.
    pub user_id: String,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        provider: Arc<dyn ProviderClient>,
        user_id: &str,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            db_connection: Arc::new(Mutex::new(db_connection)),
            provider,
            user_id: user_id.to_owned(),
        })
    }
}
