//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    account::get_accounts_endpoint,
    connection::{
        create_link_token_endpoint, delete_connection_endpoint, exchange_public_token_endpoint,
        get_connections_endpoint,
    },
    endpoints,
    logging::logging_middleware,
    sync::sync_endpoint,
    trip::{
        add_trip_transactions_endpoint, clear_override_endpoint, create_trip_endpoint,
        delete_trip_endpoint, get_trip_endpoint, get_trip_transactions_endpoint,
        get_trips_endpoint, match_trip_endpoint, remove_trip_transactions_endpoint,
        set_override_endpoint, update_trip_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::LINK_TOKEN, post(create_link_token_endpoint))
        .route(endpoints::LINK_EXCHANGE, post(exchange_public_token_endpoint))
        .route(endpoints::CONNECTIONS, get(get_connections_endpoint))
        .route(endpoints::CONNECTION, delete(delete_connection_endpoint))
        .route(endpoints::ACCOUNTS, get(get_accounts_endpoint))
        .route(endpoints::SYNC, post(sync_endpoint))
        .route(
            endpoints::TRIPS,
            get(get_trips_endpoint).post(create_trip_endpoint),
        )
        .route(
            endpoints::TRIP,
            get(get_trip_endpoint)
                .put(update_trip_endpoint)
                .delete(delete_trip_endpoint),
        )
        .route(endpoints::TRIP_MATCH, post(match_trip_endpoint))
        .route(
            endpoints::TRIP_TRANSACTIONS,
            get(get_trip_transactions_endpoint)
                .post(add_trip_transactions_endpoint)
                .delete(remove_trip_transactions_endpoint),
        )
        .route(
            endpoints::TRIP_OVERRIDE,
            put(set_override_endpoint).delete(clear_override_endpoint),
        )
        .layer(middleware::from_fn(logging_middleware))
        .with_state(state)
}
