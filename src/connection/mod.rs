//! Linked connections to the aggregation provider.
//!
//! A connection is one authorized link between a user and a financial
//! institution. It owns the access token used for provider calls and the
//! sync cursor that marks progress through the provider's change feed.

mod core;
mod link_endpoint;
mod manage_endpoint;

pub use core::{
    ConnectionId, LinkedConnection, NewConnection, create_connection, create_connection_table,
    delete_connection, get_connection, get_connections_for_user, update_cursor,
};
pub use link_endpoint::{create_link_token_endpoint, exchange_public_token_endpoint};
pub use manage_endpoint::{delete_connection_endpoint, get_connections_endpoint};
