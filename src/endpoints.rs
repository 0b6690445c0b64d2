//! The API endpoint URIs.

/// The route for creating a link session token for the account linking flow.
pub const LINK_TOKEN: &str = "/api/link/token";
/// The route for exchanging a public token for a stored connection.
pub const LINK_EXCHANGE: &str = "/api/link/exchange";
/// The route for listing the user's linked connections.
pub const CONNECTIONS: &str = "/api/connections";
/// The route for revoking a linked connection.
pub const CONNECTION: &str = "/api/connections/{connection_id}";
/// The route for listing the user's accounts.
pub const ACCOUNTS: &str = "/api/accounts";
/// The route for syncing one or all connections against the provider.
pub const SYNC: &str = "/api/sync";
/// The route for listing and creating trips.
pub const TRIPS: &str = "/api/trips";
/// The route for reading, updating, or deleting a single trip.
pub const TRIP: &str = "/api/trips/{trip_id}";
/// The route for previewing or executing trip auto-assignment.
pub const TRIP_MATCH: &str = "/api/trips/{trip_id}/match";
/// The route for reading, adding, or removing a trip's transactions.
pub const TRIP_TRANSACTIONS: &str = "/api/trips/{trip_id}/transactions";
/// The route for setting or clearing a category override on an assignment.
pub const TRIP_OVERRIDE: &str = "/api/trips/{trip_id}/transactions/{assignment_id}/override";
