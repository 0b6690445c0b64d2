//! Database ID type definitions for locally-issued identifiers.
//!
//! Provider-issued identifiers (connections, accounts, transactions) are
//! opaque strings and live with their models; the aliases here cover rows
//! the application itself creates.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Identifier for a trip.
pub type TripId = DatabaseId;

/// Identifier for a trip assignment row.
pub type AssignmentId = DatabaseId;
