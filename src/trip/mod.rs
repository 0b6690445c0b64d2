//! Trips and the assignment of transactions to them.
//!
//! A trip is a user-defined, date-bounded grouping of transactions for
//! expense consolidation. Transactions enter a trip either through the
//! confidence-scored auto-matcher or by manual assignment; either way a
//! transaction appears at most once per trip.

mod assignment;
mod core;
mod match_endpoint;
mod matcher;
mod override_endpoint;
mod overrides;
mod summary;
mod transactions_endpoint;
mod trips_endpoint;

pub use assignment::{TripAssignment, create_trip_assignment_table};
pub use core::{
    Trip, TripDraft, create_trip, create_trip_table, delete_trip, get_trip, get_trips_for_user,
    update_trip,
};
pub use match_endpoint::match_trip_endpoint;
pub use matcher::{
    Candidate, ManualAddOutcome, MatchMode, MatchOptions, MatchReport, ScoredCandidate,
    TierBreakdown, add_transactions_to_trip, match_transactions, remove_transactions_from_trip,
    score_candidate,
};
pub use override_endpoint::{clear_override_endpoint, set_override_endpoint};
pub use overrides::{OverrideDraft, TripOverride, create_trip_override_table};
pub use summary::{
    TripStats, TripSummary, TripTransactionRow, get_trip_stats, get_trip_transactions, summarize,
};
pub use transactions_endpoint::{
    add_trip_transactions_endpoint, get_trip_transactions_endpoint,
    remove_trip_transactions_endpoint,
};
pub use trips_endpoint::{
    create_trip_endpoint, delete_trip_endpoint, get_trip_endpoint, get_trips_endpoint,
    update_trip_endpoint,
};
