//! Cursor-driven synchronization against the aggregation provider.
//!
//! Each linked connection owns an opaque cursor into the provider's
//! transaction change feed. Sync pulls the feed batch by batch, reconciles
//! each batch into the local store, and checkpoints the cursor in the same
//! database transaction, so that a crash at any point resumes cleanly.

mod coordinator;
mod sync_endpoint;

pub use coordinator::{
    ConnectionSyncReport, SyncCancellation, SyncOutcome, sync_all_connections, sync_connection,
};
pub use sync_endpoint::sync_endpoint;
