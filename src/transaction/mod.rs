//! Canonical transaction records mirrored from the provider.
//!
//! Rows in this store are created, updated, and deleted only by the sync
//! engine's reconciliation step; everything else reads them.

mod core;

pub use core::{
    Transaction, TransactionId, create_transaction_table, delete_transaction, get_transaction,
    insert_transaction_if_new, upsert_transaction,
};

#[cfg(test)]
pub use core::count_transactions;
