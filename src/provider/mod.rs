//! The client for the upstream account-aggregation provider.
//!
//! The provider owns the source of truth for accounts and transactions; this
//! module defines the contract the rest of the application consumes and a
//! reqwest-backed implementation of it.

mod client;
mod http;

pub use client::{
    AccountBalances, AccountSnapshot, LinkSession, ProviderClient, RemovedTransaction,
    TokenExchange, TransactionDelta, TransactionDto,
};
pub use http::{HttpProviderClient, ProviderConfig};

#[cfg(test)]
pub(crate) mod stub;
