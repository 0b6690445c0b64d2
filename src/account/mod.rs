//! Accounts discovered from linked connections.
//!
//! Accounts are created once at link time; the sync engine only refreshes
//! their balance fields afterwards.

mod core;
mod list_endpoint;

pub use core::{
    Account, AccountId, create_account, create_account_table, get_accounts_for_user,
    update_account_balances,
};
pub use list_endpoint::get_accounts_endpoint;

#[cfg(test)]
pub use core::get_account;
