//! A scripted provider client for exercising the sync engine and the link
//! flow in tests without a network.

use std::{
    collections::VecDeque,
    sync::Mutex,
};

use async_trait::async_trait;
use time::Date;

use crate::Error;

use super::client::{
    AccountBalances, AccountSnapshot, LinkSession, ProviderClient, RemovedTransaction,
    TokenExchange, TransactionDelta, TransactionDto,
};

/// A provider that serves pre-scripted delta batches and balances.
///
/// Batches are consumed in order; requesting more batches than were scripted
/// panics so that tests catch unexpected extra fetches.
pub(crate) struct StubProvider {
    balances: Vec<AccountSnapshot>,
    batches: Mutex<VecDeque<Result<TransactionDelta, Error>>>,
    cursors_requested: Mutex<Vec<Option<String>>>,
}

impl StubProvider {
    pub(crate) fn new() -> Self {
        Self {
            balances: Vec::new(),
            batches: Mutex::new(VecDeque::new()),
            cursors_requested: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_balances(mut self, balances: Vec<AccountSnapshot>) -> Self {
        self.balances = balances;
        self
    }

    pub(crate) fn push_batch(self, batch: TransactionDelta) -> Self {
        self.batches.lock().unwrap().push_back(Ok(batch));
        self
    }

    pub(crate) fn push_error(self, error: Error) -> Self {
        self.batches.lock().unwrap().push_back(Err(error));
        self
    }

    /// The cursors the engine passed to [ProviderClient::fetch_transaction_delta],
    /// in call order.
    pub(crate) fn cursors_requested(&self) -> Vec<Option<String>> {
        self.cursors_requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProviderClient for StubProvider {
    async fn create_link_session(&self, _user_id: &str) -> Result<LinkSession, Error> {
        Ok(LinkSession {
            link_token: "link-stub-token".to_owned(),
        })
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange, Error> {
        Ok(TokenExchange {
            access_token: format!("access-for-{public_token}"),
            item_id: "item-stub-1".to_owned(),
        })
    }

    async fn fetch_account_balances(
        &self,
        _access_token: &str,
    ) -> Result<Vec<AccountSnapshot>, Error> {
        Ok(self.balances.clone())
    }

    async fn fetch_transaction_delta(
        &self,
        _access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionDelta, Error> {
        self.cursors_requested
            .lock()
            .unwrap()
            .push(cursor.map(str::to_owned));

        self.batches
            .lock()
            .unwrap()
            .pop_front()
            .expect("StubProvider ran out of scripted batches")
    }
}

pub(crate) fn stub_snapshot(account_id: &str, current: f64, available: f64) -> AccountSnapshot {
    AccountSnapshot {
        account_id: account_id.to_owned(),
        name: format!("Account {account_id}"),
        official_name: None,
        mask: Some("0000".to_owned()),
        kind: "depository".to_owned(),
        subtype: Some("checking".to_owned()),
        balances: AccountBalances {
            current: Some(current),
            available: Some(available),
            currency_code: Some("USD".to_owned()),
        },
    }
}

pub(crate) fn stub_txn(id: &str, account_id: &str, amount: f64, date: Date) -> TransactionDto {
    TransactionDto {
        id: id.to_owned(),
        account_id: account_id.to_owned(),
        amount,
        currency_code: Some("USD".to_owned()),
        name: format!("Transaction {id}"),
        merchant_name: None,
        category_primary: None,
        category_detailed: None,
        date,
        authorized_date: None,
        pending: false,
    }
}

pub(crate) fn stub_delta(
    added: Vec<TransactionDto>,
    modified: Vec<TransactionDto>,
    removed_ids: &[&str],
    next_cursor: &str,
    has_more: bool,
) -> TransactionDelta {
    TransactionDelta {
        added,
        modified,
        removed: removed_ids
            .iter()
            .map(|id| RemovedTransaction {
                id: (*id).to_owned(),
            })
            .collect(),
        next_cursor: next_cursor.to_owned(),
        has_more,
    }
}
