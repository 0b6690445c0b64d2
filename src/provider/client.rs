//! The contract consumed from the upstream account-aggregation provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::Error;

/// A short-lived token that the client-side linking widget uses to start an
/// account linking session.
#[derive(Debug, Clone, Deserialize)]
pub struct LinkSession {
    /// The token to hand to the linking widget.
    pub link_token: String,
}

/// The durable credential obtained by exchanging a public token after a
/// successful link session.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenExchange {
    /// The access token for all subsequent provider calls.
    pub access_token: String,
    /// The provider's identifier for the linked item, used as the
    /// connection ID.
    pub item_id: String,
}

/// The balance fields of an account snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBalances {
    /// The posted balance, if the provider reports one.
    pub current: Option<f64>,
    /// The balance available for spending, if the provider reports one.
    pub available: Option<f64>,
    /// ISO 4217 currency code of the balances.
    pub currency_code: Option<String>,
}

/// A point-in-time snapshot of one account at the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// The provider-issued account ID.
    pub account_id: String,
    /// The display name of the account.
    pub name: String,
    /// The institution's official name for the account.
    pub official_name: Option<String>,
    /// The last 2-4 digits of the account number.
    pub mask: Option<String>,
    /// The account type, e.g. "depository" or "credit".
    #[serde(rename = "type")]
    pub kind: String,
    /// The account subtype, e.g. "checking".
    pub subtype: Option<String>,
    /// The balances reported for the account.
    pub balances: AccountBalances,
}

/// One transaction as reported by the provider's change feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionDto {
    /// The provider-issued transaction ID. Globally unique and immutable.
    pub id: String,
    /// The provider-issued ID of the account the transaction belongs to.
    pub account_id: String,
    /// The signed amount. Positive values are outflows, matching the
    /// provider's convention.
    pub amount: f64,
    /// ISO 4217 currency code, absent when the provider does not know it.
    pub currency_code: Option<String>,
    /// The provider's description of the transaction.
    pub name: String,
    /// The cleaned-up merchant name, when the provider can derive one.
    pub merchant_name: Option<String>,
    /// The primary category assigned by the provider.
    pub category_primary: Option<String>,
    /// The detailed category assigned by the provider.
    pub category_detailed: Option<String>,
    /// The date the transaction posted, in the provider's local calendar.
    pub date: Date,
    /// The date the transaction was authorized, when known.
    pub authorized_date: Option<Date>,
    /// Whether the transaction is still pending settlement.
    pub pending: bool,
}

/// A tombstone for a transaction the provider has removed from its feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemovedTransaction {
    /// The provider-issued ID of the removed transaction.
    pub id: String,
}

/// One page of the provider's transaction change feed.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionDelta {
    /// Transactions added since the request cursor.
    pub added: Vec<TransactionDto>,
    /// Transactions modified since the request cursor.
    pub modified: Vec<TransactionDto>,
    /// Transactions removed since the request cursor.
    pub removed: Vec<RemovedTransaction>,
    /// The opaque checkpoint to request the next page from. Stored verbatim,
    /// never parsed.
    pub next_cursor: String,
    /// Whether another page is immediately available.
    pub has_more: bool,
}

/// The upstream aggregation API.
///
/// All methods surface transport failures as [Error::ProviderUnavailable]
/// and credential rejections as [Error::ProviderRejected]; retry policy is
/// left to the caller.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Create a link session for the client-side account linking flow.
    async fn create_link_session(&self, user_id: &str) -> Result<LinkSession, Error>;

    /// Exchange the public token produced by a completed link session for a
    /// durable access token.
    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange, Error>;

    /// Fetch the current snapshot of all accounts reachable with
    /// `access_token`.
    async fn fetch_account_balances(
        &self,
        access_token: &str,
    ) -> Result<Vec<AccountSnapshot>, Error>;

    /// Fetch one page of the transaction change feed, starting from
    /// `cursor`, or from the beginning of history when `cursor` is `None`.
    async fn fetch_transaction_delta(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionDelta, Error>;
}
