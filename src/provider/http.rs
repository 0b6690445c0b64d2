//! Reqwest-backed provider client.
//!
//! This adapter owns transport details only: request serialisation, timeout
//! and HTTP error mapping, and JSON decoding into the provider DTOs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;

use crate::Error;

use super::client::{
    AccountSnapshot, LinkSession, ProviderClient, TokenExchange, TransactionDelta,
};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an error response body is quoted back in error messages.
const ERROR_BODY_LIMIT: usize = 256;

/// Connection settings for the aggregation provider's HTTP API.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// The base URL of the provider environment, e.g. the sandbox host.
    pub base_url: String,
    /// The API client ID issued by the provider.
    pub client_id: String,
    /// The API secret issued by the provider.
    pub secret: String,
    /// The per-request timeout.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Create a config with the default request timeout.
    pub fn new(base_url: &str, client_id: &str, secret: &str) -> Self {
        Self {
            base_url: base_url.to_owned(),
            client_id: client_id.to_owned(),
            secret: secret.to_owned(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// A [ProviderClient] that performs HTTP POST requests against the
/// aggregation provider's JSON API.
pub struct HttpProviderClient {
    client: Client,
    config: ProviderConfig,
}

impl HttpProviderClient {
    /// Build a client from `config` with an explicit request timeout.
    ///
    /// # Errors
    /// Returns an error when the underlying reqwest client cannot be
    /// constructed.
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self { client, config })
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body));
        }

        response.json::<T>().await.map_err(map_transport_error)
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn create_link_session(&self, user_id: &str) -> Result<LinkSession, Error> {
        self.post_json(
            "/link/token/create",
            &json!({
                "client_id": self.config.client_id,
                "secret": self.config.secret,
                "user_id": user_id,
            }),
        )
        .await
    }

    async fn exchange_public_token(&self, public_token: &str) -> Result<TokenExchange, Error> {
        self.post_json(
            "/item/public_token/exchange",
            &json!({
                "client_id": self.config.client_id,
                "secret": self.config.secret,
                "public_token": public_token,
            }),
        )
        .await
    }

    async fn fetch_account_balances(
        &self,
        access_token: &str,
    ) -> Result<Vec<AccountSnapshot>, Error> {
        let envelope: AccountsEnvelope = self
            .post_json(
                "/accounts/get",
                &json!({
                    "client_id": self.config.client_id,
                    "secret": self.config.secret,
                    "access_token": access_token,
                }),
            )
            .await?;

        Ok(envelope.accounts)
    }

    async fn fetch_transaction_delta(
        &self,
        access_token: &str,
        cursor: Option<&str>,
    ) -> Result<TransactionDelta, Error> {
        self.post_json(
            "/transactions/sync",
            &SyncRequest {
                client_id: &self.config.client_id,
                secret: &self.config.secret,
                access_token,
                cursor,
            },
        )
        .await
    }
}

#[derive(Serialize)]
struct SyncRequest<'a> {
    client_id: &'a str,
    secret: &'a str,
    access_token: &'a str,
    // The provider treats a missing cursor as "from the beginning"; an
    // explicit null is rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<&'a str>,
}

#[derive(Deserialize)]
struct AccountsEnvelope {
    accounts: Vec<AccountSnapshot>,
}

fn map_transport_error(error: reqwest::Error) -> Error {
    Error::ProviderUnavailable(error.to_string())
}

fn map_status_error(status: StatusCode, body: &str) -> Error {
    let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    let message = format!("{status}: {}", excerpt.trim());

    if status.is_client_error() {
        Error::ProviderRejected(message)
    } else {
        Error::ProviderUnavailable(message)
    }
}
