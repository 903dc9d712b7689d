//! Backend contract used by the action layer.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::HttpBalanceApi;

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;

use crate::models::{
    AccountData, AccountPayload, AssetId, Balances, Blockchain, BlockchainBalances,
    BtcAccountData, ChainAccounts, Eth2Validator, Eth2ValidatorPayload, Eth2Validators, Exchange,
    LoopringBalances, ManualBalance, NonFungibleBalances, XpubPayload,
};

/// Errors raised while talking to the backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("backend returned {status} for {url}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    #[error("backend error: {0}")]
    Backend(String),

    #[error("task {task_id} failed: {message}")]
    TaskFailed { task_id: u64, message: String },

    #[error("task {task_id} did not complete within {timeout:?}")]
    TaskTimeout { task_id: u64, timeout: Duration },

    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{chain} does not support this operation")]
    Unsupported { chain: Blockchain },
}

/// Backend operations the action layer depends on.
///
/// Long-running calls are backend tasks; implementations wait for the task to
/// finish and return its result.
#[async_trait::async_trait]
pub trait BalanceApi: Send + Sync {
    /// Ask the backend to refresh every balance. The result is not used.
    async fn query_balances(&self, ignore_cache: bool) -> Result<(), ApiError>;

    /// Balances of one chain, or of every chain when `chain` is `None`.
    async fn query_blockchain_balances(
        &self,
        chain: Option<Blockchain>,
        ignore_cache: bool,
    ) -> Result<BlockchainBalances, ApiError>;

    /// Accounts of an account-based chain.
    async fn accounts(&self, chain: Blockchain) -> Result<Vec<AccountData>, ApiError>;

    /// Accounts of a UTXO chain.
    async fn btc_accounts(&self, chain: Blockchain) -> Result<BtcAccountData, ApiError>;

    async fn add_blockchain_account(
        &self,
        chain: Blockchain,
        account: &AccountPayload,
    ) -> Result<BlockchainBalances, ApiError>;

    /// Update label and tags. Returns the chain's updated account list.
    async fn edit_account(
        &self,
        chain: Blockchain,
        account: &AccountPayload,
    ) -> Result<ChainAccounts, ApiError>;

    async fn remove_blockchain_accounts(
        &self,
        chain: Blockchain,
        addresses: &[String],
    ) -> Result<BlockchainBalances, ApiError>;

    async fn delete_xpub(&self, xpub: &XpubPayload) -> Result<BlockchainBalances, ApiError>;

    async fn eth2_validators(&self) -> Result<Eth2Validators, ApiError>;

    async fn add_eth2_validator(&self, validator: &Eth2ValidatorPayload) -> Result<bool, ApiError>;

    async fn edit_eth2_validator(&self, validator: &Eth2ValidatorPayload)
        -> Result<bool, ApiError>;

    async fn delete_eth2_validators(&self, validators: &[Eth2Validator]) -> Result<bool, ApiError>;

    async fn loopring_balances(&self) -> Result<LoopringBalances, ApiError>;

    async fn nf_balances(&self, ignore_cache: bool) -> Result<NonFungibleBalances, ApiError>;

    /// Latest prices of `assets` quoted in `target`.
    async fn latest_prices(
        &self,
        assets: &[AssetId],
        target: &str,
        ignore_cache: bool,
    ) -> Result<HashMap<AssetId, Decimal>, ApiError>;

    async fn exchange_rates(
        &self,
        currencies: &[String],
    ) -> Result<HashMap<String, Decimal>, ApiError>;

    async fn manual_balances(&self) -> Result<Vec<ManualBalance>, ApiError>;

    async fn connected_exchanges(&self) -> Result<Vec<Exchange>, ApiError>;

    async fn exchange_balances(
        &self,
        location: &str,
        ignore_cache: bool,
    ) -> Result<Balances, ApiError>;
}
