//! REST client for the portfolio backend.
//!
//! Every response is wrapped in `{"result": ..., "message": ""}`. Slow operations
//! are started with `async_query` and return `{"task_id": N}`; the client then polls
//! `/api/1/tasks/{N}` until the task completes.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::BackendConfig;
use crate::models::{
    AccountData, AccountPayload, AssetId, Balances, Blockchain, BlockchainBalances,
    BtcAccountData, ChainAccounts, Eth2Validator, Eth2ValidatorPayload, Eth2Validators, Exchange,
    LoopringBalances, ManualBalance, NonFungibleBalances, XpubPayload,
};

use super::{ApiError, BalanceApi};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct TaskId {
    task_id: u64,
}

#[derive(Debug, Deserialize)]
struct TaskStatus {
    status: String,
    #[serde(default)]
    outcome: Option<TaskOutcome>,
}

#[derive(Debug, Deserialize)]
struct TaskOutcome {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct PriceResponse {
    assets: HashMap<AssetId, Decimal>,
}

#[derive(Debug, Deserialize)]
struct ManualBalancesResponse {
    balances: Vec<ManualBalance>,
}

/// Backend client over HTTP.
pub struct HttpBalanceApi {
    client: Client,
    base_url: String,
    poll_interval: Duration,
    task_timeout: Duration,
}

impl HttpBalanceApi {
    pub fn new() -> Self {
        Self::from_config(&BackendConfig::default())
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.url.clone(),
            poll_interval: config.poll_interval,
            task_timeout: config.task_timeout,
        }
    }

    /// Override the backend base URL (useful for tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = timeout;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/1{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Send a request and unwrap the result envelope.
    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let request = builder.build().map_err(|e| ApiError::Transport {
            url: String::new(),
            message: e.to_string(),
        })?;
        let url = request.url().to_string();

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| ApiError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ApiError::Transport {
            url: url.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let message = serde_json::from_str::<Envelope<Value>>(&body)
                .map(|envelope| envelope.message)
                .unwrap_or(body);
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
                message,
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&body)?;
        match envelope.result {
            Some(result) => Ok(result),
            None => Err(ApiError::Backend(envelope.message)),
        }
    }

    /// Start a backend task and wait for its result.
    async fn run_task<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let TaskId { task_id } = self.send(builder).await?;
        tracing::debug!(task_id, "Waiting for backend task");

        let value = tokio::time::timeout(self.task_timeout, self.await_task(task_id))
            .await
            .map_err(|_| ApiError::TaskTimeout {
                task_id,
                timeout: self.task_timeout,
            })??;

        Ok(serde_json::from_value(value)?)
    }

    async fn await_task(&self, task_id: u64) -> Result<Value, ApiError> {
        let path = format!("/tasks/{task_id}");
        loop {
            let status: TaskStatus = self.send(self.request(Method::GET, &path)).await?;
            match status.status.as_str() {
                "completed" => {
                    let outcome = status.outcome.ok_or_else(|| ApiError::TaskFailed {
                        task_id,
                        message: "completed without an outcome".to_string(),
                    })?;
                    return match outcome.result {
                        Some(result) if !result.is_null() => Ok(result),
                        _ => Err(ApiError::TaskFailed {
                            task_id,
                            message: outcome.message,
                        }),
                    };
                }
                "not-found" => {
                    return Err(ApiError::TaskFailed {
                        task_id,
                        message: "task not found".to_string(),
                    })
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }

    fn async_get(&self, path: &str, ignore_cache: bool) -> RequestBuilder {
        self.request(Method::GET, path).query(&[
            ("async_query", "true"),
            ("ignore_cache", if ignore_cache { "true" } else { "false" }),
        ])
    }

    /// JSON body with `async_query` set.
    fn async_body<B: Serialize>(body: &B) -> Result<Value, ApiError> {
        let mut value = serde_json::to_value(body)?;
        if let Value::Object(map) = &mut value {
            map.insert("async_query".to_string(), Value::Bool(true));
        }
        Ok(value)
    }
}

impl Default for HttpBalanceApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl BalanceApi for HttpBalanceApi {
    async fn query_balances(&self, ignore_cache: bool) -> Result<(), ApiError> {
        let _: Value = self
            .run_task(self.async_get("/balances", ignore_cache))
            .await?;
        Ok(())
    }

    async fn query_blockchain_balances(
        &self,
        chain: Option<Blockchain>,
        ignore_cache: bool,
    ) -> Result<BlockchainBalances, ApiError> {
        let path = match chain {
            Some(chain) => format!("/balances/blockchains/{chain}"),
            None => "/balances/blockchains".to_string(),
        };
        self.run_task(self.async_get(&path, ignore_cache)).await
    }

    async fn accounts(&self, chain: Blockchain) -> Result<Vec<AccountData>, ApiError> {
        if chain.is_utxo() || chain == Blockchain::Eth2 {
            return Err(ApiError::Unsupported { chain });
        }
        self.send(self.request(Method::GET, &format!("/blockchains/{chain}")))
            .await
    }

    async fn btc_accounts(&self, chain: Blockchain) -> Result<BtcAccountData, ApiError> {
        if !chain.is_utxo() {
            return Err(ApiError::Unsupported { chain });
        }
        self.send(self.request(Method::GET, &format!("/blockchains/{chain}")))
            .await
    }

    async fn add_blockchain_account(
        &self,
        chain: Blockchain,
        account: &AccountPayload,
    ) -> Result<BlockchainBalances, ApiError> {
        let body = Self::async_body(&json!({ "accounts": [account] }))?;
        self.run_task(
            self.request(Method::PUT, &format!("/blockchains/{chain}"))
                .json(&body),
        )
        .await
    }

    async fn edit_account(
        &self,
        chain: Blockchain,
        account: &AccountPayload,
    ) -> Result<ChainAccounts, ApiError> {
        let request = self
            .request(Method::PATCH, &format!("/blockchains/{chain}"))
            .json(&json!({ "accounts": [account] }));
        let accounts = match chain {
            Blockchain::Btc => ChainAccounts::Btc(self.send(request).await?),
            Blockchain::Bch => ChainAccounts::Bch(self.send(request).await?),
            Blockchain::Eth => ChainAccounts::Eth(self.send(request).await?),
            Blockchain::Ksm => ChainAccounts::Ksm(self.send(request).await?),
            Blockchain::Dot => ChainAccounts::Dot(self.send(request).await?),
            Blockchain::Avax => ChainAccounts::Avax(self.send(request).await?),
            Blockchain::Eth2 => return Err(ApiError::Unsupported { chain }),
        };
        Ok(accounts)
    }

    async fn remove_blockchain_accounts(
        &self,
        chain: Blockchain,
        addresses: &[String],
    ) -> Result<BlockchainBalances, ApiError> {
        let body = Self::async_body(&json!({ "accounts": addresses }))?;
        self.run_task(
            self.request(Method::DELETE, &format!("/blockchains/{chain}"))
                .json(&body),
        )
        .await
    }

    async fn delete_xpub(&self, xpub: &XpubPayload) -> Result<BlockchainBalances, ApiError> {
        let body = Self::async_body(&json!({
            "xpub": xpub.xpub,
            "derivation_path": xpub.derivation_path,
        }))?;
        self.run_task(
            self.request(Method::DELETE, &format!("/blockchains/{}/xpub", xpub.blockchain))
                .json(&body),
        )
        .await
    }

    async fn eth2_validators(&self) -> Result<Eth2Validators, ApiError> {
        self.send(self.request(Method::GET, "/blockchains/ETH2/validators"))
            .await
    }

    async fn add_eth2_validator(&self, validator: &Eth2ValidatorPayload) -> Result<bool, ApiError> {
        let body = Self::async_body(validator)?;
        self.run_task(
            self.request(Method::PUT, "/blockchains/ETH2/validators")
                .json(&body),
        )
        .await
    }

    async fn edit_eth2_validator(
        &self,
        validator: &Eth2ValidatorPayload,
    ) -> Result<bool, ApiError> {
        self.send(
            self.request(Method::PATCH, "/blockchains/ETH2/validators")
                .json(validator),
        )
        .await
    }

    async fn delete_eth2_validators(&self, validators: &[Eth2Validator]) -> Result<bool, ApiError> {
        self.send(
            self.request(Method::DELETE, "/blockchains/ETH2/validators")
                .json(&json!({ "validators": validators })),
        )
        .await
    }

    async fn loopring_balances(&self) -> Result<LoopringBalances, ApiError> {
        self.run_task(self.async_get("/blockchains/ETH/modules/loopring/balances", false))
            .await
    }

    async fn nf_balances(&self, ignore_cache: bool) -> Result<NonFungibleBalances, ApiError> {
        self.run_task(self.async_get("/nfts/balances", ignore_cache))
            .await
    }

    async fn latest_prices(
        &self,
        assets: &[AssetId],
        target: &str,
        ignore_cache: bool,
    ) -> Result<HashMap<AssetId, Decimal>, ApiError> {
        let body = Self::async_body(&json!({
            "assets": assets,
            "target_asset": target,
            "ignore_cache": ignore_cache,
        }))?;
        let response: PriceResponse = self
            .run_task(
                self.request(Method::POST, "/assets/prices/latest")
                    .json(&body),
            )
            .await?;
        Ok(response.assets)
    }

    async fn exchange_rates(
        &self,
        currencies: &[String],
    ) -> Result<HashMap<String, Decimal>, ApiError> {
        self.send(
            self.request(Method::GET, "/exchange_rates")
                .query(&[("currencies", currencies.join(","))]),
        )
        .await
    }

    async fn manual_balances(&self) -> Result<Vec<ManualBalance>, ApiError> {
        let response: ManualBalancesResponse = self
            .send(self.request(Method::GET, "/balances/manual"))
            .await?;
        Ok(response.balances)
    }

    async fn connected_exchanges(&self) -> Result<Vec<Exchange>, ApiError> {
        self.send(self.request(Method::GET, "/exchanges")).await
    }

    async fn exchange_balances(
        &self,
        location: &str,
        ignore_cache: bool,
    ) -> Result<Balances, ApiError> {
        self.run_task(self.async_get(&format!("/exchanges/balances/{location}"), ignore_cache))
            .await
    }
}
