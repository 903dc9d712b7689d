#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Notify;

use chainfolio::api::{ApiError, BalanceApi};
use chainfolio::models::{
    AccountData, AccountPayload, AccountAssetBalances, AssetId, Balance, Balances, Blockchain,
    BlockchainAssetBalances, BlockchainBalances, BtcAccountData, ChainAccounts, Eth2Validator,
    Eth2ValidatorPayload, Eth2Validators, Exchange, LoopringBalances, ManualBalance,
    NonFungibleBalances, XpubPayload,
};

/// In-memory backend that records every call it receives.
#[derive(Default)]
pub struct MockBalanceApi {
    calls: Mutex<Vec<String>>,
    blockchain_balances: Mutex<HashMap<Blockchain, Result<BlockchainBalances, String>>>,
    accounts: Mutex<HashMap<Blockchain, Vec<AccountData>>>,
    prices: Mutex<HashMap<AssetId, Decimal>>,
    exchange_rates: Mutex<HashMap<String, Decimal>>,
    manual_balances: Mutex<Vec<ManualBalance>>,
    exchanges: Mutex<Vec<(Exchange, Balances)>>,
    eth2_validators: Mutex<Eth2Validators>,
    gate: Option<Arc<Notify>>,
}

impl MockBalanceApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blockchain balance queries and validator deletions wait until `gate` is notified.
    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn with_blockchain_balances(self, chain: Blockchain, balances: BlockchainBalances) -> Self {
        self.blockchain_balances
            .lock()
            .unwrap()
            .insert(chain, Ok(balances));
        self
    }

    pub fn with_blockchain_error(self, chain: Blockchain, message: &str) -> Self {
        self.blockchain_balances
            .lock()
            .unwrap()
            .insert(chain, Err(message.to_string()));
        self
    }

    pub fn with_accounts(self, chain: Blockchain, accounts: Vec<AccountData>) -> Self {
        self.accounts.lock().unwrap().insert(chain, accounts);
        self
    }

    pub fn with_price(self, asset: &str, price: Decimal) -> Self {
        self.prices.lock().unwrap().insert(asset.into(), price);
        self
    }

    pub fn with_exchange_rate(self, currency: &str, rate: Decimal) -> Self {
        self.exchange_rates
            .lock()
            .unwrap()
            .insert(currency.to_string(), rate);
        self
    }

    pub fn with_manual_balances(self, balances: Vec<ManualBalance>) -> Self {
        *self.manual_balances.lock().unwrap() = balances;
        self
    }

    pub fn with_exchange(self, exchange: Exchange, balances: Balances) -> Self {
        self.exchanges.lock().unwrap().push((exchange, balances));
        self
    }

    pub fn with_eth2_validators(self, validators: Vec<Eth2Validator>) -> Self {
        *self.eth2_validators.lock().unwrap() = Eth2Validators {
            entries_found: validators.len(),
            entries: validators,
            ..Eth2Validators::default()
        };
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls starting with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }
}

#[async_trait]
impl BalanceApi for MockBalanceApi {
    async fn query_balances(&self, _ignore_cache: bool) -> Result<(), ApiError> {
        self.record("query_balances");
        Ok(())
    }

    async fn query_blockchain_balances(
        &self,
        chain: Option<Blockchain>,
        _ignore_cache: bool,
    ) -> Result<BlockchainBalances, ApiError> {
        let label = chain.map(|c| c.to_string()).unwrap_or_default();
        self.record(format!("blockchain_balances:{label}"));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let Some(chain) = chain else {
            return Ok(BlockchainBalances::default());
        };
        let response = self.blockchain_balances.lock().unwrap().get(&chain).cloned();
        match response {
            Some(Ok(balances)) => Ok(balances),
            Some(Err(message)) => Err(ApiError::Backend(message)),
            None => Ok(BlockchainBalances::default()),
        }
    }

    async fn accounts(&self, chain: Blockchain) -> Result<Vec<AccountData>, ApiError> {
        self.record(format!("accounts:{chain}"));
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&chain)
            .cloned()
            .unwrap_or_default())
    }

    async fn btc_accounts(&self, chain: Blockchain) -> Result<BtcAccountData, ApiError> {
        self.record(format!("accounts:{chain}"));
        Ok(BtcAccountData::default())
    }

    async fn add_blockchain_account(
        &self,
        chain: Blockchain,
        account: &AccountPayload,
    ) -> Result<BlockchainBalances, ApiError> {
        self.record(format!("add_account:{chain}:{}", account.address));
        self.accounts
            .lock()
            .unwrap()
            .entry(chain)
            .or_default()
            .push(AccountData::new(account.address.clone()));
        Ok(BlockchainBalances::default())
    }

    async fn edit_account(
        &self,
        chain: Blockchain,
        account: &AccountPayload,
    ) -> Result<ChainAccounts, ApiError> {
        self.record(format!("edit_account:{chain}:{}", account.address));
        let mut accounts = self.accounts.lock().unwrap();
        let list = accounts.entry(chain).or_default();
        for existing in list.iter_mut() {
            if existing.address == account.address {
                existing.label = account.label.clone();
                existing.tags = account.tags.clone();
            }
        }
        match chain {
            Blockchain::Eth => Ok(ChainAccounts::Eth(list.clone())),
            Blockchain::Ksm => Ok(ChainAccounts::Ksm(list.clone())),
            Blockchain::Dot => Ok(ChainAccounts::Dot(list.clone())),
            Blockchain::Avax => Ok(ChainAccounts::Avax(list.clone())),
            other => Err(ApiError::Unsupported { chain: other }),
        }
    }

    async fn remove_blockchain_accounts(
        &self,
        chain: Blockchain,
        addresses: &[String],
    ) -> Result<BlockchainBalances, ApiError> {
        self.record(format!("remove_accounts:{chain}:{}", addresses.join(",")));
        Ok(BlockchainBalances::default())
    }

    async fn delete_xpub(&self, xpub: &XpubPayload) -> Result<BlockchainBalances, ApiError> {
        self.record(format!("delete_xpub:{}", xpub.xpub));
        Ok(BlockchainBalances::default())
    }

    async fn eth2_validators(&self) -> Result<Eth2Validators, ApiError> {
        self.record("eth2_validators");
        Ok(self.eth2_validators.lock().unwrap().clone())
    }

    async fn add_eth2_validator(&self, validator: &Eth2ValidatorPayload) -> Result<bool, ApiError> {
        self.record(format!("add_eth2_validator:{}", validator.id()));
        Ok(true)
    }

    async fn edit_eth2_validator(
        &self,
        validator: &Eth2ValidatorPayload,
    ) -> Result<bool, ApiError> {
        self.record(format!("edit_eth2_validator:{}", validator.id()));
        Ok(true)
    }

    async fn delete_eth2_validators(&self, validators: &[Eth2Validator]) -> Result<bool, ApiError> {
        let keys: Vec<&str> = validators.iter().map(|v| v.public_key.as_str()).collect();
        self.record(format!("delete_eth2_validators:{}", keys.join(",")));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        Ok(true)
    }

    async fn loopring_balances(&self) -> Result<LoopringBalances, ApiError> {
        self.record("loopring_balances");
        Ok(LoopringBalances::default())
    }

    async fn nf_balances(&self, _ignore_cache: bool) -> Result<NonFungibleBalances, ApiError> {
        self.record("nf_balances");
        Ok(NonFungibleBalances::default())
    }

    async fn latest_prices(
        &self,
        assets: &[AssetId],
        _target: &str,
        _ignore_cache: bool,
    ) -> Result<HashMap<AssetId, Decimal>, ApiError> {
        self.record("latest_prices");
        let prices = self.prices.lock().unwrap();
        Ok(assets
            .iter()
            .filter_map(|asset| prices.get(asset).map(|price| (asset.clone(), *price)))
            .collect())
    }

    async fn exchange_rates(
        &self,
        currencies: &[String],
    ) -> Result<HashMap<String, Decimal>, ApiError> {
        self.record("exchange_rates");
        let rates = self.exchange_rates.lock().unwrap();
        Ok(currencies
            .iter()
            .filter_map(|currency| rates.get(currency).map(|rate| (currency.clone(), *rate)))
            .collect())
    }

    async fn manual_balances(&self) -> Result<Vec<ManualBalance>, ApiError> {
        self.record("manual_balances");
        Ok(self.manual_balances.lock().unwrap().clone())
    }

    async fn connected_exchanges(&self) -> Result<Vec<Exchange>, ApiError> {
        self.record("connected_exchanges");
        Ok(self
            .exchanges
            .lock()
            .unwrap()
            .iter()
            .map(|(exchange, _)| exchange.clone())
            .collect())
    }

    async fn exchange_balances(
        &self,
        location: &str,
        _ignore_cache: bool,
    ) -> Result<Balances, ApiError> {
        self.record(format!("exchange_balances:{location}"));
        Ok(self
            .exchanges
            .lock()
            .unwrap()
            .iter()
            .find(|(exchange, _)| exchange.location == location)
            .map(|(_, balances)| balances.clone())
            .unwrap_or_default())
    }
}

pub fn balances(entries: &[(&str, Decimal, Decimal)]) -> Balances {
    entries
        .iter()
        .map(|(asset, amount, usd)| (AssetId::from(*asset), Balance::new(*amount, *usd)))
        .collect()
}

/// A balance payload holding `assets` on a single ETH address.
pub fn eth_payload(address: &str, assets: Balances) -> BlockchainBalances {
    let mut table = BlockchainAssetBalances::new();
    table.insert(
        address.to_string(),
        AccountAssetBalances {
            assets: assets.clone(),
            liabilities: Balances::new(),
        },
    );
    let mut payload = BlockchainBalances::default();
    payload.per_account.eth = Some(table);
    payload.totals.assets = assets;
    payload
}
