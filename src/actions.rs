//! Orchestrates backend calls and writes their results into the balance store.
//!
//! Backend failures never propagate out of a fetch: they are logged, turned into a
//! notification and leave the stored state as it was.

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;

use crate::api::{ApiError, BalanceApi};
use crate::assets::AssetResolver;
use crate::config::{GeneralSettings, Module};
use crate::models::{
    AccountPayload, Blockchain, BlockchainBalances, ChainAccounts, Eth2ValidatorPayload,
    XpubPayload,
};
use crate::notifications::{Notification, Notifier};
use crate::portfolio::{BalanceView, ViewSettings};
use crate::state::BalanceStore;
use crate::tasks::{Section, Status, StatusTracker, TaskTracker, TaskType};

const USD: &str = "USD";

pub struct BalanceActions {
    api: Arc<dyn BalanceApi>,
    store: Arc<BalanceStore>,
    assets: Arc<dyn AssetResolver>,
    notifier: Arc<dyn Notifier>,
    statuses: StatusTracker,
    tasks: TaskTracker,
    settings: GeneralSettings,
}

impl BalanceActions {
    pub fn new(
        api: Arc<dyn BalanceApi>,
        assets: Arc<dyn AssetResolver>,
        notifier: Arc<dyn Notifier>,
        settings: GeneralSettings,
    ) -> Self {
        Self {
            api,
            store: Arc::new(BalanceStore::new()),
            assets,
            notifier,
            statuses: StatusTracker::new(),
            tasks: TaskTracker::new(),
            settings,
        }
    }

    /// Share an existing store instead of starting from an empty one.
    pub fn with_store(mut self, store: Arc<BalanceStore>) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &Arc<BalanceStore> {
        &self.store
    }

    pub fn statuses(&self) -> &StatusTracker {
        &self.statuses
    }

    pub fn tasks(&self) -> &TaskTracker {
        &self.tasks
    }

    pub fn settings(&self) -> &GeneralSettings {
        &self.settings
    }

    /// Run `f` against a view of the current state snapshot.
    pub fn view<R>(&self, f: impl FnOnce(&BalanceView<'_>) -> R) -> R {
        let state = self.store.snapshot();
        let settings = ViewSettings::from(&self.settings);
        let view = BalanceView::new(&state, self.assets.as_ref(), &state.prices, &settings);
        f(&view)
    }

    fn report(&self, title: &str, message: String) {
        tracing::error!(title, "{message}");
        self.notifier.notify(Notification::error(title, message));
    }

    /// Ask the backend to refresh every balance, then reload the account lists.
    pub async fn fetch_balances(&self, ignore_cache: bool) {
        let Some(_guard) = self.tasks.try_start(TaskType::QueryBalances) else {
            tracing::debug!("Balance query already running");
            return;
        };
        if let Err(e) = self.api.query_balances(ignore_cache).await {
            self.report("Querying all balances", format!("Failed to query balances: {e}"));
        }
        self.fetch_accounts(None).await;
    }

    /// Fetch balances of one chain, or of every chain concurrently.
    ///
    /// A chain whose fetch is already in flight is skipped.
    pub async fn fetch_blockchain_balances(&self, chain: Option<Blockchain>, ignore_cache: bool) {
        let chains: Vec<Blockchain> = match chain {
            Some(chain) => vec![chain],
            None => Blockchain::ALL.to_vec(),
        };
        join_all(
            chains
                .into_iter()
                .map(|chain| self.fetch_chain_balances(chain, ignore_cache)),
        )
        .await;
    }

    async fn fetch_chain_balances(&self, chain: Blockchain, ignore_cache: bool) {
        let section = Section::Blockchain(chain);
        let Some(previous) = self.statuses.try_begin(section) else {
            tracing::debug!(chain = %chain, "Blockchain balance fetch already in flight");
            return;
        };

        tracing::info!(chain = %chain, ignore_cache, "Querying blockchain balances");
        match self
            .api
            .query_blockchain_balances(Some(chain), ignore_cache)
            .await
        {
            Ok(balances) => {
                self.update_balances(Some(chain), &balances).await;
                self.statuses.set(section, Status::Loaded);
            }
            Err(e) => {
                self.statuses.set(section, previous);
                self.report(
                    "Querying blockchain balances",
                    format!("Failed to query {chain} balances: {e}"),
                );
            }
        }
    }

    /// Write a balance payload and refresh the affected account lists.
    pub async fn update_balances(&self, chain: Option<Blockchain>, balances: &BlockchainBalances) {
        self.store
            .update(|state| state.apply_blockchain_balances(chain, balances));
        let chains = chain.map(|chain| vec![chain]);
        self.fetch_accounts(chains.as_deref()).await;
    }

    /// Reload account lists for `chains`, or for every chain when `None` or empty.
    pub async fn fetch_accounts(&self, chains: Option<&[Blockchain]>) {
        let selected: Vec<Blockchain> = match chains {
            Some(chains) if !chains.is_empty() => chains.to_vec(),
            _ => Blockchain::ALL.to_vec(),
        };
        join_all(
            selected
                .into_iter()
                .map(|chain| self.fetch_chain_accounts(chain)),
        )
        .await;
    }

    async fn fetch_chain_accounts(&self, chain: Blockchain) {
        let result = async {
            match chain {
                Blockchain::Eth2 => {
                    if !self.settings.is_module_active(Module::Eth2) {
                        return Ok(());
                    }
                    let validators = self.api.eth2_validators().await?;
                    self.store
                        .update(|state| state.set_eth2_validators(validators));
                }
                Blockchain::Btc | Blockchain::Bch => {
                    let data = self.api.btc_accounts(chain).await?;
                    let accounts = if chain == Blockchain::Btc {
                        ChainAccounts::Btc(data)
                    } else {
                        ChainAccounts::Bch(data)
                    };
                    self.store
                        .update(|state| state.replace_chain_accounts(accounts));
                }
                Blockchain::Eth | Blockchain::Ksm | Blockchain::Dot | Blockchain::Avax => {
                    let list = self.api.accounts(chain).await?;
                    let accounts = match chain {
                        Blockchain::Eth => ChainAccounts::Eth(list),
                        Blockchain::Ksm => ChainAccounts::Ksm(list),
                        Blockchain::Dot => ChainAccounts::Dot(list),
                        _ => ChainAccounts::Avax(list),
                    };
                    self.store
                        .update(|state| state.replace_chain_accounts(accounts));
                }
            }
            Ok::<(), ApiError>(())
        }
        .await;

        if let Err(e) = result {
            self.report(
                "Fetching accounts",
                format!("Failed to fetch {chain} accounts: {e}"),
            );
        }
    }

    /// Add several addresses to a chain that accepts bulk additions.
    ///
    /// Addresses already tracked (compared case-insensitively) are dropped first.
    pub async fn add_accounts(&self, chain: Blockchain, payloads: Vec<AccountPayload>) -> Result<()> {
        if !chain.supports_bulk_add() {
            anyhow::bail!("{chain} doesn't support multiple address addition");
        }
        let Some(_guard) = self.tasks.try_start(TaskType::AddAccount) else {
            tracing::debug!(chain = %chain, "Account addition already running");
            return Ok(());
        };

        let known: Vec<String> = {
            let state = self.store.snapshot();
            state
                .chain_accounts(chain)
                .unwrap_or_default()
                .iter()
                .map(|account| account.address.to_lowercase())
                .collect()
        };
        let new_accounts: Vec<AccountPayload> = payloads
            .into_iter()
            .filter(|payload| !known.contains(&payload.address.to_lowercase()))
            .collect();

        if new_accounts.is_empty() {
            self.notifier.notify(Notification::info(
                format!("Add {chain} accounts"),
                "All of the provided addresses are already tracked",
            ));
            return Ok(());
        }

        join_all(new_accounts.iter().map(|account| async move {
            match self.api.add_blockchain_account(chain, account).await {
                Ok(balances) => self.update_balances(Some(chain), &balances).await,
                Err(e) => tracing::error!(
                    chain = %chain,
                    address = %account.address,
                    error = %e,
                    "Failed to add account"
                ),
            }
        }))
        .await;

        self.after_account_change(chain).await;
        Ok(())
    }

    /// Add a single account on any chain.
    pub async fn add_account(&self, chain: Blockchain, payload: AccountPayload) {
        let Some(_guard) = self.tasks.try_start(TaskType::AddAccount) else {
            tracing::debug!(chain = %chain, "Account addition already running");
            return;
        };
        match self.api.add_blockchain_account(chain, &payload).await {
            Ok(balances) => {
                self.update_balances(Some(chain), &balances).await;
                self.after_account_change(chain).await;
            }
            Err(e) => self.report(
                "Adding account",
                format!("Failed to add {chain} account {}: {e}", payload.address),
            ),
        }
    }

    async fn after_account_change(&self, chain: Blockchain) {
        self.fetch_nf_balances(false).await;
        if chain == Blockchain::Eth {
            self.fetch_blockchain_balances(Some(Blockchain::Eth2), false)
                .await;
        }
        self.refresh_prices(false).await;
    }

    /// Change the label or tags of an account.
    pub async fn edit_account(&self, chain: Blockchain, payload: AccountPayload) -> Result<()> {
        let accounts = self
            .api
            .edit_account(chain, &payload)
            .await
            .with_context(|| format!("Failed to edit {chain} account {}", payload.address))?;
        self.store
            .update(|state| state.replace_chain_accounts(accounts));
        Ok(())
    }

    pub async fn remove_accounts(&self, chain: Blockchain, addresses: Vec<String>) -> Result<()> {
        if addresses.is_empty() {
            anyhow::bail!("No accounts to remove");
        }
        let _guard = self.tasks.try_start(TaskType::RemoveAccount);

        match self.api.remove_blockchain_accounts(chain, &addresses).await {
            Ok(balances) => {
                self.fetch_nf_balances(false).await;
                self.update_balances(Some(chain), &balances).await;
                self.refresh_prices(false).await;
            }
            Err(e) => self.report(
                "Removing accounts",
                format!("Failed to remove {} {chain} accounts: {e}", addresses.len()),
            ),
        }
        Ok(())
    }

    pub async fn delete_xpub(&self, payload: XpubPayload) {
        let Some(_guard) = self.tasks.try_start(TaskType::RemoveAccount) else {
            tracing::debug!(xpub = %payload.xpub, "Account removal already running");
            return;
        };
        match self.api.delete_xpub(&payload).await {
            Ok(balances) => {
                self.update_balances(Some(payload.blockchain), &balances)
                    .await
            }
            Err(e) => self.report(
                "Removing xpub",
                format!("Failed to remove xpub {}: {e}", payload.xpub),
            ),
        }
    }

    pub fn remove_tag(&self, tag: &str) {
        self.store.update(|state| state.remove_tag(tag));
    }

    /// Re-value stored balances at the stored prices.
    pub fn adjust_prices(&self) {
        self.store.update(|state| {
            let prices = state.prices.clone();
            state.adjust_prices(&prices);
        });
    }

    pub async fn fetch_exchange_rates(&self) -> Result<(), ApiError> {
        let rates = self
            .api
            .exchange_rates(&[self.settings.currency_symbol.clone()])
            .await?;
        self.store
            .update(|state| state.prices.update_exchange_rates(rates));
        Ok(())
    }

    /// Fetch prices for every asset currently owned or owed.
    pub async fn fetch_prices(&self, ignore_cache: bool) -> Result<(), ApiError> {
        let assets = self.view(|view| view.aggregated_assets());
        if assets.is_empty() {
            return Ok(());
        }
        let prices = self.api.latest_prices(&assets, USD, ignore_cache).await?;
        self.store
            .update(|state| state.prices.update_prices(prices));
        Ok(())
    }

    pub async fn refresh_prices(&self, ignore_cache: bool) {
        let section = Section::Prices;
        let previous = self.statuses.get(section);
        self.statuses.set(section, Status::Loading);

        let result = async {
            self.fetch_exchange_rates().await?;
            self.fetch_prices(ignore_cache).await
        }
        .await;

        match result {
            Ok(()) => {
                self.adjust_prices();
                self.statuses.set(section, Status::Loaded);
            }
            Err(e) => {
                self.statuses.set(section, previous);
                self.report("Refreshing prices", format!("Failed to refresh prices: {e}"));
            }
        }
    }

    pub async fn fetch_loopring_balances(&self, refresh: bool) {
        if !self.settings.is_module_active(Module::Loopring) {
            return;
        }
        let section = Section::LoopringBalances;
        let Some(current) = self.statuses.try_begin_refresh(section, refresh) else {
            return;
        };

        match self.api.loopring_balances().await {
            Ok(balances) => {
                self.store
                    .update(|state| state.set_loopring_balances(balances));
                self.statuses.set(section, Status::Loaded);
            }
            Err(e) => {
                self.statuses.set(section, current);
                self.report(
                    "Loopring balances",
                    format!("Failed to query loopring balances: {e}"),
                );
            }
        }
    }

    pub async fn fetch_nf_balances(&self, ignore_cache: bool) {
        if !self.settings.is_module_active(Module::Nfts) {
            return;
        }
        let section = Section::NonFungibleBalances;
        self.statuses.set(section, Status::Loading);

        match self.api.nf_balances(ignore_cache).await {
            Ok(balances) => {
                self.store.update(|state| state.set_nf_balances(balances));
                self.statuses.set(section, Status::Loaded);
            }
            Err(e) => {
                self.statuses.set(section, Status::None);
                self.report(
                    "Non-fungible balances",
                    format!("Failed to query NFT balances: {e}"),
                );
            }
        }
    }

    pub async fn fetch_manual_balances(&self) {
        let section = Section::ManualBalances;
        let Some(previous) = self.statuses.try_begin(section) else {
            return;
        };
        match self.api.manual_balances().await {
            Ok(balances) => {
                self.store
                    .update(|state| state.set_manual_balances(balances));
                self.statuses.set(section, Status::Loaded);
            }
            Err(e) => {
                self.statuses.set(section, previous);
                self.report(
                    "Manual balances",
                    format!("Failed to fetch manual balances: {e}"),
                );
            }
        }
    }

    /// Reload connected exchanges and the balances of each.
    pub async fn fetch_exchange_balances(&self, ignore_cache: bool) {
        let section = Section::ExchangeBalances;
        let Some(previous) = self.statuses.try_begin(section) else {
            return;
        };

        let exchanges = match self.api.connected_exchanges().await {
            Ok(exchanges) => exchanges,
            Err(e) => {
                self.statuses.set(section, previous);
                self.report("Exchanges", format!("Failed to fetch exchanges: {e}"));
                return;
            }
        };
        self.store
            .update(|state| state.set_connected_exchanges(exchanges.clone()));

        let results = join_all(exchanges.iter().map(|exchange| async move {
            let result = self
                .api
                .exchange_balances(&exchange.location, ignore_cache)
                .await;
            (exchange, result)
        }))
        .await;

        for (exchange, result) in results {
            match result {
                Ok(balances) => self
                    .store
                    .update(|state| state.add_exchange_balances(exchange.location.clone(), balances)),
                Err(e) => self.report(
                    "Exchange balances",
                    format!("Failed to query {} balances: {e}", exchange.location),
                ),
            }
        }
        self.statuses.set(section, Status::Loaded);
    }

    /// Full refresh of every source, in dependency order.
    pub async fn fetch_all(&self, ignore_cache: bool) {
        if let Err(e) = self.fetch_exchange_rates().await {
            self.report("Exchange rates", format!("Failed to fetch exchange rates: {e}"));
        }
        self.fetch_balances(ignore_cache).await;
        self.fetch_exchange_balances(ignore_cache).await;
        self.fetch_manual_balances().await;
        self.fetch_blockchain_balances(None, ignore_cache).await;
        self.fetch_loopring_balances(ignore_cache).await;
        self.fetch_nf_balances(ignore_cache).await;
    }

    /// Returns whether the backend accepted the validator.
    pub async fn add_eth2_validator(&self, payload: Eth2ValidatorPayload) -> bool {
        if !self.settings.is_module_active(Module::Eth2) {
            return false;
        }
        let Some(_guard) = self.tasks.try_start(TaskType::AddEth2Validator) else {
            return false;
        };
        match self.api.add_eth2_validator(&payload).await {
            Ok(true) => {
                self.fetch_blockchain_balances(Some(Blockchain::Eth2), true)
                    .await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                self.report(
                    "Adding validator",
                    format!("Failed to add validator {}: {e}", payload.id()),
                );
                false
            }
        }
    }

    pub async fn edit_eth2_validator(&self, payload: Eth2ValidatorPayload) -> bool {
        if !self.settings.is_module_active(Module::Eth2) {
            return false;
        }
        match self.api.edit_eth2_validator(&payload).await {
            Ok(true) => {
                self.fetch_blockchain_balances(Some(Blockchain::Eth2), true)
                    .await;
                true
            }
            Ok(false) => false,
            Err(e) => {
                self.report(
                    "Editing validator",
                    format!("Failed to edit validator {}: {e}", payload.id()),
                );
                false
            }
        }
    }

    /// Delete the validators with the given public keys and drop their balances.
    pub async fn delete_eth2_validators(&self, public_keys: &[String]) -> bool {
        let removed: Vec<_> = self
            .store
            .snapshot()
            .eth2_validators
            .entries
            .iter()
            .filter(|validator| public_keys.contains(&validator.public_key))
            .cloned()
            .collect();

        match self.api.delete_eth2_validators(&removed).await {
            Ok(true) => {
                self.store.update(|state| {
                    let validators = &mut state.eth2_validators;
                    validators
                        .entries
                        .retain(|validator| !public_keys.contains(&validator.public_key));
                    validators.entries_found = validators.entries.len();
                    for key in public_keys {
                        state.eth2.remove(key);
                    }
                });
                true
            }
            Ok(false) => false,
            Err(e) => {
                self.report("Deleting validators", format!("Failed to delete validators: {e}"));
                false
            }
        }
    }
}
