//! Source tables written by the action layer and read by the views.

mod store;

pub use store::BalanceStore;

use std::collections::BTreeMap;

use crate::models::{
    AccountAssetBalances, AccountData, AssetId, Balance, Balances, Blockchain,
    BlockchainAssetBalances, BlockchainBalances, BtcAccountData, BtcBalances, ChainAccounts,
    ChainBalances, Eth2Validators, Exchange, LoopringBalances, ManualBalance,
    NonFungibleBalances,
};
use crate::prices::{PriceOracle, PriceTable};

/// Every raw table the views derive from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceState {
    pub eth: BlockchainAssetBalances,
    pub eth2: BlockchainAssetBalances,
    pub btc: BtcBalances,
    pub bch: BtcBalances,
    pub ksm: BlockchainAssetBalances,
    pub dot: BlockchainAssetBalances,
    pub avax: BlockchainAssetBalances,

    pub eth_accounts: Vec<AccountData>,
    pub btc_accounts: BtcAccountData,
    pub bch_accounts: BtcAccountData,
    pub ksm_accounts: Vec<AccountData>,
    pub dot_accounts: Vec<AccountData>,
    pub avax_accounts: Vec<AccountData>,
    pub eth2_validators: Eth2Validators,

    pub totals: Balances,
    pub liabilities: Balances,
    pub loopring_balances: LoopringBalances,
    pub nf_balances: NonFungibleBalances,

    pub connected_exchanges: Vec<Exchange>,
    /// Exchange balances keyed by exchange location.
    pub exchange_balances: BTreeMap<String, Balances>,
    pub manual_balances: Vec<ManualBalance>,
    pub prices: PriceTable,
}

impl BalanceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-address table of an account-based chain. `None` for BTC and BCH.
    pub fn chain_table(&self, chain: Blockchain) -> Option<&BlockchainAssetBalances> {
        match chain {
            Blockchain::Eth => Some(&self.eth),
            Blockchain::Eth2 => Some(&self.eth2),
            Blockchain::Ksm => Some(&self.ksm),
            Blockchain::Dot => Some(&self.dot),
            Blockchain::Avax => Some(&self.avax),
            Blockchain::Btc | Blockchain::Bch => None,
        }
    }

    /// Account list of an account-based chain. `None` for BTC, BCH and ETH2.
    pub fn chain_accounts(&self, chain: Blockchain) -> Option<&[AccountData]> {
        match chain {
            Blockchain::Eth => Some(&self.eth_accounts),
            Blockchain::Ksm => Some(&self.ksm_accounts),
            Blockchain::Dot => Some(&self.dot_accounts),
            Blockchain::Avax => Some(&self.avax_accounts),
            Blockchain::Btc | Blockchain::Bch | Blockchain::Eth2 => None,
        }
    }

    pub fn replace_chain_balances(&mut self, balances: ChainBalances) {
        match balances {
            ChainBalances::Eth(table) => self.eth = table,
            ChainBalances::Eth2(table) => self.eth2 = table,
            ChainBalances::Btc(table) => self.btc = table,
            ChainBalances::Bch(table) => self.bch = table,
            ChainBalances::Ksm(table) => self.ksm = table,
            ChainBalances::Dot(table) => self.dot = table,
            ChainBalances::Avax(table) => self.avax = table,
        }
    }

    pub fn replace_chain_accounts(&mut self, accounts: ChainAccounts) {
        match accounts {
            ChainAccounts::Eth(list) => self.eth_accounts = list,
            ChainAccounts::Btc(data) => self.btc_accounts = data,
            ChainAccounts::Bch(data) => self.bch_accounts = data,
            ChainAccounts::Ksm(list) => self.ksm_accounts = list,
            ChainAccounts::Dot(list) => self.dot_accounts = list,
            ChainAccounts::Avax(list) => self.avax_accounts = list,
        }
    }

    /// Merge `totals` over the stored totals, then drop zero amounts.
    pub fn update_totals(&mut self, totals: Balances) {
        merge_and_prune(&mut self.totals, totals);
    }

    /// Merge `liabilities` over the stored liabilities, then drop zero amounts.
    pub fn update_liabilities(&mut self, liabilities: Balances) {
        merge_and_prune(&mut self.liabilities, liabilities);
    }

    /// Write a blockchain balance query result.
    ///
    /// With `chain` set only that chain's table is replaced, otherwise every table is.
    /// A chain missing from the payload is written as an empty table.
    pub fn apply_blockchain_balances(
        &mut self,
        chain: Option<Blockchain>,
        payload: &BlockchainBalances,
    ) {
        let chains: Vec<Blockchain> = match chain {
            Some(chain) => vec![chain],
            None => Blockchain::ALL.to_vec(),
        };
        for chain in chains {
            self.replace_chain_balances(payload.chain_balances(chain));
        }
        self.update_totals(payload.totals.assets.clone());
        self.update_liabilities(payload.totals.liabilities.clone());
    }

    /// Re-value stored balances at the prices in `prices`.
    ///
    /// Entries whose asset has no price keep their last usd value.
    pub fn adjust_prices(&mut self, prices: &PriceTable) {
        reprice_balances(&mut self.totals, prices);

        for manual in &mut self.manual_balances {
            if let Some(price) = prices.usd_price(&manual.asset) {
                manual.usd_value = manual.amount * price;
            }
        }

        for table in [&mut self.eth, &mut self.ksm, &mut self.dot, &mut self.avax] {
            reprice_account_table(table, prices);
        }

        for (table, chain) in [
            (&mut self.btc, Blockchain::Btc),
            (&mut self.bch, Blockchain::Bch),
        ] {
            if let Some(price) = prices.usd_price(&chain.native_asset()) {
                table.for_each_balance_mut(|balance| *balance = balance.at_price(price));
            }
        }

        for balances in self.exchange_balances.values_mut() {
            reprice_balances(balances, prices);
        }
    }

    /// Strip `tag` from every account and xpub.
    pub fn remove_tag(&mut self, tag: &str) {
        for list in [
            &mut self.eth_accounts,
            &mut self.ksm_accounts,
            &mut self.dot_accounts,
            &mut self.avax_accounts,
        ] {
            for account in list.iter_mut() {
                strip_tag(&mut account.tags, tag);
            }
        }

        for data in [&mut self.btc_accounts, &mut self.bch_accounts] {
            for account in &mut data.standalone {
                strip_tag(&mut account.tags, tag);
            }
            for xpub in &mut data.xpubs {
                strip_tag(&mut xpub.tags, tag);
                for derived in xpub.addresses.iter_mut().flatten() {
                    strip_tag(&mut derived.tags, tag);
                }
            }
        }
    }

    pub fn set_loopring_balances(&mut self, balances: LoopringBalances) {
        self.loopring_balances = balances;
    }

    pub fn set_nf_balances(&mut self, balances: NonFungibleBalances) {
        self.nf_balances = balances;
    }

    pub fn set_connected_exchanges(&mut self, exchanges: Vec<Exchange>) {
        self.connected_exchanges = exchanges;
    }

    pub fn add_exchange_balances(&mut self, location: impl Into<String>, balances: Balances) {
        self.exchange_balances.insert(location.into(), balances);
    }

    pub fn set_manual_balances(&mut self, balances: Vec<ManualBalance>) {
        self.manual_balances = balances;
    }

    pub fn set_prices(&mut self, prices: PriceTable) {
        self.prices = prices;
    }

    pub fn set_eth2_validators(&mut self, validators: Eth2Validators) {
        self.eth2_validators = validators;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn merge_and_prune(target: &mut Balances, update: Balances) {
    target.extend(update);
    target.retain(|_, balance| !balance.amount.is_zero());
}

fn reprice_balances(balances: &mut Balances, prices: &PriceTable) {
    for (asset, balance) in balances.iter_mut() {
        reprice(asset, balance, prices);
    }
}

fn reprice_account_table(table: &mut BTreeMap<String, AccountAssetBalances>, prices: &PriceTable) {
    for account in table.values_mut() {
        reprice_balances(&mut account.assets, prices);
        reprice_balances(&mut account.liabilities, prices);
    }
}

fn reprice(asset: &AssetId, balance: &mut Balance, prices: &PriceTable) {
    if let Some(price) = prices.usd_price(asset) {
        *balance = balance.at_price(price);
    }
}

fn strip_tag(tags: &mut Option<Vec<String>>, tag: &str) {
    if let Some(tags) = tags {
        tags.retain(|t| t != tag);
    }
}
