// src/portfolio/accounts.rs
use crate::models::{
    unique_tags, usd_value_sum, AccountData, AssetBalance, AssetId, Balance, Blockchain,
    BlockchainAccountWithBalance, BlockchainAssetBalances, BtcAccountData, BtcBalances,
    GeneralAccount, LOOPRING_TAG,
};

use super::BalanceView;

/// Native amount and all-asset usd value of `address` in `table`.
fn address_balance(table: &BlockchainAssetBalances, address: &str, chain: Blockchain) -> Balance {
    let Some(account) = table.get(address) else {
        return Balance::ZERO;
    };
    let amount = account
        .assets
        .get(&chain.native_asset())
        .map(|b| b.amount)
        .unwrap_or_default();
    Balance::new(amount, usd_value_sum(account.assets.values()))
}

fn account_row(chain: Blockchain, account: &AccountData, balance: Balance) -> BlockchainAccountWithBalance {
    BlockchainAccountWithBalance {
        chain,
        address: account.address.clone(),
        label: account.label_or_empty(),
        tags: account.tags_or_empty(),
        balance,
        xpub: None,
        derivation_path: None,
        ownership_percentage: None,
    }
}

fn utxo_rows(
    chain: Blockchain,
    accounts: &BtcAccountData,
    balances: &BtcBalances,
) -> Vec<BlockchainAccountWithBalance> {
    let mut rows = Vec::new();

    for account in &accounts.standalone {
        let balance = balances
            .standalone
            .get(&account.address)
            .copied()
            .unwrap_or_default();
        rows.push(account_row(chain, account, balance));
    }

    for xpub in &accounts.xpubs {
        let derivation_path = xpub.derivation_path.clone().unwrap_or_default();
        rows.push(BlockchainAccountWithBalance {
            chain,
            address: String::new(),
            label: xpub.label.clone().unwrap_or_default(),
            tags: xpub.tags.clone().unwrap_or_default(),
            balance: Balance::ZERO,
            xpub: Some(xpub.xpub.clone()),
            derivation_path: Some(derivation_path.clone()),
            ownership_percentage: None,
        });

        for derived in xpub.addresses.iter().flatten() {
            let balance = balances
                .derived_balance(&derived.address)
                .copied()
                .unwrap_or_default();
            let mut row = account_row(chain, derived, balance);
            row.xpub = Some(xpub.xpub.clone());
            row.derivation_path = Some(derivation_path.clone());
            rows.push(row);
        }
    }

    rows
}

impl BalanceView<'_> {
    fn account_chain_rows(&self, chain: Blockchain) -> Vec<BlockchainAccountWithBalance> {
        let (Some(accounts), Some(table)) =
            (self.state.chain_accounts(chain), self.state.chain_table(chain))
        else {
            return Vec::new();
        };
        accounts
            .iter()
            .map(|account| account_row(chain, account, address_balance(table, &account.address, chain)))
            .collect()
    }

    /// ETH accounts; those with loopring balances carry the `loopring` tag.
    pub fn eth_accounts(&self) -> Vec<BlockchainAccountWithBalance> {
        let mut rows = self.account_chain_rows(Blockchain::Eth);
        for row in &mut rows {
            if self.state.loopring_balances.contains_key(&row.address) {
                let mut tags = std::mem::take(&mut row.tags);
                tags.push(LOOPRING_TAG.to_string());
                row.tags = unique_tags(tags);
            }
        }
        rows
    }

    pub fn ksm_accounts(&self) -> Vec<BlockchainAccountWithBalance> {
        self.account_chain_rows(Blockchain::Ksm)
    }

    pub fn dot_accounts(&self) -> Vec<BlockchainAccountWithBalance> {
        self.account_chain_rows(Blockchain::Dot)
    }

    pub fn avax_accounts(&self) -> Vec<BlockchainAccountWithBalance> {
        self.account_chain_rows(Blockchain::Avax)
    }

    /// One row per tracked validator, labelled with the validator index.
    pub fn eth2_balances(&self) -> Vec<BlockchainAccountWithBalance> {
        self.state
            .eth2_validators
            .entries
            .iter()
            .map(|validator| BlockchainAccountWithBalance {
                chain: Blockchain::Eth2,
                address: validator.public_key.clone(),
                label: validator.validator_index.to_string(),
                tags: Vec::new(),
                balance: address_balance(&self.state.eth2, &validator.public_key, Blockchain::Eth2),
                xpub: None,
                derivation_path: None,
                ownership_percentage: Some(validator.ownership_percentage.clone()),
            })
            .collect()
    }

    pub fn loopring_accounts(&self) -> Vec<BlockchainAccountWithBalance> {
        self.state
            .loopring_balances
            .iter()
            .map(|(address, assets)| {
                let balance = assets
                    .values()
                    .fold(Balance::ZERO, |sum, balance| sum + *balance);
                let mut tags = self
                    .state
                    .eth_accounts
                    .iter()
                    .find(|account| &account.address == address)
                    .map(AccountData::tags_or_empty)
                    .unwrap_or_default();
                tags.push(LOOPRING_TAG.to_string());

                BlockchainAccountWithBalance {
                    chain: Blockchain::Eth,
                    address: address.clone(),
                    label: String::new(),
                    tags: unique_tags(tags),
                    balance,
                    xpub: None,
                    derivation_path: None,
                    ownership_percentage: None,
                }
            })
            .collect()
    }

    /// Standalone addresses first, then each xpub followed by its derived addresses.
    pub fn btc_accounts(&self) -> Vec<BlockchainAccountWithBalance> {
        utxo_rows(Blockchain::Btc, &self.state.btc_accounts, &self.state.btc)
    }

    pub fn bch_accounts(&self) -> Vec<BlockchainAccountWithBalance> {
        utxo_rows(Blockchain::Bch, &self.state.bch_accounts, &self.state.bch)
    }

    /// Display rows of a single chain.
    pub fn chain_accounts(&self, chain: Blockchain) -> Vec<BlockchainAccountWithBalance> {
        match chain {
            Blockchain::Eth => self.eth_accounts(),
            Blockchain::Eth2 => self.eth2_balances(),
            Blockchain::Btc => self.btc_accounts(),
            Blockchain::Bch => self.bch_accounts(),
            Blockchain::Ksm => self.ksm_accounts(),
            Blockchain::Dot => self.dot_accounts(),
            Blockchain::Avax => self.avax_accounts(),
        }
    }

    /// Every addressable account. Xpub summary rows are left out.
    pub fn accounts(&self) -> Vec<GeneralAccount> {
        [
            self.eth_accounts(),
            self.btc_accounts(),
            self.bch_accounts(),
            self.ksm_accounts(),
            self.dot_accounts(),
            self.avax_accounts(),
        ]
        .into_iter()
        .flatten()
        .filter(|row| !row.address.is_empty())
        .map(|row| row.general())
        .collect()
    }

    pub fn account(&self, address: &str) -> Option<GeneralAccount> {
        self.accounts()
            .into_iter()
            .find(|account| account.address == address)
    }

    pub fn eth2_account(&self, public_key: &str) -> Option<GeneralAccount> {
        let validator = self.state.eth2_validators.find(public_key)?;
        Some(GeneralAccount {
            chain: Blockchain::Eth2,
            address: validator.public_key.clone(),
            label: validator.validator_index.to_string(),
            tags: Vec::new(),
        })
    }

    /// Assets held by an ETH address, without ignored assets.
    pub fn account_assets(&self, address: &str) -> Vec<AssetBalance> {
        self.state
            .eth
            .get(address)
            .map(|account| self.visible(account.assets.iter()))
            .unwrap_or_default()
    }

    pub fn account_liabilities(&self, address: &str) -> Vec<AssetBalance> {
        self.state
            .eth
            .get(address)
            .map(|account| self.visible(account.liabilities.iter()))
            .unwrap_or_default()
    }

    /// Whether an ETH address holds enough entries to be worth expanding.
    pub fn has_details(&self, address: &str) -> bool {
        let Some(account) = self.state.eth.get(address) else {
            return false;
        };
        let loopring = self
            .state
            .loopring_balances
            .get(address)
            .map_or(0, |balances| balances.len());
        account.assets.len() + account.liabilities.len() + loopring > 1
    }

    fn visible<'b>(
        &self,
        balances: impl Iterator<Item = (&'b AssetId, &'b Balance)>,
    ) -> Vec<AssetBalance> {
        balances
            .filter(|(asset, _)| !self.assets.is_ignored(asset))
            .map(|(asset, balance)| AssetBalance::from_balance(asset.clone(), balance))
            .collect()
    }
}
