// src/portfolio/breakdown.rs
use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{
    usd_value_sum, AccountData, AssetBalance, AssetBalanceWithPrice, AssetId, Balance,
    Blockchain, BlockchainAssetBalances, BtcAccountData, BtcBalances, LOOPRING_TAG,
    BLOCKCHAIN_LOCATION,
};

use super::{aggregate, AssetBreakdown, BalanceView};

fn tags_of(accounts: &[AccountData], address: &str) -> Vec<String> {
    accounts
        .iter()
        .find(|account| account.address == address)
        .map(AccountData::tags_or_empty)
        .unwrap_or_default()
}

fn chain_holdings(
    breakdown: &mut Vec<AssetBreakdown>,
    chain: Blockchain,
    table: &BlockchainAssetBalances,
    accounts: &[AccountData],
    asset: &AssetId,
) {
    for (address, balances) in table {
        let Some(balance) = balances.assets.get(asset) else {
            continue;
        };
        breakdown.push(AssetBreakdown {
            address: address.clone(),
            location: chain.symbol().to_string(),
            balance: *balance,
            tags: tags_of(accounts, address),
        });
    }
}

fn utxo_holdings(
    breakdown: &mut Vec<AssetBreakdown>,
    chain: Blockchain,
    balances: &BtcBalances,
    accounts: &BtcAccountData,
) {
    for (address, balance) in &balances.standalone {
        breakdown.push(AssetBreakdown {
            address: address.clone(),
            location: chain.symbol().to_string(),
            balance: *balance,
            tags: tags_of(&accounts.standalone, address),
        });
    }

    for xpub in &balances.xpubs {
        let tags = accounts
            .xpubs
            .iter()
            .find(|account| account.xpub == xpub.xpub)
            .and_then(|account| account.tags.clone())
            .unwrap_or_default();
        for (address, balance) in &xpub.addresses {
            breakdown.push(AssetBreakdown {
                address: address.clone(),
                location: chain.symbol().to_string(),
                balance: *balance,
                tags: tags.clone(),
            });
        }
    }
}

impl BalanceView<'_> {
    /// Every place `asset` is held, exchanges first, then manual entries, then chains.
    pub fn asset_breakdown(&self, asset: &AssetId) -> Vec<AssetBreakdown> {
        let state = self.state;
        let mut breakdown = Vec::new();

        for (location, balances) in &state.exchange_balances {
            if let Some(balance) = balances.get(asset) {
                breakdown.push(AssetBreakdown {
                    address: String::new(),
                    location: location.clone(),
                    balance: *balance,
                    tags: Vec::new(),
                });
            }
        }

        for manual in state.manual_balances.iter().filter(|m| &m.asset == asset) {
            breakdown.push(AssetBreakdown {
                address: String::new(),
                location: manual.location.clone(),
                balance: manual.balance(),
                tags: manual.tags.clone().unwrap_or_default(),
            });
        }

        chain_holdings(&mut breakdown, Blockchain::Eth, &state.eth, &state.eth_accounts, asset);

        for (address, balances) in &state.loopring_balances {
            let Some(balance) = balances.get(asset) else {
                continue;
            };
            match breakdown.iter_mut().find(|row| &row.address == address) {
                Some(existing) => existing.balance += *balance,
                None => breakdown.push(AssetBreakdown {
                    address: address.clone(),
                    location: Blockchain::Eth.symbol().to_string(),
                    balance: *balance,
                    tags: vec![LOOPRING_TAG.to_string()],
                }),
            }
        }

        if *asset == Blockchain::Btc.native_asset() {
            utxo_holdings(&mut breakdown, Blockchain::Btc, &state.btc, &state.btc_accounts);
        }
        if *asset == Blockchain::Bch.native_asset() {
            utxo_holdings(&mut breakdown, Blockchain::Bch, &state.bch, &state.bch_accounts);
        }

        chain_holdings(&mut breakdown, Blockchain::Ksm, &state.ksm, &state.ksm_accounts, asset);
        chain_holdings(&mut breakdown, Blockchain::Dot, &state.dot, &state.dot_accounts, asset);
        chain_holdings(&mut breakdown, Blockchain::Avax, &state.avax, &state.avax_accounts, asset);

        let eth2 = Blockchain::Eth2.native_asset();
        let includes_validators = *asset == eth2
            || (self.settings.treat_eth2_as_eth && *asset == Blockchain::Eth.native_asset());
        if includes_validators {
            for validator in &state.eth2_validators.entries {
                let balance = state
                    .eth2
                    .get(&validator.public_key)
                    .map(|balances| {
                        let amount = balances
                            .assets
                            .get(&eth2)
                            .map(|b| b.amount)
                            .unwrap_or_default();
                        Balance::new(amount, usd_value_sum(balances.assets.values()))
                    })
                    .unwrap_or_default();
                breakdown.push(AssetBreakdown {
                    address: validator.public_key.clone(),
                    location: Blockchain::Eth2.symbol().to_string(),
                    balance,
                    tags: Vec::new(),
                });
            }
        }

        breakdown
    }

    /// Priced holdings at a single location (an exchange, `blockchain`, or a manual location).
    pub fn location_breakdown(&self, location: &str) -> Vec<AssetBalanceWithPrice> {
        let state = self.state;
        let mut sources: Vec<AssetBalance> = Vec::new();

        if state
            .connected_exchanges
            .iter()
            .any(|exchange| exchange.location == location)
        {
            sources.extend(self.exchange_balances(location));
        }

        if location == BLOCKCHAIN_LOCATION {
            sources.extend(self.totals());
            for balances in state.loopring_balances.values() {
                sources.extend(
                    balances
                        .iter()
                        .map(|(asset, balance)| AssetBalance::from_balance(asset.clone(), balance)),
                );
            }
        }

        sources.extend(
            state
                .manual_balances
                .iter()
                .filter(|manual| !manual.is_liability() && manual.location == location)
                .map(|manual| manual.asset_balance()),
        );

        aggregate(sources, self.assets, self.prices)
    }

    /// Net value per location, in the configured currency where a rate is known.
    pub fn by_location(&self) -> BTreeMap<String, Decimal> {
        let state = self.state;
        let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();

        for manual in state.manual_balances.iter().filter(|m| !m.is_liability()) {
            *totals.entry(manual.location.clone()).or_default() += manual.usd_value;
        }

        let rate = self
            .prices
            .exchange_rate(&self.settings.currency_symbol)
            .unwrap_or(Decimal::ONE);

        *totals.entry(BLOCKCHAIN_LOCATION.to_string()).or_default() +=
            self.blockchain_total() * rate;

        let mut locations: Vec<&str> = Vec::new();
        for exchange in &state.connected_exchanges {
            if !locations.contains(&exchange.location.as_str()) {
                locations.push(&exchange.location);
            }
        }
        for location in locations {
            let total = state
                .exchange_balances
                .get(location)
                .map(|balances| usd_value_sum(balances.values()))
                .unwrap_or_default();
            *totals.entry(location.to_string()).or_default() += total * rate;
        }

        totals
    }
}
