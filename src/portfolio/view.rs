// src/portfolio/view.rs
use rust_decimal::Decimal;

use crate::assets::AssetResolver;
use crate::models::{
    AssetBalance, AssetBalanceWithPrice, AssetId, AssetType, NonFungibleBalance,
};
use crate::prices::PriceOracle;
use crate::state::BalanceState;

use super::{aggregate, merge_asset_balances, ViewSettings};

/// Assets that always share a price with another asset.
fn same_price_assets(asset: &AssetId) -> &'static [&'static str] {
    match asset.as_str() {
        "ETH" => &["ETH2"],
        _ => &[],
    }
}

/// Read-only projections over a [`BalanceState`] snapshot.
///
/// Every method is a pure function of the state, the resolver, the prices and the
/// settings. Nothing is cached; callers re-derive after each state change.
pub struct BalanceView<'a> {
    pub(super) state: &'a BalanceState,
    pub(super) assets: &'a dyn AssetResolver,
    pub(super) prices: &'a dyn PriceOracle,
    pub(super) settings: &'a ViewSettings,
}

impl<'a> BalanceView<'a> {
    pub fn new(
        state: &'a BalanceState,
        assets: &'a dyn AssetResolver,
        prices: &'a dyn PriceOracle,
        settings: &'a ViewSettings,
    ) -> Self {
        Self {
            state,
            assets,
            prices,
            settings,
        }
    }

    pub fn state(&self) -> &BalanceState {
        self.state
    }

    /// Blockchain totals merged by canonical asset.
    pub fn totals(&self) -> Vec<AssetBalance> {
        merge_asset_balances(
            self.state
                .totals
                .iter()
                .map(|(asset, balance)| AssetBalance::from_balance(asset.clone(), balance)),
            self.assets,
        )
    }

    /// Balances of one exchange, highest value first.
    pub fn exchange_balances(&self, location: &str) -> Vec<AssetBalance> {
        let mut balances: Vec<AssetBalance> = self
            .state
            .exchange_balances
            .get(location)
            .map(|balances| {
                balances
                    .iter()
                    .map(|(asset, balance)| AssetBalance::from_balance(asset.clone(), balance))
                    .collect()
            })
            .unwrap_or_default();
        balances.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
        balances
    }

    fn loopring_entries(&self) -> impl Iterator<Item = AssetBalance> + '_ {
        self.state.loopring_balances.values().flat_map(|balances| {
            balances
                .iter()
                .map(|(asset, balance)| AssetBalance::from_balance(asset.clone(), balance))
        })
    }

    fn manual_assets(&self) -> impl Iterator<Item = AssetBalance> + '_ {
        self.state
            .manual_balances
            .iter()
            .filter(|manual| !manual.is_liability())
            .map(|manual| manual.asset_balance())
    }

    /// Every owned asset across exchanges, chains, manual entries and loopring.
    pub fn aggregated_balances(&self) -> Vec<AssetBalanceWithPrice> {
        let mut locations: Vec<&str> = Vec::new();
        for exchange in &self.state.connected_exchanges {
            if !locations.contains(&exchange.location.as_str()) {
                locations.push(&exchange.location);
            }
        }

        let exchange_entries = locations
            .into_iter()
            .flat_map(|location| self.exchange_balances(location));

        let sources = exchange_entries
            .chain(self.totals())
            .chain(self.manual_assets())
            .chain(self.loopring_entries());

        aggregate(sources, self.assets, self.prices)
    }

    pub fn liabilities(&self) -> Vec<AssetBalanceWithPrice> {
        let chain_liabilities = self
            .state
            .liabilities
            .iter()
            .map(|(asset, balance)| AssetBalance::from_balance(asset.clone(), balance));
        let manual_liabilities = self
            .state
            .manual_balances
            .iter()
            .filter(|manual| manual.is_liability())
            .map(|manual| manual.asset_balance());

        aggregate(
            chain_liabilities.chain(manual_liabilities),
            self.assets,
            self.prices,
        )
    }

    /// On-chain assets, including loopring.
    pub fn blockchain_assets(&self) -> Vec<AssetBalanceWithPrice> {
        aggregate(
            self.totals().into_iter().chain(self.loopring_entries()),
            self.assets,
            self.prices,
        )
    }

    pub fn loopring_balances(&self, address: &str) -> Vec<AssetBalance> {
        let Some(balances) = self.state.loopring_balances.get(address) else {
            return Vec::new();
        };
        merge_asset_balances(
            balances
                .iter()
                .map(|(asset, balance)| AssetBalance::from_balance(asset.clone(), balance)),
            self.assets,
        )
    }

    pub fn blockchain_total(&self) -> Decimal {
        self.totals().iter().map(|b| b.usd_value).sum()
    }

    /// Identifiers of every owned or owed asset, plus assets sharing their price.
    pub fn aggregated_assets(&self) -> Vec<AssetId> {
        let mut assets: Vec<AssetId> = self
            .aggregated_balances()
            .into_iter()
            .map(|b| b.asset)
            .chain(self.liabilities().into_iter().map(|b| b.asset))
            .collect();

        let companions: Vec<AssetId> = assets
            .iter()
            .flat_map(|asset| same_price_assets(asset).iter().copied().map(AssetId::from))
            .collect();
        assets.extend(companions);

        let mut unique: Vec<AssetId> = Vec::with_capacity(assets.len());
        for asset in assets {
            if !unique.contains(&asset) {
                unique.push(asset);
            }
        }
        unique
    }

    pub fn is_ethereum_token(&self, asset: &AssetId) -> bool {
        self.assets.asset_type(asset) == Some(AssetType::EthereumToken)
    }

    pub fn nf_balances(&self) -> Vec<NonFungibleBalance> {
        self.state.nf_balances.values().flatten().cloned().collect()
    }

    /// Value of every non-fungible balance. LP positions count only when asked.
    pub fn nf_total_value(&self, include_lp: bool) -> Decimal {
        self.state
            .nf_balances
            .values()
            .flatten()
            .filter(|nft| include_lp || !nft.is_lp)
            .map(|nft| nft.usd_price)
            .sum()
    }
}
