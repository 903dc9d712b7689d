use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::AssetId;

/// Unit prices and fiat exchange rates available to the views.
pub trait PriceOracle: Send + Sync {
    /// USD price of one unit of `asset`, or `None` when no price is known.
    fn usd_price(&self, asset: &AssetId) -> Option<Decimal>;

    /// Units of `currency` per USD.
    fn exchange_rate(&self, currency: &str) -> Option<Decimal>;
}

/// Snapshot of the latest prices and exchange rates.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceTable {
    #[serde(default)]
    pub prices: HashMap<AssetId, Decimal>,
    #[serde(default)]
    pub exchange_rates: HashMap<String, Decimal>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, asset: impl Into<AssetId>, price: Decimal) -> Self {
        self.prices.insert(asset.into(), price);
        self
    }

    pub fn with_exchange_rate(mut self, currency: impl Into<String>, rate: Decimal) -> Self {
        self.exchange_rates.insert(currency.into(), rate);
        self
    }

    /// Merge freshly fetched prices over the existing ones.
    pub fn update_prices(&mut self, prices: HashMap<AssetId, Decimal>) {
        self.prices.extend(prices);
    }

    pub fn update_exchange_rates(&mut self, rates: HashMap<String, Decimal>) {
        self.exchange_rates.extend(rates);
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl PriceOracle for PriceTable {
    fn usd_price(&self, asset: &AssetId) -> Option<Decimal> {
        self.prices.get(asset).copied()
    }

    fn exchange_rate(&self, currency: &str) -> Option<Decimal> {
        if currency.eq_ignore_ascii_case("USD") {
            return Some(self.exchange_rates.get(currency).copied().unwrap_or(Decimal::ONE));
        }
        self.exchange_rates.get(currency).copied()
    }
}
