// src/portfolio/models.rs
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::GeneralSettings;
use crate::models::{Balance, Blockchain};

/// Settings that change how views are computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub treat_eth2_as_eth: bool,
    pub currency_symbol: String,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            treat_eth2_as_eth: false,
            currency_symbol: "USD".to_string(),
        }
    }
}

impl From<&GeneralSettings> for ViewSettings {
    fn from(settings: &GeneralSettings) -> Self {
        Self {
            treat_eth2_as_eth: settings.treat_eth2_as_eth,
            currency_symbol: settings.currency_symbol.clone(),
        }
    }
}

/// Where a single asset is held.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBreakdown {
    /// Holding address, empty for exchange and manual rows.
    pub address: String,
    pub location: String,
    pub balance: Balance,
    pub tags: Vec<String>,
}

/// Value held on a layer-2 protocol of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubBlockchainTotal {
    pub protocol: String,
    pub usd_value: Decimal,
    pub loading: bool,
}

/// Value held on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainTotal {
    pub chain: Blockchain,
    pub usd_value: Decimal,
    pub loading: bool,
    pub children: Vec<SubBlockchainTotal>,
}
