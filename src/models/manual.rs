use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{AssetBalance, AssetId, Balance};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceType {
    #[default]
    Asset,
    Liability,
}

/// A balance entered by hand, held at a named location (bank, cold storage, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualBalance {
    pub id: u64,
    pub asset: AssetId,
    pub label: String,
    pub amount: Decimal,
    pub usd_value: Decimal,
    pub location: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub balance_type: BalanceType,
}

impl ManualBalance {
    pub fn balance(&self) -> Balance {
        Balance::new(self.amount, self.usd_value)
    }

    pub fn asset_balance(&self) -> AssetBalance {
        AssetBalance::from_balance(self.asset.clone(), &self.balance())
    }

    pub fn is_liability(&self) -> bool {
        self.balance_type == BalanceType::Liability
    }
}
