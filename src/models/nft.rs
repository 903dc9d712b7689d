use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A priced non-fungible token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonFungibleBalance {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub usd_price: Decimal,
    #[serde(default)]
    pub is_lp: bool,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Non-fungible balances keyed by owner address.
pub type NonFungibleBalances = BTreeMap<String, Vec<NonFungibleBalance>>;
