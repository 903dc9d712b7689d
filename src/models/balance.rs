use std::collections::BTreeMap;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AssetId;

/// An amount together with its value in USD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub amount: Decimal,
    pub usd_value: Decimal,
}

impl Balance {
    pub const ZERO: Balance = Balance {
        amount: Decimal::ZERO,
        usd_value: Decimal::ZERO,
    };

    pub fn new(amount: Decimal, usd_value: Decimal) -> Self {
        Self { amount, usd_value }
    }

    /// Re-value the balance at `price`, keeping the amount.
    pub fn at_price(&self, price: Decimal) -> Self {
        Self {
            amount: self.amount,
            usd_value: self.amount * price,
        }
    }
}

impl Add for Balance {
    type Output = Balance;

    fn add(self, rhs: Balance) -> Balance {
        Balance {
            amount: self.amount + rhs.amount,
            usd_value: self.usd_value + rhs.usd_value,
        }
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Balance) {
        self.amount += rhs.amount;
        self.usd_value += rhs.usd_value;
    }
}

/// Per-asset balances keyed by asset identifier.
pub type Balances = BTreeMap<AssetId, Balance>;

/// Sum of the USD values of every entry.
pub fn usd_value_sum<'a>(balances: impl IntoIterator<Item = &'a Balance>) -> Decimal {
    balances.into_iter().map(|b| b.usd_value).sum()
}

/// A balance tagged with the asset it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: AssetId,
    pub amount: Decimal,
    pub usd_value: Decimal,
}

impl AssetBalance {
    pub fn new(asset: impl Into<AssetId>, amount: Decimal, usd_value: Decimal) -> Self {
        Self {
            asset: asset.into(),
            amount,
            usd_value,
        }
    }

    pub fn from_balance(asset: AssetId, balance: &Balance) -> Self {
        Self {
            asset,
            amount: balance.amount,
            usd_value: balance.usd_value,
        }
    }

    pub fn balance(&self) -> Balance {
        Balance::new(self.amount, self.usd_value)
    }
}

/// Aggregated asset balance with the unit price it was valued at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalanceWithPrice {
    pub asset: AssetId,
    pub amount: Decimal,
    pub usd_value: Decimal,
    /// Unit price in USD. `None` when no price is known, which is not the same as zero.
    pub usd_price: Option<Decimal>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn balances_add_field_wise() {
        let mut total = Balance::new(dec!(1.5), dec!(3000));
        total += Balance::new(dec!(0.25), dec!(500.10));
        assert_eq!(total, Balance::new(dec!(1.75), dec!(3500.10)));
    }

    #[test]
    fn at_price_keeps_amount() {
        let balance = Balance::new(dec!(2), dec!(1));
        assert_eq!(balance.at_price(dec!(10)), Balance::new(dec!(2), dec!(20)));
    }

    #[test]
    fn balance_accepts_string_and_number_amounts() {
        let json = r#"{"amount": "1.000000000000000001", "usd_value": 12.5}"#;
        let balance: Balance = serde_json::from_str(json).unwrap();
        assert_eq!(balance.amount, dec!(1.000000000000000001));
        assert_eq!(balance.usd_value, dec!(12.5));
    }
}
