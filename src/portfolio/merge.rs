// src/portfolio/merge.rs
use std::collections::HashMap;

use crate::assets::AssetResolver;
use crate::models::{AssetBalance, AssetBalanceWithPrice, AssetId, Balance};
use crate::prices::PriceOracle;

/// Fold balances into one entry per canonical asset, keeping first-seen order.
fn fold<I>(sources: I, resolver: &dyn AssetResolver) -> Vec<(AssetId, Balance)>
where
    I: IntoIterator<Item = AssetBalance>,
{
    let mut merged: Vec<(AssetId, Balance)> = Vec::new();
    let mut index: HashMap<AssetId, usize> = HashMap::new();

    for entry in sources {
        let canonical = resolver.associated_asset(&entry.asset);
        let balance = entry.balance();
        match index.get(&canonical) {
            Some(&idx) => merged[idx].1 += balance,
            None => {
                index.insert(canonical.clone(), merged.len());
                merged.push((canonical, balance));
            }
        }
    }

    merged.retain(|(asset, _)| !resolver.is_ignored(asset));
    merged
}

/// Merge balances by canonical asset without pricing them.
///
/// Ignored assets are dropped and the result is sorted by usd value, highest first.
pub fn merge_asset_balances<I>(sources: I, resolver: &dyn AssetResolver) -> Vec<AssetBalance>
where
    I: IntoIterator<Item = AssetBalance>,
{
    let mut merged: Vec<AssetBalance> = fold(sources, resolver)
        .into_iter()
        .map(|(asset, balance)| AssetBalance::from_balance(asset, &balance))
        .collect();
    merged.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
    merged
}

/// Merge balances by canonical asset and attach the unit price of each result.
///
/// Entries that share a canonical asset are summed field-wise. Ignored canonical
/// assets are dropped. The sort is stable and descending by usd value, so ties keep
/// the order in which the asset was first seen.
pub fn aggregate<I>(
    sources: I,
    resolver: &dyn AssetResolver,
    prices: &dyn PriceOracle,
) -> Vec<AssetBalanceWithPrice>
where
    I: IntoIterator<Item = AssetBalance>,
{
    let mut aggregated: Vec<AssetBalanceWithPrice> = fold(sources, resolver)
        .into_iter()
        .map(|(asset, balance)| AssetBalanceWithPrice {
            usd_price: prices.usd_price(&asset),
            asset,
            amount: balance.amount,
            usd_value: balance.usd_value,
        })
        .collect();
    aggregated.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
    aggregated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetRegistry;
    use crate::prices::PriceTable;
    use rust_decimal_macros::dec;

    fn entry(asset: &str, amount: rust_decimal::Decimal, usd: rust_decimal::Decimal) -> AssetBalance {
        AssetBalance::new(asset, amount, usd)
    }

    #[test]
    fn aliases_merge_into_canonical_asset() {
        let mut registry = AssetRegistry::new();
        registry.add_alias("SAI", "DAI");
        let prices = PriceTable::new().with_price("DAI", dec!(1));

        let result = aggregate(
            vec![entry("SAI", dec!(100), dec!(100)), entry("DAI", dec!(100), dec!(100))],
            &registry,
            &prices,
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].asset, "DAI");
        assert_eq!(result[0].amount, dec!(200));
        assert_eq!(result[0].usd_price, Some(dec!(1)));
    }

    #[test]
    fn ignored_canonical_asset_drops_its_aliases() {
        let mut registry = AssetRegistry::new();
        registry.add_alias("SAI", "DAI");
        registry.ignore("DAI");

        let result = aggregate(
            vec![entry("SAI", dec!(1), dec!(1)), entry("ETH", dec!(1), dec!(3000))],
            &registry,
            &PriceTable::new(),
        );

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].asset, "ETH");
        assert_eq!(result[0].usd_price, None);
    }

    #[test]
    fn ties_keep_first_seen_order_and_zero_rows_survive() {
        let registry = AssetRegistry::new();
        let result = merge_asset_balances(
            vec![
                entry("B", dec!(1), dec!(10)),
                entry("A", dec!(1), dec!(10)),
                entry("Z", dec!(0), dec!(0)),
                entry("C", dec!(1), dec!(20)),
            ],
            &registry,
        );
        let order: Vec<&str> = result.iter().map(|b| b.asset.as_str()).collect();
        assert_eq!(order, vec!["C", "B", "A", "Z"]);
    }

    #[test]
    fn merge_order_does_not_change_totals() {
        let mut registry = AssetRegistry::new();
        registry.add_alias("WETH", "ETH");
        let sources = vec![
            entry("ETH", dec!(1), dec!(3000)),
            entry("WETH", dec!(0.5), dec!(1500)),
            entry("BTC", dec!(0.1), dec!(4000)),
        ];
        let mut reversed = sources.clone();
        reversed.reverse();

        let forward = merge_asset_balances(sources, &registry);
        let backward = merge_asset_balances(reversed, &registry);
        assert_eq!(forward, backward);

        let again = merge_asset_balances(forward.clone(), &registry);
        assert_eq!(again, forward);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let registry = AssetRegistry::new();
        assert!(aggregate(Vec::new(), &registry, &PriceTable::new()).is_empty());
    }
}
