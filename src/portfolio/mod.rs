// src/portfolio/mod.rs
//! Pure projections from the raw balance tables to view-ready aggregates.

mod accounts;
mod breakdown;
mod merge;
mod models;
mod totals;
mod view;

pub use merge::{aggregate, merge_asset_balances};
pub use models::*;
pub use totals::LOOPRING_PROTOCOL;
pub use view::BalanceView;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetRegistry;
    use crate::models::{AssetId, Balance, BalanceType, Balances, Exchange, ManualBalance};
    use crate::prices::PriceTable;
    use crate::state::BalanceState;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn balances(entries: &[(&str, Decimal, Decimal)]) -> Balances {
        entries
            .iter()
            .map(|(asset, amount, usd)| (AssetId::from(*asset), Balance::new(*amount, *usd)))
            .collect()
    }

    fn manual(asset: &str, amount: Decimal, balance_type: BalanceType) -> ManualBalance {
        ManualBalance {
            id: 1,
            asset: asset.into(),
            label: "manual".to_string(),
            amount,
            usd_value: amount,
            location: "bank".to_string(),
            tags: None,
            balance_type,
        }
    }

    fn scenario_state() -> BalanceState {
        let mut state = BalanceState::new();
        state.set_connected_exchanges(vec![Exchange::new("kraken", "kraken")]);
        state.add_exchange_balances(
            "kraken",
            balances(&[
                ("DAI", dec!(50), dec!(50)),
                ("BTC", dec!(50), dec!(50)),
                ("ETH", dec!(50), dec!(50)),
                ("EUR", dec!(50), dec!(50)),
            ]),
        );
        state.update_totals(balances(&[
            ("DAI", dec!(100), dec!(100)),
            ("BTC", dec!(100), dec!(100)),
            ("ETH", dec!(100), dec!(100)),
            ("SAI", dec!(100), dec!(100)),
        ]));
        state.set_manual_balances(vec![manual("DAI", dec!(50), BalanceType::Asset)]);
        state
    }

    fn scenario_prices() -> PriceTable {
        PriceTable::new()
            .with_price("DAI", dec!(1))
            .with_price("EUR", dec!(1))
            .with_price("SAI", dec!(1))
            .with_price("ETH", dec!(3000))
            .with_price("BTC", dec!(40000))
    }

    #[test]
    fn aggregated_balances_sum_every_source() {
        let state = scenario_state();
        let registry = AssetRegistry::new();
        let prices = scenario_prices();
        let settings = ViewSettings::default();
        let view = BalanceView::new(&state, &registry, &prices, &settings);

        let aggregated = view.aggregated_balances();
        let rows: Vec<(&str, Decimal, Decimal, Option<Decimal>)> = aggregated
            .iter()
            .map(|b| (b.asset.as_str(), b.amount, b.usd_value, b.usd_price))
            .collect();

        assert_eq!(
            rows,
            vec![
                ("DAI", dec!(200), dec!(200), Some(dec!(1))),
                ("BTC", dec!(150), dec!(150), Some(dec!(40000))),
                ("ETH", dec!(150), dec!(150), Some(dec!(3000))),
                ("SAI", dec!(100), dec!(100), Some(dec!(1))),
                ("EUR", dec!(50), dec!(50), Some(dec!(1))),
            ]
        );
    }

    #[test]
    fn aliased_assets_merge_across_sources() {
        let state = scenario_state();
        let mut registry = AssetRegistry::new();
        registry.add_alias("SAI", "DAI");
        let prices = scenario_prices();
        let settings = ViewSettings::default();
        let view = BalanceView::new(&state, &registry, &prices, &settings);

        let totals = view.totals();
        let dai = totals.iter().find(|b| b.asset == "DAI").unwrap();
        assert_eq!(dai.amount, dec!(200));
        assert!(totals.iter().all(|b| b.asset != "SAI"));

        let aggregated = view.aggregated_balances();
        assert_eq!(aggregated[0].asset, "DAI");
        assert_eq!(aggregated[0].amount, dec!(300));
    }

    #[test]
    fn liabilities_include_manual_entries() {
        let mut state = BalanceState::new();
        state.update_liabilities(balances(&[("DAI", dec!(100), dec!(100))]));
        state.set_manual_balances(vec![
            manual("DAI", dec!(20), BalanceType::Liability),
            manual("ETH", dec!(1), BalanceType::Asset),
        ]);
        let registry = AssetRegistry::new();
        let prices = PriceTable::new();
        let settings = ViewSettings::default();
        let view = BalanceView::new(&state, &registry, &prices, &settings);

        let liabilities = view.liabilities();
        assert_eq!(liabilities.len(), 1);
        assert_eq!(liabilities[0].amount, dec!(120));
        assert_eq!(liabilities[0].usd_price, None);

        let assets = view.aggregated_assets();
        assert_eq!(
            assets,
            vec![AssetId::from("ETH"), AssetId::from("DAI"), AssetId::from("ETH2")]
        );
    }

    #[test]
    fn blockchain_views_include_loopring() {
        let mut state = BalanceState::new();
        state.update_totals(balances(&[("ETH", dec!(1), dec!(3000))]));
        state.loopring_balances.insert(
            "0x1".to_string(),
            balances(&[("ETH", dec!(0.5), dec!(1500)), ("LRC", dec!(10), dec!(5))]),
        );
        let registry = AssetRegistry::new();
        let prices = PriceTable::new().with_price("ETH", dec!(3000));
        let settings = ViewSettings::default();
        let view = BalanceView::new(&state, &registry, &prices, &settings);

        let assets = view.blockchain_assets();
        assert_eq!(assets[0].amount, dec!(1.5));
        assert_eq!(assets[1].asset, "LRC");
        assert_eq!(view.blockchain_total(), dec!(3000));

        let loopring = view.loopring_balances("0x1");
        assert_eq!(loopring[0].asset, "ETH");
        assert!(view.loopring_balances("0x2").is_empty());
    }

    #[test]
    fn non_fungible_value_skips_lp_by_default() {
        use crate::models::NonFungibleBalance;

        let mut state = BalanceState::new();
        state.set_nf_balances(
            [(
                "0x1".to_string(),
                vec![
                    NonFungibleBalance {
                        id: "punk".to_string(),
                        name: Some("Punk".to_string()),
                        usd_price: dec!(100000),
                        is_lp: false,
                        image_url: None,
                    },
                    NonFungibleBalance {
                        id: "uni-v3".to_string(),
                        name: None,
                        usd_price: dec!(500),
                        is_lp: true,
                        image_url: None,
                    },
                ],
            )]
            .into(),
        );
        let registry = AssetRegistry::new();
        let prices = PriceTable::new();
        let settings = ViewSettings::default();
        let view = BalanceView::new(&state, &registry, &prices, &settings);

        assert_eq!(view.nf_balances().len(), 2);
        assert_eq!(view.nf_total_value(false), dec!(100000));
        assert_eq!(view.nf_total_value(true), dec!(100500));
    }

    #[test]
    fn ethereum_tokens_come_from_the_resolver() {
        let state = BalanceState::new();
        let mut registry = AssetRegistry::new();
        registry.add_ethereum_token("DAI");
        let prices = PriceTable::new();
        let settings = ViewSettings::default();
        let view = BalanceView::new(&state, &registry, &prices, &settings);

        assert!(view.is_ethereum_token(&"DAI".into()));
        assert!(!view.is_ethereum_token(&"BTC".into()));
    }
}
