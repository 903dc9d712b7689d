use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AccountData, Balance, Balances, Blockchain, BtcAccountData};

/// Assets and liabilities held by a single address.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountAssetBalances {
    #[serde(default)]
    pub assets: Balances,
    #[serde(default)]
    pub liabilities: Balances,
}

impl AccountAssetBalances {
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty() && self.liabilities.is_empty()
    }
}

/// Per-address balances of an account-based chain.
pub type BlockchainAssetBalances = BTreeMap<String, AccountAssetBalances>;

/// Loopring balances keyed by address, then asset.
pub type LoopringBalances = BTreeMap<String, Balances>;

/// Balances of the addresses derived from one xpub.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XpubBalance {
    pub xpub: String,
    #[serde(default)]
    pub derivation_path: Option<String>,
    #[serde(default)]
    pub addresses: BTreeMap<String, Balance>,
}

/// Balances of a UTXO chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BtcBalances {
    #[serde(default)]
    pub standalone: BTreeMap<String, Balance>,
    #[serde(default)]
    pub xpubs: Vec<XpubBalance>,
}

impl BtcBalances {
    /// Balance of a derived address, from the first xpub entry that lists it.
    pub fn derived_balance(&self, address: &str) -> Option<&Balance> {
        self.xpubs
            .iter()
            .find_map(|xpub| xpub.addresses.get(address))
    }

    pub(crate) fn for_each_balance_mut(&mut self, mut f: impl FnMut(&mut Balance)) {
        for balance in self.standalone.values_mut() {
            f(balance);
        }
        for xpub in &mut self.xpubs {
            for balance in xpub.addresses.values_mut() {
                f(balance);
            }
        }
    }
}

/// Per-account section of a blockchain balances response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct PerAccountBalances {
    #[serde(default)]
    pub eth: Option<BlockchainAssetBalances>,
    #[serde(default)]
    pub eth2: Option<BlockchainAssetBalances>,
    #[serde(default)]
    pub btc: Option<BtcBalances>,
    #[serde(default)]
    pub bch: Option<BtcBalances>,
    #[serde(default)]
    pub ksm: Option<BlockchainAssetBalances>,
    #[serde(default)]
    pub dot: Option<BlockchainAssetBalances>,
    #[serde(default)]
    pub avax: Option<BlockchainAssetBalances>,
}

/// Merged totals section of a blockchain balances response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BalanceTotals {
    #[serde(default)]
    pub assets: Balances,
    #[serde(default)]
    pub liabilities: Balances,
}

/// Result of a blockchain balance query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockchainBalances {
    #[serde(default)]
    pub per_account: PerAccountBalances,
    #[serde(default)]
    pub totals: BalanceTotals,
}

impl BlockchainBalances {
    /// The table for `chain`, defaulting to empty when the response omits it.
    pub fn chain_balances(&self, chain: Blockchain) -> ChainBalances {
        let per_account = &self.per_account;
        match chain {
            Blockchain::Eth => ChainBalances::Eth(per_account.eth.clone().unwrap_or_default()),
            Blockchain::Eth2 => ChainBalances::Eth2(per_account.eth2.clone().unwrap_or_default()),
            Blockchain::Btc => ChainBalances::Btc(per_account.btc.clone().unwrap_or_default()),
            Blockchain::Bch => ChainBalances::Bch(per_account.bch.clone().unwrap_or_default()),
            Blockchain::Ksm => ChainBalances::Ksm(per_account.ksm.clone().unwrap_or_default()),
            Blockchain::Dot => ChainBalances::Dot(per_account.dot.clone().unwrap_or_default()),
            Blockchain::Avax => ChainBalances::Avax(per_account.avax.clone().unwrap_or_default()),
        }
    }
}

/// A whole per-chain balance table, ready to replace the stored one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainBalances {
    Eth(BlockchainAssetBalances),
    Eth2(BlockchainAssetBalances),
    Btc(BtcBalances),
    Bch(BtcBalances),
    Ksm(BlockchainAssetBalances),
    Dot(BlockchainAssetBalances),
    Avax(BlockchainAssetBalances),
}

impl ChainBalances {
    pub fn chain(&self) -> Blockchain {
        match self {
            ChainBalances::Eth(_) => Blockchain::Eth,
            ChainBalances::Eth2(_) => Blockchain::Eth2,
            ChainBalances::Btc(_) => Blockchain::Btc,
            ChainBalances::Bch(_) => Blockchain::Bch,
            ChainBalances::Ksm(_) => Blockchain::Ksm,
            ChainBalances::Dot(_) => Blockchain::Dot,
            ChainBalances::Avax(_) => Blockchain::Avax,
        }
    }
}

/// A whole per-chain account list, ready to replace the stored one.
///
/// ETH2 has no variant: validators are tracked separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainAccounts {
    Eth(Vec<AccountData>),
    Btc(BtcAccountData),
    Bch(BtcAccountData),
    Ksm(Vec<AccountData>),
    Dot(Vec<AccountData>),
    Avax(Vec<AccountData>),
}

impl ChainAccounts {
    pub fn chain(&self) -> Blockchain {
        match self {
            ChainAccounts::Eth(_) => Blockchain::Eth,
            ChainAccounts::Btc(_) => Blockchain::Btc,
            ChainAccounts::Bch(_) => Blockchain::Bch,
            ChainAccounts::Ksm(_) => Blockchain::Ksm,
            ChainAccounts::Dot(_) => Blockchain::Dot,
            ChainAccounts::Avax(_) => Blockchain::Avax,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AssetId;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_blockchain_balances_response() {
        let json = r#"{
            "per_account": {
                "ETH": {
                    "0xabc": {
                        "assets": {"ETH": {"amount": "1", "usd_value": "3000"}},
                        "liabilities": {}
                    }
                },
                "BTC": {
                    "standalone": {"bc1q": {"amount": "0.5", "usd_value": "20000"}},
                    "xpubs": []
                }
            },
            "totals": {
                "assets": {"ETH": {"amount": "1", "usd_value": "3000"}},
                "liabilities": {}
            }
        }"#;

        let balances: BlockchainBalances = serde_json::from_str(json).unwrap();
        let eth = balances.per_account.eth.as_ref().unwrap();
        assert_eq!(eth["0xabc"].assets[&AssetId::from("ETH")].usd_value, dec!(3000));
        assert!(balances.per_account.ksm.is_none());
        assert_eq!(
            balances.chain_balances(Blockchain::Ksm),
            ChainBalances::Ksm(BlockchainAssetBalances::new())
        );
    }

    #[test]
    fn derived_balance_uses_first_xpub_listing_the_address() {
        let mut first = XpubBalance {
            xpub: "xpub1".to_string(),
            ..Default::default()
        };
        first
            .addresses
            .insert("addr".to_string(), Balance::new(dec!(1), dec!(1)));
        let mut second = XpubBalance {
            xpub: "xpub2".to_string(),
            ..Default::default()
        };
        second
            .addresses
            .insert("addr".to_string(), Balance::new(dec!(2), dec!(2)));

        let balances = BtcBalances {
            standalone: BTreeMap::new(),
            xpubs: vec![first, second],
        };

        assert_eq!(balances.derived_balance("addr").unwrap().amount, dec!(1));
        assert!(balances.derived_balance("missing").is_none());
    }
}
