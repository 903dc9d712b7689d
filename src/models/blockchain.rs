use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::AssetId;

/// Chains whose accounts are tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Blockchain {
    Eth,
    Eth2,
    Btc,
    Bch,
    Ksm,
    Dot,
    Avax,
}

impl Blockchain {
    pub const ALL: [Blockchain; 7] = [
        Blockchain::Eth,
        Blockchain::Eth2,
        Blockchain::Btc,
        Blockchain::Bch,
        Blockchain::Ksm,
        Blockchain::Dot,
        Blockchain::Avax,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Blockchain::Eth => "ETH",
            Blockchain::Eth2 => "ETH2",
            Blockchain::Btc => "BTC",
            Blockchain::Bch => "BCH",
            Blockchain::Ksm => "KSM",
            Blockchain::Dot => "DOT",
            Blockchain::Avax => "AVAX",
        }
    }

    /// The asset a chain's accounts hold natively. Shares the chain symbol.
    pub fn native_asset(self) -> AssetId {
        AssetId::from(self.symbol())
    }

    /// UTXO chains organise accounts as standalone addresses plus xpubs.
    pub fn is_utxo(self) -> bool {
        matches!(self, Blockchain::Btc | Blockchain::Bch)
    }

    /// Chains that accept several addresses in a single add request.
    pub fn supports_bulk_add(self) -> bool {
        matches!(
            self,
            Blockchain::Eth | Blockchain::Avax | Blockchain::Dot | Blockchain::Ksm
        )
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown blockchain {0:?}")]
pub struct UnknownBlockchain(String);

impl FromStr for Blockchain {
    type Err = UnknownBlockchain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Blockchain::ALL
            .into_iter()
            .find(|chain| chain.symbol() == upper)
            .ok_or(UnknownBlockchain(s.to_string()))
    }
}
