use serde::{Deserialize, Serialize};

/// A connected exchange account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub location: String,
    pub name: String,
}

impl Exchange {
    pub fn new(location: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            name: name.into(),
        }
    }
}

/// Location name under which all on-chain balances are grouped.
pub const BLOCKCHAIN_LOCATION: &str = "blockchain";
