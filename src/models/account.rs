use serde::{Deserialize, Serialize};

use super::{Balance, Blockchain};

/// Account row as the backend reports it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AccountData {
    pub address: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl AccountData {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: None,
            tags: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn label_or_empty(&self) -> String {
        self.label.clone().unwrap_or_default()
    }

    pub fn tags_or_empty(&self) -> Vec<String> {
        self.tags.clone().unwrap_or_default()
    }
}

/// An extended public key together with the addresses derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct XpubAccountData {
    pub xpub: String,
    #[serde(default)]
    pub derivation_path: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub addresses: Option<Vec<AccountData>>,
}

/// Accounts of a UTXO chain.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BtcAccountData {
    #[serde(default)]
    pub standalone: Vec<AccountData>,
    #[serde(default)]
    pub xpubs: Vec<XpubAccountData>,
}

/// Minimal account description shared by every chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralAccount {
    pub chain: Blockchain,
    pub address: String,
    pub label: String,
    pub tags: Vec<String>,
}

/// An account row ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainAccountWithBalance {
    pub chain: Blockchain,
    pub address: String,
    pub label: String,
    pub tags: Vec<String>,
    pub balance: Balance,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xpub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_percentage: Option<String>,
}

impl BlockchainAccountWithBalance {
    pub fn general(&self) -> GeneralAccount {
        GeneralAccount {
            chain: self.chain,
            address: self.address.clone(),
            label: self.label.clone(),
            tags: self.tags.clone(),
        }
    }
}

/// Account payload sent when adding or editing an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPayload {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl AccountPayload {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: None,
            tags: None,
        }
    }
}

/// Identifies an xpub for removal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XpubPayload {
    pub xpub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>,
    pub blockchain: Blockchain,
}

/// Read-only tag attached to accounts that also hold loopring balances.
pub const LOOPRING_TAG: &str = "loopring";

/// Remove duplicates while keeping first-seen order.
pub(crate) fn unique_tags(tags: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::new();
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}
