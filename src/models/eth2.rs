use serde::{Deserialize, Serialize};

/// A staking validator tracked by public key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth2Validator {
    pub public_key: String,
    pub validator_index: u64,
    #[serde(default = "full_ownership")]
    pub ownership_percentage: String,
}

fn full_ownership() -> String {
    "100".to_string()
}

/// Validator list as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eth2Validators {
    #[serde(default)]
    pub entries: Vec<Eth2Validator>,
    #[serde(default = "unlimited")]
    pub entries_limit: i64,
    #[serde(default)]
    pub entries_found: usize,
}

fn unlimited() -> i64 {
    -1
}

impl Default for Eth2Validators {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            entries_limit: unlimited(),
            entries_found: 0,
        }
    }
}

impl Eth2Validators {
    pub fn find(&self, public_key: &str) -> Option<&Eth2Validator> {
        self.entries.iter().find(|v| v.public_key == public_key)
    }
}

/// Payload used to add or edit a validator. Either key may identify it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Eth2ValidatorPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ownership_percentage: Option<String>,
}

impl Eth2ValidatorPayload {
    pub fn id(&self) -> String {
        self.public_key
            .clone()
            .or_else(|| self.validator_index.map(|i| i.to_string()))
            .unwrap_or_default()
    }
}
