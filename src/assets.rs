use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result};
use regex::Regex;

use crate::config::AssetsConfig;
use crate::models::{AssetId, AssetType, Blockchain};

/// Answers identity questions about assets while aggregating.
pub trait AssetResolver: Send + Sync {
    /// The canonical asset `asset` is merged into. Identity when no alias exists.
    fn associated_asset(&self, asset: &AssetId) -> AssetId;

    /// Whether the asset is hidden from aggregates.
    fn is_ignored(&self, asset: &AssetId) -> bool;

    fn asset_type(&self, asset: &AssetId) -> Option<AssetType>;
}

/// Resolver backed by configured aliases and ignore rules.
#[derive(Debug, Clone, Default)]
pub struct AssetRegistry {
    aliases: HashMap<AssetId, AssetId>,
    ignored: HashSet<AssetId>,
    ignored_patterns: Vec<Regex>,
    ethereum_tokens: HashSet<AssetId>,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &AssetsConfig) -> Result<Self> {
        let mut registry = Self::new();
        for (asset, canonical) in &config.aliases {
            registry.add_alias(asset.as_str(), canonical.as_str());
        }
        for asset in &config.ignored {
            registry.ignore(asset.as_str());
        }
        for (idx, pattern) in config.ignored_patterns.iter().enumerate() {
            registry.add_ignore_pattern(idx, pattern)?;
        }
        for asset in &config.ethereum_tokens {
            registry.add_ethereum_token(asset.as_str());
        }
        Ok(registry)
    }

    pub fn add_alias(&mut self, asset: impl Into<AssetId>, canonical: impl Into<AssetId>) {
        self.aliases.insert(asset.into(), canonical.into());
    }

    pub fn ignore(&mut self, asset: impl Into<AssetId>) {
        self.ignored.insert(asset.into());
    }

    pub fn add_ethereum_token(&mut self, asset: impl Into<AssetId>) {
        self.ethereum_tokens.insert(asset.into());
    }

    fn add_ignore_pattern(&mut self, index: usize, pattern: &str) -> Result<()> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            anyhow::bail!("assets.ignored_patterns[{index}] must not be empty");
        }
        let compiled = Regex::new(trimmed)
            .with_context(|| format!("Invalid assets.ignored_patterns[{index}] regex: {trimmed}"))?;
        self.ignored_patterns.push(compiled);
        Ok(())
    }
}

impl AssetResolver for AssetRegistry {
    fn associated_asset(&self, asset: &AssetId) -> AssetId {
        self.aliases
            .get(asset)
            .cloned()
            .unwrap_or_else(|| asset.clone())
    }

    fn is_ignored(&self, asset: &AssetId) -> bool {
        self.ignored.contains(asset)
            || self
                .ignored_patterns
                .iter()
                .any(|re| re.is_match(asset.as_str()))
    }

    fn asset_type(&self, asset: &AssetId) -> Option<AssetType> {
        if self.ethereum_tokens.contains(asset) || asset.as_str().starts_with("_ceth_") {
            return Some(AssetType::EthereumToken);
        }
        if Blockchain::ALL
            .iter()
            .any(|chain| chain.native_asset() == *asset)
        {
            return Some(AssetType::OwnChain);
        }
        match asset.as_str() {
            "USD" | "EUR" | "GBP" | "JPY" | "CHF" | "CNY" | "CAD" | "AUD" => Some(AssetType::Fiat),
            _ => None,
        }
    }
}
