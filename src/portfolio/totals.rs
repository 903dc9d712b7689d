// src/portfolio/totals.rs
use rust_decimal::Decimal;

use crate::models::{Blockchain, BlockchainAccountWithBalance};
use crate::tasks::{Section, SectionStatuses, Status};

use super::{BalanceView, BlockchainTotal, SubBlockchainTotal};

/// Display order of the per-chain totals before sorting by value.
const TOTALS_ORDER: [Blockchain; 7] = [
    Blockchain::Eth,
    Blockchain::Btc,
    Blockchain::Bch,
    Blockchain::Ksm,
    Blockchain::Avax,
    Blockchain::Dot,
    Blockchain::Eth2,
];

pub const LOOPRING_PROTOCOL: &str = "loopring";

fn rows_usd(rows: &[BlockchainAccountWithBalance]) -> Decimal {
    rows.iter().map(|row| row.balance.usd_value).sum()
}

fn section_loading(statuses: &SectionStatuses, section: Section) -> bool {
    statuses
        .get(&section)
        .copied()
        .unwrap_or(Status::None)
        .is_loading()
}

impl BalanceView<'_> {
    /// Value per chain with at least one account, highest first.
    ///
    /// Chains worth nothing are left out.
    pub fn blockchain_totals(&self, statuses: &SectionStatuses) -> Vec<BlockchainTotal> {
        let mut totals = Vec::new();

        for chain in TOTALS_ORDER {
            let rows = self.chain_accounts(chain);
            if rows.is_empty() {
                continue;
            }

            let mut children = Vec::new();
            if chain == Blockchain::Eth && !self.state.loopring_balances.is_empty() {
                let usd_value = self
                    .state
                    .loopring_balances
                    .values()
                    .flat_map(|balances| balances.values())
                    .map(|balance| balance.usd_value)
                    .sum();
                children.push(SubBlockchainTotal {
                    protocol: LOOPRING_PROTOCOL.to_string(),
                    usd_value,
                    loading: section_loading(statuses, Section::LoopringBalances),
                });
            }

            totals.push(BlockchainTotal {
                chain,
                usd_value: rows_usd(&rows),
                loading: section_loading(statuses, Section::Blockchain(chain)),
                children,
            });
        }

        totals.retain(|total| total.usd_value > Decimal::ZERO);
        totals.sort_by(|a, b| b.usd_value.cmp(&a.usd_value));
        totals
    }
}
