mod account;
mod asset;
mod balance;
mod blockchain;
mod eth2;
mod exchange;
mod manual;
mod nft;
mod tables;

pub use account::{
    AccountData, AccountPayload, BlockchainAccountWithBalance, BtcAccountData, GeneralAccount,
    XpubAccountData, XpubPayload, LOOPRING_TAG,
};
pub(crate) use account::unique_tags;
pub use asset::{AssetId, AssetType};
pub use balance::{usd_value_sum, AssetBalance, AssetBalanceWithPrice, Balance, Balances};
pub use blockchain::{Blockchain, UnknownBlockchain};
pub use eth2::{Eth2Validator, Eth2ValidatorPayload, Eth2Validators};
pub use exchange::{Exchange, BLOCKCHAIN_LOCATION};
pub use manual::{BalanceType, ManualBalance};
pub use nft::{NonFungibleBalance, NonFungibleBalances};
pub use tables::{
    AccountAssetBalances, BalanceTotals, BlockchainAssetBalances, BlockchainBalances, BtcBalances,
    ChainAccounts, ChainBalances, LoopringBalances, PerAccountBalances, XpubBalance,
};
