use crate::bytes::Bytes32;
use crate::coin::Coin;
use serde::{Deserialize, Serialize};

/// The unspent-index entry for one coin. `spent_block_index == 0` means the
/// coin is live. Coinbase records are frozen for a configured number of
/// blocks after confirmation.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq)]
pub struct CoinRecord {
    pub coin: Coin,
    pub confirmed_block_index: u32,
    pub spent_block_index: u32,
    pub coinbase: bool,
    /// Timestamp of the block at height `confirmed_block_index`, in
    /// milliseconds.
    pub timestamp: u64,
}

impl CoinRecord {
    pub fn new(coin: Coin, confirmed_block_index: u32, coinbase: bool, timestamp: u64) -> Self {
        CoinRecord {
            coin,
            confirmed_block_index,
            spent_block_index: 0,
            coinbase,
            timestamp,
        }
    }

    pub fn spent(&self) -> bool {
        self.spent_block_index > 0
    }

    pub fn name(&self) -> Bytes32 {
        self.coin.coin_id()
    }
}
