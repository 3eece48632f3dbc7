use crate::bytes::Bytes32;
use crate::coin::Coin;
use crate::program::Program;
use serde::{Deserialize, Serialize};

/// What the consensus layer hands the engine for each block: the expanded
/// removal/addition lists alongside the raw generator. Coinbase additions
/// are kept separate because their records are frozen after confirmation.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct Block {
    pub header_hash: Bytes32,
    pub prev_header_hash: Bytes32,
    pub height: u32,
    /// Block timestamp in milliseconds.
    pub timestamp: u64,
    pub coinbase_additions: Vec<Coin>,
    pub additions: Vec<Coin>,
    pub removals: Vec<Bytes32>,
    pub generator: Option<Program>,
}

impl Block {
    /// All coins this block creates, coinbase first.
    pub fn all_additions(&self) -> impl Iterator<Item = (&Coin, bool)> {
        self.coinbase_additions
            .iter()
            .map(|c| (c, true))
            .chain(self.additions.iter().map(|c| (c, false)))
    }
}
