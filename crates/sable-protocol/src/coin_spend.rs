use crate::coin::Coin;
use crate::program::Program;
use serde::{Deserialize, Serialize};

/// One coin being spent: the coin itself, the puzzle reveal (whose tree
/// hash must equal the coin's puzzle hash) and the solution passed to it.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct CoinSpend {
    pub coin: Coin,
    pub puzzle_reveal: Program,
    pub solution: Program,
}

impl CoinSpend {
    pub fn new(coin: Coin, puzzle_reveal: Program, solution: Program) -> CoinSpend {
        CoinSpend {
            coin,
            puzzle_reveal,
            solution,
        }
    }
}
