use clvmr::cost::Cost;

/// Protocol and engine tuning knobs. No environment variables or CLI
/// surface; callers construct (or copy) an instance and hand it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsensusConstants {
    /// Upper bound on any single coin amount.
    pub max_coin_amount: u64,

    /// Blocks after confirmation before a coinbase coin is spendable.
    pub coinbase_freeze_period: u32,

    /// Per-bundle cost ceiling, in execution-cost units.
    pub max_block_cost: Cost,

    /// Integer multiplier converting byte size and condition counts into
    /// execution-cost units.
    pub clvm_cost_ratio: u64,

    /// Sustained transaction throughput the pool is sized for.
    pub tx_per_sec: u64,

    /// Target seconds between transaction blocks.
    pub block_time_target: u64,

    /// Pool capacity as a multiple of block capacity.
    pub mempool_block_buffer: u64,

    /// FIFO bound on bundles parked for retry.
    pub potential_cache_size: usize,

    /// FIFO bound on remembered bundle hashes.
    pub seen_cache_size: usize,

    /// How many past heights of evicted items are kept for reorgs.
    pub old_mempool_window: u32,
}

impl ConsensusConstants {
    /// Total cost the pool may hold.
    pub fn mempool_capacity(&self) -> Cost {
        self.tx_per_sec * self.block_time_target * self.mempool_block_buffer
    }
}

pub const DEFAULT_CONSTANTS: ConsensusConstants = ConsensusConstants {
    max_coin_amount: u64::MAX,
    coinbase_freeze_period: 200,
    max_block_cost: 11_000_000_000,
    clvm_cost_ratio: 108,
    tx_per_sec: 20,
    block_time_target: 300,
    mempool_block_buffer: 10,
    potential_cache_size: 300,
    seen_cache_size: 10_000,
    old_mempool_window: 10,
};

/// Constants for unit tests: same shape, but the cost ratio is 1 so
/// expected costs are easy to state, and bounds are small enough to hit.
pub const TEST_CONSTANTS: ConsensusConstants = ConsensusConstants {
    max_coin_amount: u64::MAX,
    coinbase_freeze_period: 200,
    max_block_cost: 11_000_000_000,
    clvm_cost_ratio: 1,
    tx_per_sec: 20,
    block_time_target: 300,
    mempool_block_buffer: 10,
    potential_cache_size: 300,
    seen_cache_size: 10_000,
    old_mempool_window: 10,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_formula() {
        assert_eq!(DEFAULT_CONSTANTS.mempool_capacity(), 60_000);
        let c = ConsensusConstants {
            tx_per_sec: 2,
            block_time_target: 5,
            mempool_block_buffer: 3,
            ..DEFAULT_CONSTANTS
        };
        assert_eq!(c.mempool_capacity(), 30);
    }
}
