use sable_consensus::{FeeRate, Npc};
use sable_protocol::{Bytes32, Coin, SpendBundle};
use std::sync::Arc;

/// One admitted bundle with everything admission computed about it. The
/// tuple is immutable after admission; re-validation on a new tip goes
/// through full re-admission of the bundle.
#[derive(Debug, Clone)]
pub struct MempoolItem {
    pub spend_bundle: Arc<SpendBundle>,
    /// content address of the bundle
    pub name: Bytes32,
    pub cost: u64,
    pub fee: u64,
    pub npc_list: Vec<Npc>,
    pub additions: Vec<Coin>,
    pub removals: Vec<Coin>,
    pub admission_height: u32,
}

impl MempoolItem {
    pub fn fee_per_cost(&self) -> FeeRate {
        FeeRate::new(self.fee, self.cost)
    }

    /// IDs of the coins this item spends, in spend order.
    pub fn removal_ids(&self) -> impl Iterator<Item = Bytes32> + '_ {
        self.npc_list.iter().map(|npc| npc.coin_id)
    }

    /// IDs of the coins this item creates.
    pub fn addition_ids(&self) -> impl Iterator<Item = Bytes32> + '_ {
        self.additions.iter().map(Coin::coin_id)
    }
}
