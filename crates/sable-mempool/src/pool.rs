use crate::mempool_item::MempoolItem;
use sable_consensus::FeeRate;
use sable_protocol::{Block, Bytes32};
use std::collections::{BTreeSet, HashMap};

/// The pool of admitted items for one tip. Holds the fee-rate order and
/// the coin-to-item reverse indices; admission policy lives in the
/// manager.
///
/// Invariant: each coin id appears at most once across all items'
/// removals, so `removals` is a plain map.
#[derive(Debug, Clone)]
pub struct Pool {
    header_hash: Bytes32,
    prev_header_hash: Bytes32,
    height: u32,
    timestamp: u64,
    capacity: u64,
    total_cost: u64,
    spends: HashMap<Bytes32, MempoolItem>,
    sorted: BTreeSet<(FeeRate, Bytes32)>,
    removals: HashMap<Bytes32, Bytes32>,
    additions: HashMap<Bytes32, Bytes32>,
}

impl Pool {
    pub fn new(
        header_hash: Bytes32,
        prev_header_hash: Bytes32,
        height: u32,
        timestamp: u64,
        capacity: u64,
    ) -> Pool {
        Pool {
            header_hash,
            prev_header_hash,
            height,
            timestamp,
            capacity,
            total_cost: 0,
            spends: HashMap::new(),
            sorted: BTreeSet::new(),
            removals: HashMap::new(),
            additions: HashMap::new(),
        }
    }

    pub fn header_hash(&self) -> Bytes32 {
        self.header_hash
    }

    pub fn prev_header_hash(&self) -> Bytes32 {
        self.prev_header_hash
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn total_cost(&self) -> u64 {
        self.total_cost
    }

    pub fn len(&self) -> usize {
        self.spends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spends.is_empty()
    }

    pub fn contains(&self, name: &Bytes32) -> bool {
        self.spends.contains_key(name)
    }

    pub fn get(&self, name: &Bytes32) -> Option<&MempoolItem> {
        self.spends.get(name)
    }

    /// The item currently spending `coin_id`, if any.
    pub fn item_spending(&self, coin_id: &Bytes32) -> Option<&Bytes32> {
        self.removals.get(coin_id)
    }

    /// The item currently creating `coin_id`, if any.
    pub fn item_creating(&self, coin_id: &Bytes32) -> Option<&Bytes32> {
        self.additions.get(coin_id)
    }

    /// Would adding `extra_cost` push the pool past its capacity?
    pub fn at_full_capacity(&self, extra_cost: u64) -> bool {
        self.total_cost.saturating_add(extra_cost) > self.capacity
    }

    /// The lowest fee rate among admitted items.
    pub fn min_fee_rate(&self) -> Option<FeeRate> {
        self.sorted.iter().next().map(|(rate, _)| *rate)
    }

    pub fn lowest_item_name(&self) -> Option<Bytes32> {
        self.sorted.iter().next().map(|(_, name)| *name)
    }

    /// Items in descending fee-per-cost order, ties broken by name.
    pub fn items_by_fee_desc(&self) -> impl Iterator<Item = &MempoolItem> + '_ {
        self.sorted
            .iter()
            .rev()
            .filter_map(|(_, name)| self.spends.get(name))
    }

    pub fn items(&self) -> impl Iterator<Item = &MempoolItem> + '_ {
        self.spends.values()
    }

    /// Insert an item. The caller has already resolved conflicts, so every
    /// removal slot must be free.
    pub fn add_item(&mut self, item: MempoolItem) {
        debug_assert!(!self.spends.contains_key(&item.name));
        for coin_id in item.removal_ids() {
            debug_assert!(!self.removals.contains_key(&coin_id));
            self.removals.insert(coin_id, item.name);
        }
        for coin_id in item.addition_ids() {
            self.additions.insert(coin_id, item.name);
        }
        self.sorted.insert((item.fee_per_cost(), item.name));
        self.total_cost += item.cost;
        self.spends.insert(item.name, item);
    }

    pub fn remove_item(&mut self, name: &Bytes32) -> Option<MempoolItem> {
        let item = self.spends.remove(name)?;
        for coin_id in item.removal_ids() {
            self.removals.remove(&coin_id);
        }
        for coin_id in item.addition_ids() {
            self.additions.remove(&coin_id);
        }
        self.sorted.remove(&(item.fee_per_cost(), item.name));
        self.total_cost -= item.cost;
        Some(item)
    }

    /// Re-point this pool at a tip that extends it.
    pub fn advance_to(&mut self, block: &Block) {
        self.prev_header_hash = self.header_hash;
        self.header_hash = block.header_hash;
        self.height = block.height;
        self.timestamp = block.timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_consensus::{ConditionsByOpcode, Npc};
    use sable_protocol::{Coin, Signature, SpendBundle};
    use std::sync::Arc;

    fn item(seed: u8, fee: u64, cost: u64) -> MempoolItem {
        let coin = Coin::new([seed; 32].into(), [0x11; 32].into(), 1000);
        let created = Coin::new(coin.coin_id(), [0x22; 32].into(), 1000 - fee);
        let npc = Npc {
            coin_id: coin.coin_id(),
            puzzle_hash: coin.puzzle_hash,
            conditions: ConditionsByOpcode::new(),
        };
        MempoolItem {
            spend_bundle: Arc::new(SpendBundle::new(vec![], Signature::default())),
            name: [seed; 32].into(),
            cost,
            fee,
            npc_list: vec![npc],
            additions: vec![created],
            removals: vec![coin],
            admission_height: 1,
        }
    }

    fn empty_pool(capacity: u64) -> Pool {
        Pool::new([9; 32].into(), [8; 32].into(), 10, 10_000, capacity)
    }

    #[test]
    fn indices_track_items() {
        let mut pool = empty_pool(10_000);
        let it = item(1, 50, 100);
        let spent = it.removals[0].coin_id();
        let created = it.additions[0].coin_id();
        pool.add_item(it.clone());

        assert!(pool.contains(&it.name));
        assert_eq!(pool.item_spending(&spent), Some(&it.name));
        assert_eq!(pool.item_creating(&created), Some(&it.name));
        assert_eq!(pool.total_cost(), 100);

        let removed = pool.remove_item(&it.name).unwrap();
        assert_eq!(removed.name, it.name);
        assert!(pool.item_spending(&spent).is_none());
        assert!(pool.item_creating(&created).is_none());
        assert_eq!(pool.total_cost(), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn fee_order_descending_with_name_tiebreak() {
        let mut pool = empty_pool(10_000);
        // rates: 2/10, 5/10, 5/10 (tie), 9/10
        pool.add_item(item(1, 2, 10));
        pool.add_item(item(3, 5, 10));
        pool.add_item(item(2, 5, 10));
        pool.add_item(item(4, 9, 10));

        let order: Vec<Bytes32> = pool.items_by_fee_desc().map(|i| i.name).collect();
        assert_eq!(
            order,
            vec![
                [4; 32].into(),
                // tie broken by name, higher name first when descending
                [3; 32].into(),
                [2; 32].into(),
                [1; 32].into(),
            ]
        );
        assert_eq!(pool.min_fee_rate(), Some(FeeRate::new(2, 10)));
        assert_eq!(pool.lowest_item_name(), Some([1; 32].into()));
    }

    #[test]
    fn capacity_accounting() {
        let mut pool = empty_pool(250);
        pool.add_item(item(1, 1, 100));
        assert!(!pool.at_full_capacity(100));
        assert!(pool.at_full_capacity(200));
        pool.add_item(item(2, 1, 100));
        assert!(pool.at_full_capacity(100));
    }

    #[test]
    fn advance_keeps_items() {
        let mut pool = empty_pool(1000);
        pool.add_item(item(1, 5, 10));
        let block = sable_protocol::Block {
            header_hash: [7; 32].into(),
            prev_header_hash: [9; 32].into(),
            height: 11,
            timestamp: 11_000,
            coinbase_additions: vec![],
            additions: vec![],
            removals: vec![],
            generator: None,
        };
        pool.advance_to(&block);
        assert_eq!(pool.header_hash(), [7; 32].into());
        assert_eq!(pool.prev_header_hash(), [9; 32].into());
        assert_eq!(pool.height(), 11);
        assert_eq!(pool.len(), 1);
    }
}
