use sable_consensus::ErrorCode;
use sable_protocol::{Block, Bytes32, CoinRecord};
use std::collections::{BTreeSet, HashMap};

/// The in-memory unspent index: every coin the chain has created, spent or
/// not, with a secondary index by puzzle hash. Mutated only by tip
/// transitions and rollback; admission reads it.
#[derive(Debug, Default, Clone)]
pub struct CoinStore {
    records: HashMap<Bytes32, CoinRecord>,
    by_puzzle_hash: HashMap<Bytes32, BTreeSet<Bytes32>>,
}

impl CoinStore {
    pub fn new() -> CoinStore {
        CoinStore::default()
    }

    pub fn get(&self, coin_id: &Bytes32) -> Option<&CoinRecord> {
        self.records.get(coin_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record a newly-confirmed coin. Re-adding an id that is still live is
    /// an error; re-adding a spent id (a reorg replay) replaces the record.
    pub fn add(&mut self, record: CoinRecord) -> Result<(), ErrorCode> {
        let name = record.name();
        if let Some(existing) = self.records.get(&name) {
            if !existing.spent() {
                return Err(ErrorCode::DuplicateOutput);
            }
        }
        self.by_puzzle_hash
            .entry(record.coin.puzzle_hash)
            .or_default()
            .insert(name);
        self.records.insert(name, record);
        Ok(())
    }

    /// Mark a coin spent at `height`. Idempotent for the same (id, height)
    /// pair.
    pub fn mark_spent(&mut self, coin_id: &Bytes32, height: u32) -> Result<(), ErrorCode> {
        let Some(record) = self.records.get_mut(coin_id) else {
            return Err(ErrorCode::UnknownUnspent);
        };
        if record.spent() {
            if record.spent_block_index == height {
                return Ok(());
            }
            return Err(ErrorCode::DoubleSpend);
        }
        record.spent_block_index = height;
        Ok(())
    }

    /// All records paying to `puzzle_hash`, ordered by coin id.
    pub fn by_puzzle_hash<'a>(
        &'a self,
        puzzle_hash: &Bytes32,
    ) -> impl Iterator<Item = &'a CoinRecord> + 'a {
        self.by_puzzle_hash
            .get(puzzle_hash)
            .into_iter()
            .flatten()
            .filter_map(|id| self.records.get(id))
    }

    /// The lowest height any known coin was confirmed at (wallet sync
    /// anchor).
    pub fn first_confirmed_height(&self) -> Option<u32> {
        self.records
            .values()
            .map(|r| r.confirmed_block_index)
            .min()
    }

    /// Restore the state as of height `h`: coins confirmed later never
    /// existed, coins spent later are unspent again. Equivalent to
    /// replaying every block from genesis up to and including `h`.
    pub fn rollback_to(&mut self, height: u32) {
        let remove: Vec<Bytes32> = self
            .records
            .values()
            .filter(|r| r.confirmed_block_index > height)
            .map(CoinRecord::name)
            .collect();
        for name in remove {
            if let Some(record) = self.records.remove(&name) {
                if let Some(ids) = self.by_puzzle_hash.get_mut(&record.coin.puzzle_hash) {
                    ids.remove(&name);
                    if ids.is_empty() {
                        self.by_puzzle_hash.remove(&record.coin.puzzle_hash);
                    }
                }
            }
        }
        for record in self.records.values_mut() {
            if record.spent_block_index > height {
                record.spent_block_index = 0;
            }
        }
    }

    /// Apply one block's additions (coinbase first) and removals.
    pub fn apply_block(&mut self, block: &Block) -> Result<(), ErrorCode> {
        for (coin, coinbase) in block.all_additions() {
            self.add(CoinRecord::new(*coin, block.height, coinbase, block.timestamp))?;
        }
        for removal in &block.removals {
            self.mark_spent(removal, block.height)?;
        }
        Ok(())
    }
}
