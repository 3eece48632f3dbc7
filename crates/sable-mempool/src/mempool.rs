use crate::check_conditions::{check_spend_conditions, SpendingContext};
use crate::coin_store::CoinStore;
use crate::mempool_item::MempoolItem;
use crate::pool::Pool;
use indexmap::{IndexMap, IndexSet};
use sable_consensus::aggsig::{agg_sig_pairs, AggregateVerifier};
use sable_consensus::cost_calculator::calculate_cost;
use sable_consensus::flags::MEMPOOL_MODE;
use sable_consensus::spendbundle_conditions::get_conditions_from_spendbundle;
use sable_consensus::{ClvmRunner, ConsensusConstants, ErrorCode, FeeRate, Npc};
use sable_protocol::streamable::to_bytes;
use sable_protocol::{Block, Bytes32, Coin, CoinRecord, SpendBundle};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::Bound;
use std::sync::Arc;

/// Outcome of a successful admission call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    Added { cost: u64, fee: u64 },
    /// the bundle was already processed; nothing changed
    Duplicate,
}

// a bundle after the pool-independent stages: executed, classified,
// cost-accounted and structurally checked
struct ParsedBundle {
    bundle: Arc<SpendBundle>,
    name: Bytes32,
    npc_list: Vec<Npc>,
    removals: Vec<Coin>,
    additions: Vec<Coin>,
    removal_ids: HashSet<Bytes32>,
    addition_ids: HashSet<Bytes32>,
    announcements: HashSet<Bytes32>,
    cost: u64,
    fee: u64,
}

impl ParsedBundle {
    fn fee_rate(&self) -> FeeRate {
        FeeRate::new(self.fee, self.cost)
    }
}

/// The admission engine: one pool per live tip, the unspent index they
/// validate against, and the retry caches. Single-writer: concurrent
/// callers serialize through an exclusive lock around the whole manager.
pub struct MempoolManager {
    constants: ConsensusConstants,
    runner: Arc<dyn ClvmRunner + Send + Sync>,
    verifier: Arc<dyn AggregateVerifier + Send + Sync>,
    coin_store: CoinStore,
    pools: BTreeMap<Bytes32, Pool>,
    /// names of bundles already processed, FIFO-bounded
    seen: IndexSet<Bytes32>,
    /// bundles rejected for transient reasons, replayed on tip changes
    potential_txs: IndexMap<Bytes32, Arc<SpendBundle>>,
    /// items evicted by tip advances, for the last few heights
    old_mempools: BTreeMap<u32, BTreeMap<Bytes32, MempoolItem>>,
    /// tip of the primary chain the unspent index follows
    peak: Option<(Bytes32, u32)>,
    /// caller-supplied wall clock, milliseconds
    now_ms: u64,
}

impl MempoolManager {
    pub fn new(
        constants: ConsensusConstants,
        runner: Arc<dyn ClvmRunner + Send + Sync>,
        verifier: Arc<dyn AggregateVerifier + Send + Sync>,
    ) -> MempoolManager {
        MempoolManager {
            constants,
            runner,
            verifier,
            coin_store: CoinStore::new(),
            pools: BTreeMap::new(),
            seen: IndexSet::new(),
            potential_txs: IndexMap::new(),
            old_mempools: BTreeMap::new(),
            peak: None,
            now_ms: 0,
        }
    }

    /// Supply the current wall-clock time. The engine never reads a clock
    /// itself.
    pub fn set_now(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn peak(&self) -> Option<(Bytes32, u32)> {
        self.peak
    }

    pub fn coin_store(&self) -> &CoinStore {
        &self.coin_store
    }

    pub fn pools(&self) -> impl Iterator<Item = &Pool> {
        self.pools.values()
    }

    pub fn pool(&self, tip: &Bytes32) -> Option<&Pool> {
        self.pools.get(tip)
    }

    pub fn potential_tx_count(&self) -> usize {
        self.potential_txs.len()
    }

    pub fn has_potential_tx(&self, name: &Bytes32) -> bool {
        self.potential_txs.contains_key(name)
    }

    /// Heights that still have evicted-item snapshots, oldest first.
    pub fn old_mempool_heights(&self) -> Vec<u32> {
        self.old_mempools.keys().copied().collect()
    }

    /// Has this bundle been processed before?
    pub fn seen(&self, name: &Bytes32) -> bool {
        self.seen.contains(name)
    }

    /// Look a bundle up by name in any live pool.
    pub fn get_spend_bundle(&self, name: &Bytes32) -> Option<Arc<SpendBundle>> {
        self.pools
            .values()
            .find_map(|pool| pool.get(name).map(|item| item.spend_bundle.clone()))
    }

    /// Try to admit a bundle into every live pool. Returns the first error
    /// when no pool accepts it; transient failures additionally park the
    /// bundle in the potential-tx cache for replay on the next tip change.
    pub fn add_spend_bundle(&mut self, bundle: SpendBundle) -> Result<AddResult, ErrorCode> {
        let name = bundle.name();
        if self.seen.contains(&name) || self.get_spend_bundle(&name).is_some() {
            log::trace!("bundle {name} already seen");
            return Ok(AddResult::Duplicate);
        }
        let bundle = Arc::new(bundle);
        match self.try_admit(name, bundle, None) {
            Ok((cost, fee)) => {
                self.remember_seen(name);
                log::debug!("admitted bundle {name} cost {cost} fee {fee}");
                Ok(AddResult::Added { cost, fee })
            }
            Err(err) => {
                // transiently-rejected bundles are remembered: they are
                // already parked for retry, resubmitting is a no-op
                if err.is_transient() {
                    self.remember_seen(name);
                }
                log::debug!("rejected bundle {name}: {err:?}");
                Err(err)
            }
        }
    }

    /// Greedy best bundle for one tip: descending fee-per-cost while the
    /// total stays within `max_cost`, ties broken by name.
    pub fn create_bundle_for_tip(&self, tip: &Bytes32, max_cost: u64) -> Option<SpendBundle> {
        let pool = self.pools.get(tip)?;
        let mut cost_sum = 0_u64;
        let mut parts = Vec::<SpendBundle>::new();
        let mut signatures = Vec::new();
        for item in pool.items_by_fee_desc() {
            if cost_sum.saturating_add(item.cost) > max_cost {
                break;
            }
            cost_sum += item.cost;
            signatures.push(item.spend_bundle.aggregated_signature);
            parts.push((*item.spend_bundle).clone());
        }
        let signature = self.verifier.aggregate(&signatures);
        Some(SpendBundle::join(&parts, signature))
    }

    /// `create_bundle_for_tip` against the primary peak.
    pub fn best_bundle(&self, max_cost: u64) -> Option<SpendBundle> {
        let (tip, _) = self.peak?;
        self.create_bundle_for_tip(&tip, max_cost)
    }

    /// Called with the new set of live tips. Pools are kept, advanced or
    /// rebuilt; the unspent index follows the primary chain; evicted items
    /// and parked bundles are replayed.
    pub fn new_tips(&mut self, blocks: &[Block]) -> Result<(), ErrorCode> {
        // candidates for seeding rebuilt pools, captured before the pool
        // set changes
        let sibling_items: Vec<(Bytes32, Arc<SpendBundle>)> = self
            .pools
            .values()
            .flat_map(|pool| {
                pool.items()
                    .map(|item| (item.name, item.spend_bundle.clone()))
            })
            .collect();

        let mut new_pools = BTreeMap::<Bytes32, Pool>::new();
        let mut rebuilt = Vec::<(Bytes32, u32)>::new();

        for block in blocks {
            let extends_peak = match &self.peak {
                None => true,
                Some((hash, _)) => block.prev_header_hash == *hash,
            };
            if extends_peak {
                self.coin_store.apply_block(block)?;
                self.peak = Some((block.header_hash, block.height));
            }

            if new_pools.contains_key(&block.header_hash) {
                continue;
            }
            if let Some(pool) = self.pools.remove(&block.header_hash) {
                // already tracking this tip
                new_pools.insert(block.header_hash, pool);
            } else if let Some(mut pool) = self.pools.remove(&block.prev_header_hash) {
                log::debug!(
                    "advancing pool {} to tip {} at height {}",
                    pool.header_hash(),
                    block.header_hash,
                    block.height
                );
                self.confirm_block_items(&mut pool, block);
                pool.advance_to(block);
                new_pools.insert(block.header_hash, pool);
            } else {
                log::debug!(
                    "rebuilding pool for tip {} at height {}",
                    block.header_hash,
                    block.height
                );
                let pool = Pool::new(
                    block.header_hash,
                    block.prev_header_hash,
                    block.height,
                    block.timestamp,
                    self.constants.mempool_capacity(),
                );
                rebuilt.push((block.header_hash, block.height));
                new_pools.insert(block.header_hash, pool);
            }
        }

        // pools whose tip is no longer live are dropped here
        self.pools = new_pools;

        // seed rebuilt pools: recently-evicted items for heights above the
        // new tip first (newest first), then items from sibling pools
        for (tip, height) in rebuilt {
            let mut candidates = Vec::<(Bytes32, Arc<SpendBundle>)>::new();
            for (_, items) in self
                .old_mempools
                .range((Bound::Excluded(height), Bound::Unbounded))
                .rev()
            {
                for item in items.values() {
                    candidates.push((item.name, item.spend_bundle.clone()));
                }
            }
            candidates.extend(sibling_items.iter().cloned());

            let mut tried = HashSet::<Bytes32>::new();
            for (name, bundle) in candidates {
                if !tried.insert(name) {
                    continue;
                }
                if self.pools.get(&tip).is_some_and(|p| p.contains(&name)) {
                    continue;
                }
                let _ = self.try_admit(name, bundle, Some(tip));
            }
        }

        self.replay_potential();
        Ok(())
    }

    /// Restore the unspent index to `height`. Pools for stale tips are
    /// dropped on the next `new_tips`.
    pub fn rollback(&mut self, height: u32) {
        log::debug!("rolling back unspent index to height {height}");
        self.coin_store.rollback_to(height);
        if let Some((_, peak_height)) = self.peak {
            if peak_height > height {
                self.peak = None;
            }
        }
    }

    // ---- internals ----

    fn remember_seen(&mut self, name: Bytes32) {
        self.seen.insert(name);
        while self.seen.len() > self.constants.seen_cache_size {
            self.seen.shift_remove_index(0);
        }
    }

    fn add_to_potential(&mut self, name: Bytes32, bundle: Arc<SpendBundle>) {
        self.potential_txs.insert(name, bundle);
        while self.potential_txs.len() > self.constants.potential_cache_size {
            self.potential_txs.shift_remove_index(0);
        }
    }

    /// Re-run every parked bundle against the current pools.
    fn replay_potential(&mut self) {
        if self.pools.is_empty() || self.potential_txs.is_empty() {
            return;
        }
        let pending: Vec<(Bytes32, Arc<SpendBundle>)> = self.potential_txs.drain(..).collect();
        log::debug!("replaying {} potential transactions", pending.len());
        for (name, bundle) in pending {
            let _ = self.try_admit(name, bundle, None);
        }
    }

    /// Admission plus transient-failure routing into the potential cache.
    fn try_admit(
        &mut self,
        name: Bytes32,
        bundle: Arc<SpendBundle>,
        target: Option<Bytes32>,
    ) -> Result<(u64, u64), ErrorCode> {
        match self.add_internal(name, bundle.clone(), target) {
            Ok(result) => {
                self.potential_txs.shift_remove(&name);
                Ok(result)
            }
            Err(err) => {
                if err.is_transient() {
                    self.add_to_potential(name, bundle);
                }
                Err(err)
            }
        }
    }

    fn add_internal(
        &mut self,
        name: Bytes32,
        bundle: Arc<SpendBundle>,
        target: Option<Bytes32>,
    ) -> Result<(u64, u64), ErrorCode> {
        if self.pools.is_empty() {
            return Err(ErrorCode::MempoolNotInitialized);
        }

        let parsed = self.parse_bundle(name, bundle)?;

        let targets: Vec<Bytes32> = match target {
            Some(tip) => vec![tip],
            None => self.pools.keys().copied().collect(),
        };

        let mut errors = Vec::<ErrorCode>::new();
        let mut accepted = Vec::<(Bytes32, Vec<Bytes32>)>::new();
        for tip in targets {
            let Some(pool) = self.pools.get(&tip) else {
                continue;
            };
            match self.check_against_pool(pool, &parsed) {
                Ok(conflicts) => accepted.push((tip, conflicts)),
                Err(err) => errors.push(err),
            }
        }

        if accepted.is_empty() {
            return Err(errors.first().copied().unwrap_or(ErrorCode::Unknown));
        }

        // one batched signature check at the end of admission
        let pairs = agg_sig_pairs(&parsed.npc_list);
        if !self
            .verifier
            .verify_aggregate(&pairs, &parsed.bundle.aggregated_signature)
        {
            return Err(ErrorCode::BadAggregateSignature);
        }

        let mut added = 0_usize;
        let mut commit_errors = Vec::<ErrorCode>::new();
        for (tip, conflicts) in accepted {
            match self.commit_to_pool(tip, &parsed, conflicts) {
                Ok(()) => added += 1,
                Err(err) => commit_errors.push(err),
            }
        }
        if added > 0 {
            Ok((parsed.cost, parsed.fee))
        } else {
            Err(commit_errors.first().copied().unwrap_or(ErrorCode::Unknown))
        }
    }

    /// The pool-independent stages: execute, classify, account cost, check
    /// bundle structure.
    fn parse_bundle(
        &self,
        name: Bytes32,
        bundle: Arc<SpendBundle>,
    ) -> Result<ParsedBundle, ErrorCode> {
        if bundle.coin_spends.is_empty() {
            return Err(ErrorCode::Unknown);
        }

        let conditions = get_conditions_from_spendbundle(
            self.runner.as_ref(),
            &bundle,
            self.constants.max_block_cost,
            MEMPOOL_MODE,
        )
        .map_err(ErrorCode::from)?;

        let serialized = to_bytes(&*bundle).map_err(|_| ErrorCode::InternalEvalError)?;
        let cost = calculate_cost(
            &conditions.npc_list,
            conditions.execution_cost,
            serialized.len() as u64,
            &self.constants,
        )?;
        if cost == 0 {
            return Err(ErrorCode::Unknown);
        }

        let npc_list = conditions.npc_list;
        let removals = bundle.removals();

        // each coin is consumed at most once per bundle
        let mut removal_ids = HashSet::<Bytes32>::with_capacity(npc_list.len());
        for npc in &npc_list {
            if !removal_ids.insert(npc.coin_id) {
                return Err(ErrorCode::DoubleSpend);
            }
        }

        // every puzzle reveal must hash to the puzzle hash of the coin it
        // claims to spend
        for (npc, coin) in npc_list.iter().zip(&removals) {
            if npc.puzzle_hash != coin.puzzle_hash {
                return Err(ErrorCode::WrongPuzzleHash);
            }
        }

        let additions: Vec<Coin> = npc_list.iter().flat_map(Npc::created_coins).collect();
        let mut addition_ids = HashSet::<Bytes32>::with_capacity(additions.len());
        for coin in &additions {
            if coin.amount > self.constants.max_coin_amount {
                return Err(ErrorCode::CoinAmountExceedsMaximum);
            }
            if !addition_ids.insert(coin.coin_id()) {
                return Err(ErrorCode::DuplicateOutput);
            }
        }

        let removed: u128 = removals.iter().map(|c| u128::from(c.amount)).sum();
        let added: u128 = additions.iter().map(|c| u128::from(c.amount)).sum();
        if removed < added {
            return Err(ErrorCode::MintingCoin);
        }
        let fee = u64::try_from(removed - added).unwrap_or(u64::MAX);

        let reserved = npc_list
            .iter()
            .fold(0_u64, |acc, npc| acc.saturating_add(npc.reserve_fee()));
        if reserved > fee {
            return Err(ErrorCode::ReserveFeeConditionFailed);
        }

        let announcements: HashSet<Bytes32> = npc_list
            .iter()
            .flat_map(|npc| npc.announcement_ids())
            .collect();

        Ok(ParsedBundle {
            bundle,
            name,
            npc_list,
            removals,
            additions,
            removal_ids,
            addition_ids,
            announcements,
            cost,
            fee,
        })
    }

    /// All checks that depend on one pool's tip and contents. Returns the
    /// names of lower-fee conflicting items to evict on commit.
    fn check_against_pool(
        &self,
        pool: &Pool,
        parsed: &ParsedBundle,
    ) -> Result<Vec<Bytes32>, ErrorCode> {
        if pool.at_full_capacity(parsed.cost) {
            if parsed.fee == 0 {
                return Err(ErrorCode::InvalidFeeLowFee);
            }
            if let Some(min_rate) = pool.min_fee_rate() {
                if parsed.fee_rate() <= min_rate {
                    return Err(ErrorCode::InvalidFeeLowFee);
                }
            }
        }

        let next_height = u64::from(pool.height()) + 1;
        let mut records = Vec::<CoinRecord>::with_capacity(parsed.npc_list.len());
        let mut conflicts = Vec::<Bytes32>::new();
        let mut conflict_set = HashSet::<Bytes32>::new();

        for (npc, coin) in parsed.npc_list.iter().zip(&parsed.removals) {
            let record = if parsed.addition_ids.contains(&npc.coin_id) {
                // ephemeral: created and consumed within this bundle
                CoinRecord::new(*coin, pool.height() + 1, false, pool.timestamp())
            } else {
                let Some(record) = self.coin_store.get(&npc.coin_id) else {
                    return Err(ErrorCode::UnknownUnspent);
                };
                if record.spent() {
                    return Err(ErrorCode::DoubleSpend);
                }
                if record.coinbase {
                    let thawed = u64::from(record.confirmed_block_index)
                        + u64::from(self.constants.coinbase_freeze_period);
                    if next_height < thawed {
                        return Err(ErrorCode::CoinbaseNotYetSpendable);
                    }
                }
                *record
            };
            if let Some(item_name) = pool.item_spending(&npc.coin_id) {
                if conflict_set.insert(*item_name) {
                    conflicts.push(*item_name);
                }
            }
            records.push(record);
        }

        // a conflict is only survivable if this bundle outbids every
        // incumbent
        if !conflicts.is_empty() {
            let fee_rate = parsed.fee_rate();
            for name in &conflicts {
                if let Some(item) = pool.get(name) {
                    if item.fee_per_cost() >= fee_rate {
                        return Err(ErrorCode::MempoolConflict);
                    }
                }
            }
        }

        for (npc, record) in parsed.npc_list.iter().zip(&records) {
            let ctx = SpendingContext {
                record,
                peak_height: pool.height(),
                now_ms: self.now_ms,
                removal_ids: &parsed.removal_ids,
                announcements: &parsed.announcements,
            };
            check_spend_conditions(npc, &ctx)?;
        }

        Ok(conflicts)
    }

    /// Evict the outbid conflicts, insert the item, and enforce capacity.
    fn commit_to_pool(
        &mut self,
        tip: Bytes32,
        parsed: &ParsedBundle,
        conflicts: Vec<Bytes32>,
    ) -> Result<(), ErrorCode> {
        let mut evicted = Vec::<MempoolItem>::new();
        let mut self_evicted = false;
        {
            let Some(pool) = self.pools.get_mut(&tip) else {
                return Err(ErrorCode::MempoolNotInitialized);
            };
            for name in conflicts {
                if let Some(item) = pool.remove_item(&name) {
                    log::debug!("evicting conflicting item {} from pool {tip}", item.name);
                    evicted.push(item);
                }
            }
            let item = MempoolItem {
                spend_bundle: parsed.bundle.clone(),
                name: parsed.name,
                cost: parsed.cost,
                fee: parsed.fee,
                npc_list: parsed.npc_list.clone(),
                additions: parsed.additions.clone(),
                removals: parsed.removals.clone(),
                admission_height: pool.height(),
            };
            pool.add_item(item);
            while pool.total_cost() > pool.capacity() {
                let Some(lowest) = pool.lowest_item_name() else {
                    break;
                };
                let Some(item) = pool.remove_item(&lowest) else {
                    break;
                };
                if item.name == parsed.name {
                    self_evicted = true;
                } else {
                    log::debug!("evicting item {} from full pool {tip}", item.name);
                    evicted.push(item);
                }
            }
        }

        for item in evicted {
            self.add_to_potential(item.name, item.spend_bundle);
        }
        if self_evicted {
            Err(ErrorCode::InvalidFeeLowFee)
        } else {
            Ok(())
        }
    }

    /// Remove items a new block confirmed (or invalidated) from an
    /// advancing pool and remember them for a window of heights.
    fn confirm_block_items(&mut self, pool: &mut Pool, block: &Block) {
        let mut stale = BTreeSet::<Bytes32>::new();
        for removal in &block.removals {
            if let Some(name) = pool.item_spending(removal) {
                stale.insert(*name);
            }
        }
        for (coin, _) in block.all_additions() {
            if let Some(name) = pool.item_creating(&coin.coin_id()) {
                stale.insert(*name);
            }
        }
        for name in stale {
            if let Some(item) = pool.remove_item(&name) {
                log::debug!("item {} confirmed by block {}", item.name, block.header_hash);
                self.cache_old_item(block.height, item);
            }
        }
    }

    fn cache_old_item(&mut self, height: u32, item: MempoolItem) {
        self.old_mempools
            .entry(height)
            .or_default()
            .insert(item.name, item);
        while self.old_mempools.len() > self.constants.old_mempool_window as usize {
            self.old_mempools.pop_first();
        }
    }
}
