use sable_consensus::{Condition, ErrorCode, Npc};
use sable_protocol::{Bytes32, CoinRecord};
use std::collections::HashSet;

/// Everything one spend's conditions are checked against: the record of
/// the spent coin (synthetic for ephemeral spends), the pool's tip, the
/// caller-supplied clock and the bundle-local sets.
pub struct SpendingContext<'a> {
    pub record: &'a CoinRecord,
    pub peak_height: u32,
    pub now_ms: u64,
    /// every coin id removed by the bundle
    pub removal_ids: &'a HashSet<Bytes32>,
    /// every announcement id created by the bundle
    pub announcements: &'a HashSet<Bytes32>,
}

/// Check every condition of one spend, in deterministic order (ascending
/// opcode, then occurrence), returning the first failure. Effects
/// (create-coin, reserve-fee, announcements, signatures) are validated by
/// the admission pipeline; this covers the assertions.
pub fn check_spend_conditions(npc: &Npc, ctx: &SpendingContext<'_>) -> Result<(), ErrorCode> {
    for conditions in npc.conditions.values() {
        for condition in conditions {
            check_condition(npc, condition, ctx)?;
        }
    }
    Ok(())
}

fn check_condition(
    npc: &Npc,
    condition: &Condition,
    ctx: &SpendingContext<'_>,
) -> Result<(), ErrorCode> {
    // the next block this spend could be included in
    let next_height = u64::from(ctx.peak_height) + 1;
    match condition {
        Condition::AssertCoinConsumed(coin_id) => {
            if !ctx.removal_ids.contains(coin_id) {
                return Err(ErrorCode::AssertCoinConsumedFailed);
            }
        }
        Condition::AssertMyCoinId(coin_id) => {
            if *coin_id != npc.coin_id {
                return Err(ErrorCode::AssertMyCoinIdFailed);
            }
        }
        Condition::AssertMyParentId(parent_id) => {
            if *parent_id != ctx.record.coin.parent_coin_info {
                return Err(ErrorCode::AssertMyParentIdFailed);
            }
        }
        Condition::AssertMyPuzzlehash(puzzle_hash) => {
            if *puzzle_hash != ctx.record.coin.puzzle_hash {
                return Err(ErrorCode::AssertMyPuzzlehashFailed);
            }
        }
        Condition::AssertMyAmount(amount) => {
            if *amount != ctx.record.coin.amount {
                return Err(ErrorCode::AssertMyAmountFailed);
            }
        }
        Condition::AssertHeightNowExceeds(height) => {
            if next_height <= u64::from(*height) {
                return Err(ErrorCode::AssertHeightNowExceedsFailed);
            }
        }
        Condition::AssertHeightAgeExceeds(age) => {
            let unlocked = u64::from(ctx.record.confirmed_block_index) + u64::from(*age);
            if next_height <= unlocked {
                return Err(ErrorCode::AssertHeightAgeExceedsFailed);
            }
        }
        Condition::AssertSecondsNowExceeds(when) => {
            if ctx.now_ms <= *when {
                return Err(ErrorCode::AssertSecondsNowExceedsFailed);
            }
        }
        Condition::AssertSecondsAgeExceeds(age) => {
            match ctx.record.timestamp.checked_add(*age) {
                // an age past the end of time never unlocks
                None => return Err(ErrorCode::AssertSecondsAgeExceedsFailed),
                Some(unlocked) => {
                    if ctx.now_ms <= unlocked {
                        return Err(ErrorCode::AssertSecondsAgeExceedsFailed);
                    }
                }
            }
        }
        Condition::AssertAnnouncement(id) => {
            if !ctx.announcements.contains(id) {
                return Err(ErrorCode::AssertAnnouncementFailed);
            }
        }
        // effects, handled elsewhere in admission
        Condition::AggSig(..)
        | Condition::AggSigMe(..)
        | Condition::CreateCoin(..)
        | Condition::ReserveFee(..)
        | Condition::CreateAnnouncement(..)
        | Condition::Unknown(..) => {}
    }
    Ok(())
}
