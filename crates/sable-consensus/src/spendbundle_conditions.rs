use crate::allocator::make_allocator;
use crate::npc::Npc;
use crate::run_generator::subtract_cost;
use crate::run_puzzle::run_puzzle;
use crate::runner::ClvmRunner;
use crate::validation_error::ValidationErr;
use sable_protocol::{Bytes32, SpendBundle};
use clvm_utils::tree_hash;
use clvmr::chia_dialect::LIMIT_HEAP;
use clvmr::cost::Cost;

pub struct BundleConditions {
    pub npc_list: Vec<Npc>,
    /// execution cost of all puzzles; condition and byte costs are applied
    /// by the cost accountant
    pub execution_cost: Cost,
}

/// Run every spend of a bundle and classify the emitted conditions, one
/// NPC per spent coin.
pub fn get_conditions_from_spendbundle(
    runner: &dyn ClvmRunner,
    bundle: &SpendBundle,
    max_cost: Cost,
    flags: u32,
) -> Result<BundleConditions, ValidationErr> {
    let mut a = make_allocator(LIMIT_HEAP);
    let mut cost_left = max_cost;
    let mut npc_list = Vec::<Npc>::with_capacity(bundle.coin_spends.len());

    for coin_spend in &bundle.coin_spends {
        let run = run_puzzle(
            runner,
            &mut a,
            coin_spend.puzzle_reveal.as_slice(),
            coin_spend.solution.as_slice(),
            cost_left,
            flags,
        )?;
        subtract_cost(&a, &mut cost_left, run.cost)?;

        npc_list.push(Npc {
            coin_id: coin_spend.coin.coin_id(),
            puzzle_hash: Bytes32::new(tree_hash(&a, run.puzzle).to_bytes()),
            conditions: run.conditions,
        });
    }

    Ok(BundleConditions {
        npc_list,
        execution_cost: max_cost - cost_left,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::MEMPOOL_MODE;
    use crate::opcodes::{AGG_SIG, CREATE_COIN};
    use crate::runner::ReferenceRunner;
    use sable_protocol::{Coin, CoinSpend, Program, Signature};
    use hex_literal::hex;

    #[test]
    fn classifies_each_spend() {
        let test_coin = Coin::new(
            hex!("4444444444444444444444444444444444444444444444444444444444444444").into(),
            hex!("3333333333333333333333333333333333333333333333333333333333333333").into(),
            1,
        );

        // ((50 0x0707...07 "hello"))
        let solution = hex!(
            "ff ff32 ffb0070707070707070707070707070707070707070707070707070707070707070707070707070707070707070707070707 ff8568656c6c6f 80 80"
        )
        .to_vec();

        let spend = CoinSpend::new(
            test_coin,
            Program::from(vec![1_u8]),
            Program::from(solution),
        );
        let bundle = SpendBundle::new(vec![spend], Signature::default());

        let conds =
            get_conditions_from_spendbundle(&ReferenceRunner::new(MEMPOOL_MODE), &bundle, 11_000_000_000, MEMPOOL_MODE)
                .unwrap();

        assert_eq!(conds.npc_list.len(), 1);
        let npc = &conds.npc_list[0];
        assert_eq!(npc.coin_id, test_coin.coin_id());
        assert_eq!(npc.conditions[&AGG_SIG].len(), 1);
        // the identity puzzle's tree hash is the hash of the atom 1, not
        // the coin's puzzle hash; the checker is responsible for comparing
        assert_ne!(npc.puzzle_hash, test_coin.puzzle_hash);
        assert!(conds.execution_cost > 0);
    }

    #[test]
    fn cost_is_shared_across_spends() {
        let coin = Coin::new([1; 32].into(), [2; 32].into(), 1);
        // ((51 0x2222...22 1))
        let solution = hex!(
            "ff ff33 ffa02222222222222222222222222222222222222222222222222222222222222222 ff01 80 80"
        )
        .to_vec();
        let spend = CoinSpend::new(
            coin,
            Program::from(vec![1_u8]),
            Program::from(solution),
        );
        let bundle = SpendBundle::new(vec![spend.clone(), spend], Signature::default());

        let runner = ReferenceRunner::new(MEMPOOL_MODE);
        let two = get_conditions_from_spendbundle(&runner, &bundle, 11_000_000_000, MEMPOOL_MODE)
            .unwrap();
        assert_eq!(two.npc_list.len(), 2);
        assert_eq!(two.npc_list[0].conditions[&CREATE_COIN].len(), 1);

        // a ceiling below the combined execution cost fails
        let err = get_conditions_from_spendbundle(&runner, &bundle, two.execution_cost - 1, MEMPOOL_MODE)
            .unwrap_err();
        assert_eq!(err.1, crate::validation_error::ErrorCode::CostExceeded);
    }
}
