use crate::conditions::parse_conditions_list;
use crate::condition_sanitizers::{parse_amount, sanitize_hash};
use crate::get_puzzle_and_solution::parse_coin_spend;
use crate::npc::Npc;
use crate::runner::ClvmRunner;
use crate::validation_error::{next, ErrorCode, ValidationErr};
use sable_protocol::{Bytes32, Coin};
use clvm_utils::tree_hash;
use clvmr::allocator::{Allocator, NodePtr};
use clvmr::cost::Cost;
use clvmr::reduction::Reduction;
use clvmr::serde::node_from_bytes;

pub fn subtract_cost(
    a: &Allocator,
    cost_left: &mut Cost,
    subtract: Cost,
) -> Result<(), ValidationErr> {
    if subtract > *cost_left {
        Err(ValidationErr(a.nil(), ErrorCode::CostExceeded))
    } else {
        *cost_left -= subtract;
        Ok(())
    }
}

pub struct GeneratorRun {
    /// total execution cost: the generator itself plus every puzzle
    pub cost: Cost,
    pub npc_list: Vec<Npc>,
}

// A block generator is run with a nil environment and returns a list of
// spends:
//
// ((parent-coin-id puzzle-reveal amount solution) ...)
//
// Each puzzle-reveal is then executed with its solution; the output of
// those puzzles are condition lists, classified per spend.
pub fn run_generator(
    runner: &dyn ClvmRunner,
    a: &mut Allocator,
    generator: &[u8],
    max_cost: Cost,
    flags: u32,
) -> Result<GeneratorRun, ValidationErr> {
    let program = node_from_bytes(a, generator)
        .map_err(|_| ValidationErr(NodePtr::NIL, ErrorCode::InvalidProgram))?;

    let mut cost_left = max_cost;
    let env = a.nil();
    let Reduction(generator_cost, all_spends) = runner.run(a, program, env, cost_left)?;
    subtract_cost(a, &mut cost_left, generator_cost)?;

    let mut npc_list = Vec::<Npc>::new();
    let mut iter = all_spends;
    while let Some((spend, tail)) = next(a, iter)? {
        iter = tail;
        let (parent, puzzle, amount, solution) = parse_coin_spend(a, spend)?;

        let Reduction(puzzle_cost, output) = runner.run(a, puzzle, solution, cost_left)?;
        subtract_cost(a, &mut cost_left, puzzle_cost)?;

        let conditions = parse_conditions_list(a, output, flags)?;

        let parent = sanitize_hash(a, parent, 32, ErrorCode::InvalidParentId)?;
        let parent = Bytes32::from(a.atom(parent).as_ref());
        let amount = parse_amount(a, amount, ErrorCode::InvalidCoinAmount)?;
        let puzzle_hash = Bytes32::new(tree_hash(a, puzzle).to_bytes());

        npc_list.push(Npc {
            coin_id: Coin::new(parent, puzzle_hash, amount).coin_id(),
            puzzle_hash,
            conditions,
        });
    }

    Ok(GeneratorRun {
        cost: max_cost - cost_left,
        npc_list,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::{MEMPOOL_MODE, NO_UNKNOWN_CONDS};
    use crate::opcodes::CREATE_COIN;
    use crate::runner::ReferenceRunner;
    use clvmr::serde::node_to_bytes;

    fn list(a: &mut Allocator, items: &[NodePtr]) -> NodePtr {
        let mut ret = a.nil();
        for i in items.iter().rev() {
            ret = a.new_pair(*i, ret).unwrap();
        }
        ret
    }

    fn cond(a: &mut Allocator, op: u8, args: &[&[u8]]) -> NodePtr {
        let mut items = vec![a.new_atom(&[op]).unwrap()];
        for arg in args {
            items.push(a.new_atom(arg).unwrap());
        }
        list(a, &items)
    }

    // generator: (q . ((parent 1 amount solution) ...)) where the identity
    // puzzle forwards each solution as the condition list
    fn generator_with_conditions(a: &mut Allocator, conditions: &[NodePtr]) -> Vec<u8> {
        let parent = a.new_atom(&[0xab; 32]).unwrap();
        let puzzle = a.one();
        let amount = a.new_atom(&[0x64]).unwrap();
        let solution = list(a, conditions);
        let spend = list(a, &[parent, puzzle, amount, solution]);
        let spends = list(a, &[spend]);
        let quote = a.one();
        let program = a.new_pair(quote, spends).unwrap();
        node_to_bytes(a, program).unwrap()
    }

    #[test]
    fn single_spend_generator() {
        let mut a = Allocator::new();
        let c = cond(&mut a, CREATE_COIN, &[&[0x33; 32], &[0x2a]]);
        let generator = generator_with_conditions(&mut a, &[c]);

        let runner = ReferenceRunner::new(MEMPOOL_MODE);
        let mut a = Allocator::new();
        let run = run_generator(&runner, &mut a, &generator, 11_000_000_000, MEMPOOL_MODE).unwrap();

        assert!(run.cost > 0);
        assert_eq!(run.npc_list.len(), 1);
        let npc = &run.npc_list[0];
        assert_eq!(npc.conditions[&CREATE_COIN].len(), 1);
        let expected = Coin::new(Bytes32::new([0xab; 32]), npc.puzzle_hash, 100).coin_id();
        assert_eq!(npc.coin_id, expected);
        assert_eq!(
            npc.created_coins(),
            vec![Coin::new(npc.coin_id, Bytes32::new([0x33; 32]), 42)]
        );
    }

    #[test]
    fn strict_mode_rejects_unknown_opcodes() {
        let mut a = Allocator::new();
        let c = cond(&mut a, 0x7f, &[&[1]]);
        let generator = generator_with_conditions(&mut a, &[c]);

        let runner = ReferenceRunner::new(0);
        let mut a = Allocator::new();
        let err = run_generator(&runner, &mut a, &generator, 11_000_000_000, NO_UNKNOWN_CONDS)
            .unwrap_err();
        assert_eq!(err.1, ErrorCode::UnknownOperator);

        // tolerated outside strict mode
        let mut a = Allocator::new();
        let run = run_generator(&runner, &mut a, &generator, 11_000_000_000, 0).unwrap();
        assert_eq!(run.npc_list.len(), 1);
    }

    #[test]
    fn malformed_spend_entry() {
        // (q . ((parent))) is not a valid spend quadruple
        let mut a = Allocator::new();
        let parent = a.new_atom(&[0xab; 32]).unwrap();
        let spend = list(&mut a, &[parent]);
        let spends = list(&mut a, &[spend]);
        let quote = a.one();
        let program = a.new_pair(quote, spends).unwrap();
        let generator = node_to_bytes(&a, program).unwrap();

        let runner = ReferenceRunner::new(0);
        let mut a = Allocator::new();
        let err = run_generator(&runner, &mut a, &generator, 11_000_000_000, 0).unwrap_err();
        assert_eq!(err.1, ErrorCode::InvalidCondition);
    }

    #[test]
    fn generator_cost_is_metered() {
        let mut a = Allocator::new();
        let c = cond(&mut a, CREATE_COIN, &[&[0x33; 32], &[0x2a]]);
        let generator = generator_with_conditions(&mut a, &[c]);

        let runner = ReferenceRunner::new(0);
        let mut a = Allocator::new();
        let err = run_generator(&runner, &mut a, &generator, 1, 0).unwrap_err();
        assert_eq!(err.1, ErrorCode::CostExceeded);
    }
}
