use crate::allocator::make_allocator;
use crate::runner::ClvmRunner;
use crate::validation_error::{atom, check_nil, first, next, rest, ErrorCode, ValidationErr};
use sable_protocol::{Coin, Program};
use clvm_utils::tree_hash;
use clvmr::allocator::{Allocator, NodePtr};
use clvmr::chia_dialect::LIMIT_HEAP;
use clvmr::cost::Cost;
use clvmr::op_utils::u64_from_bytes;
use clvmr::reduction::Reduction;
use clvmr::serde::{node_from_bytes, node_to_bytes};

/// Split one entry of the generator output into
/// (parent-id, puzzle-reveal, amount, solution).
pub fn parse_coin_spend(
    a: &Allocator,
    coin_spend: NodePtr,
) -> Result<(NodePtr, NodePtr, NodePtr, NodePtr), ValidationErr> {
    let parent = first(a, coin_spend)?;
    let coin_spend = rest(a, coin_spend)?;
    let puzzle = first(a, coin_spend)?;
    let coin_spend = rest(a, coin_spend)?;
    let amount = first(a, coin_spend)?;
    let coin_spend = rest(a, coin_spend)?;
    let solution = first(a, coin_spend)?;
    check_nil(a, rest(a, coin_spend)?)?;
    Ok((parent, puzzle, amount, solution))
}

/// Locate one coin's (puzzle, solution) pair in a generator's output list.
/// Parent and amount are compared first to avoid tree-hashing puzzles that
/// cannot match.
pub fn get_puzzle_and_solution_for_coin(
    a: &Allocator,
    generator_output: NodePtr,
    find_coin: &Coin,
) -> Result<(NodePtr, NodePtr), ValidationErr> {
    let mut iter = generator_output;
    while let Some((coin_spend, tail)) = next(a, iter)? {
        iter = tail;
        let (parent, puzzle, amount, solution) = parse_coin_spend(a, coin_spend)?;
        let parent = atom(a, parent, ErrorCode::InvalidParentId)?;
        let amount = u64_from_bytes(atom(a, amount, ErrorCode::InvalidCoinAmount)?.as_ref());

        if parent.as_ref() != find_coin.parent_coin_info.as_ref() || amount != find_coin.amount {
            continue;
        }

        if tree_hash(a, puzzle).to_bytes() != find_coin.puzzle_hash.to_bytes() {
            continue;
        }

        return Ok((puzzle, solution));
    }
    Err(ValidationErr(generator_output, ErrorCode::InvalidCondition))
}

/// Run a generator and extract the serialized (puzzle, solution) pair of
/// one of its spends.
pub fn extract_puzzle_and_solution(
    runner: &dyn ClvmRunner,
    generator: &[u8],
    max_cost: Cost,
    find_coin: &Coin,
) -> Result<(Program, Program), ValidationErr> {
    let mut a = make_allocator(LIMIT_HEAP);
    let program = node_from_bytes(&mut a, generator)
        .map_err(|_| ValidationErr(NodePtr::NIL, ErrorCode::InvalidProgram))?;
    let env = a.nil();
    let Reduction(_cost, output) = runner.run(&mut a, program, env, max_cost)?;

    let (puzzle, solution) = get_puzzle_and_solution_for_coin(&a, output, find_coin)?;
    let puzzle = node_to_bytes(&a, puzzle)
        .map_err(|_| ValidationErr(NodePtr::NIL, ErrorCode::InternalEvalError))?;
    let solution = node_to_bytes(&a, solution)
        .map_err(|_| ValidationErr(NodePtr::NIL, ErrorCode::InternalEvalError))?;
    Ok((Program::from(puzzle), Program::from(solution)))
}
