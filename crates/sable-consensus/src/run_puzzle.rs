use crate::conditions::{parse_conditions_list, ConditionsByOpcode};
use crate::runner::ClvmRunner;
use crate::validation_error::{ErrorCode, ValidationErr};
use clvmr::allocator::{Allocator, NodePtr};
use clvmr::cost::Cost;
use clvmr::reduction::Reduction;
use clvmr::serde::node_from_bytes;

pub struct PuzzleRun {
    /// execution cost of the program itself (condition and byte costs are
    /// accounted separately)
    pub cost: Cost,
    pub conditions: ConditionsByOpcode,
    /// the deserialized puzzle, for tree-hashing by the caller
    pub puzzle: NodePtr,
}

/// Execute one (puzzle, solution) pair and classify its output. For fixed
/// inputs the cost and conditions are bit-identical across runs and
/// platforms; exceeding `max_cost` fails with `CostExceeded`.
pub fn run_puzzle(
    runner: &dyn ClvmRunner,
    a: &mut Allocator,
    puzzle: &[u8],
    solution: &[u8],
    max_cost: Cost,
    flags: u32,
) -> Result<PuzzleRun, ValidationErr> {
    let puzzle = node_from_bytes(a, puzzle)
        .map_err(|_| ValidationErr(NodePtr::NIL, ErrorCode::InvalidProgram))?;
    let solution = node_from_bytes(a, solution)
        .map_err(|_| ValidationErr(NodePtr::NIL, ErrorCode::InvalidSolution))?;

    let Reduction(cost, output) = runner.run(a, puzzle, solution, max_cost)?;
    let conditions = parse_conditions_list(a, output, flags)?;

    Ok(PuzzleRun {
        cost,
        conditions,
        puzzle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::MEMPOOL_MODE;
    use crate::opcodes::CREATE_COIN;
    use crate::runner::ReferenceRunner;
    use hex_literal::hex;

    // the identity puzzle: whatever the solution is, that's the output
    const IDENTITY: &[u8] = &[0x01];

    // ((51 0x2222...22 1)) -- a single CREATE_COIN condition
    const CREATE_COIN_SOLUTION: &[u8] = &hex!(
        "ff ff33 ffa02222222222222222222222222222222222222222222222222222222222222222 ff01 80 80"
    );

    #[test]
    fn identity_puzzle_emits_its_solution() {
        let runner = ReferenceRunner::new(MEMPOOL_MODE);
        let mut a = Allocator::new();
        let run = run_puzzle(
            &runner,
            &mut a,
            IDENTITY,
            CREATE_COIN_SOLUTION,
            11_000_000_000,
            MEMPOOL_MODE,
        )
        .unwrap();
        assert!(run.cost > 0);
        assert_eq!(run.conditions.len(), 1);
        assert_eq!(run.conditions[&CREATE_COIN].len(), 1);
    }

    #[test]
    fn determinism() {
        let runner = ReferenceRunner::new(MEMPOOL_MODE);
        let mut a = Allocator::new();
        let r1 = run_puzzle(
            &runner,
            &mut a,
            IDENTITY,
            CREATE_COIN_SOLUTION,
            11_000_000_000,
            MEMPOOL_MODE,
        )
        .unwrap();
        let mut a = Allocator::new();
        let r2 = run_puzzle(
            &runner,
            &mut a,
            IDENTITY,
            CREATE_COIN_SOLUTION,
            11_000_000_000,
            MEMPOOL_MODE,
        )
        .unwrap();
        assert_eq!(r1.cost, r2.cost);
        assert_eq!(r1.conditions, r2.conditions);
    }

    #[test]
    fn garbage_puzzle_is_invalid_program() {
        let runner = ReferenceRunner::new(0);
        let mut a = Allocator::new();
        let err = run_puzzle(&runner, &mut a, &[0xff], &[0x80], 1_000_000, 0).unwrap_err();
        assert_eq!(err.1, ErrorCode::InvalidProgram);
    }

    #[test]
    fn garbage_solution_is_invalid_solution() {
        let runner = ReferenceRunner::new(0);
        let mut a = Allocator::new();
        let err = run_puzzle(&runner, &mut a, IDENTITY, &[0xff], 1_000_000, 0).unwrap_err();
        assert_eq!(err.1, ErrorCode::InvalidSolution);
    }

    #[test]
    fn cost_ceiling() {
        let runner = ReferenceRunner::new(0);
        let mut a = Allocator::new();
        let err =
            run_puzzle(&runner, &mut a, IDENTITY, CREATE_COIN_SOLUTION, 1, 0).unwrap_err();
        assert_eq!(err.1, ErrorCode::CostExceeded);
    }
}
