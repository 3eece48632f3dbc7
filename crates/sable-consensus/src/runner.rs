use clvmr::allocator::{Allocator, NodePtr};
use clvmr::chia_dialect::ChiaDialect;
use clvmr::cost::Cost;
use clvmr::reduction::{EvalErr, Reduction};
use clvmr::run_program::run_program;

/// The interpreter seam. Execution must be deterministic, side-effect free
/// and cost-metered; a faster implementation can be swapped in without
/// touching anything else.
pub trait ClvmRunner {
    fn run(
        &self,
        a: &mut Allocator,
        program: NodePtr,
        env: NodePtr,
        max_cost: Cost,
    ) -> Result<Reduction, EvalErr>;
}

/// Reference implementation on top of clvm_rs.
#[derive(Default, Clone, Copy)]
pub struct ReferenceRunner {
    flags: u32,
}

impl ReferenceRunner {
    pub fn new(flags: u32) -> ReferenceRunner {
        ReferenceRunner { flags }
    }
}

impl ClvmRunner for ReferenceRunner {
    fn run(
        &self,
        a: &mut Allocator,
        program: NodePtr,
        env: NodePtr,
        max_cost: Cost,
    ) -> Result<Reduction, EvalErr> {
        let dialect = ChiaDialect::new(self.flags);
        run_program(a, &dialect, program, env, max_cost)
    }
}
