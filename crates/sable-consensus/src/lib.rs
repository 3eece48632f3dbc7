pub mod aggsig;
pub mod allocator;
pub mod condition_sanitizers;
pub mod conditions;
pub mod consensus_constants;
pub mod cost_calculator;
pub mod fee_rate;
pub mod flags;
pub mod get_puzzle_and_solution;
pub mod npc;
pub mod opcodes;
pub mod run_generator;
pub mod run_puzzle;
pub mod runner;
pub mod sanitize_int;
pub mod spendbundle_conditions;
pub mod validation_error;

pub use conditions::{Condition, ConditionsByOpcode};
pub use consensus_constants::{ConsensusConstants, DEFAULT_CONSTANTS, TEST_CONSTANTS};
pub use fee_rate::FeeRate;
pub use npc::Npc;
pub use runner::{ClvmRunner, ReferenceRunner};
pub use validation_error::{ErrorCode, ValidationErr};
