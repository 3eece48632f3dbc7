use crate::consensus_constants::ConsensusConstants;
use crate::npc::Npc;
use crate::opcodes::condition_cost;
use crate::validation_error::ErrorCode;
use clvmr::cost::Cost;

/// Admission cost of every condition in the bundle, before the byte-cost
/// ratio is applied.
pub fn conditions_cost(npc_list: &[Npc]) -> Cost {
    let mut total: Cost = 0;
    for npc in npc_list {
        for (op, conds) in &npc.conditions {
            total = total.saturating_add(condition_cost(*op).saturating_mul(conds.len() as u64));
        }
    }
    total
}

/// The total cost of a bundle:
///
/// execution + (condition costs + serialized size) * cost ratio
///
/// The ratio converts byte size and condition counts into the same unit as
/// program execution cost.
pub fn calculate_cost(
    npc_list: &[Npc],
    execution_cost: Cost,
    serialized_size: u64,
    constants: &ConsensusConstants,
) -> Result<Cost, ErrorCode> {
    let vbytes = conditions_cost(npc_list)
        .checked_add(serialized_size)
        .ok_or(ErrorCode::BlockCostExceedsMax)?;
    let total = vbytes
        .checked_mul(constants.clvm_cost_ratio)
        .and_then(|v| v.checked_add(execution_cost))
        .ok_or(ErrorCode::BlockCostExceedsMax)?;
    if total > constants.max_block_cost {
        return Err(ErrorCode::BlockCostExceedsMax);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{Condition, ConditionsByOpcode};
    use crate::consensus_constants::TEST_CONSTANTS;
    use sable_protocol::Bytes32;

    fn npc_with(conds: &[Condition]) -> Npc {
        let mut by_opcode = ConditionsByOpcode::new();
        for c in conds {
            by_opcode.entry(c.opcode()).or_default().push(c.clone());
        }
        Npc {
            coin_id: Bytes32::default(),
            puzzle_hash: Bytes32::default(),
            conditions: by_opcode,
        }
    }

    #[test]
    fn per_condition_charges() {
        let npc = npc_with(&[
            Condition::CreateCoin(Bytes32::default(), 1),
            Condition::CreateCoin(Bytes32::new([1; 32]), 2),
            Condition::AggSig([0; 48].into(), vec![1].into()),
            Condition::ReserveFee(1),
        ]);
        // 2 * 200 + 20 + 5
        assert_eq!(conditions_cost(&[npc]), 425);
    }

    #[test]
    fn unknown_conditions_are_free() {
        let npc = npc_with(&[Condition::Unknown(0x7f)]);
        assert_eq!(conditions_cost(&[npc]), 0);
    }

    #[test]
    fn total_includes_byte_cost() {
        let npc = npc_with(&[Condition::CreateCoin(Bytes32::default(), 1)]);
        let mut constants = TEST_CONSTANTS;
        constants.clvm_cost_ratio = 3;
        // (200 + 100) * 3 + 17
        assert_eq!(
            calculate_cost(&[npc], 17, 100, &constants).unwrap(),
            917
        );
    }

    #[test]
    fn ceiling_is_enforced() {
        let npc = npc_with(&[Condition::CreateCoin(Bytes32::default(), 1)]);
        let mut constants = TEST_CONSTANTS;
        constants.max_block_cost = 100;
        assert_eq!(
            calculate_cost(&[npc], 0, 0, &constants).unwrap_err(),
            ErrorCode::BlockCostExceedsMax
        );
    }

    #[test]
    fn overflow_is_a_cost_failure() {
        let npc = npc_with(&[Condition::CreateCoin(Bytes32::default(), 1)]);
        let mut constants = TEST_CONSTANTS;
        constants.clvm_cost_ratio = u64::MAX;
        assert_eq!(
            calculate_cost(&[npc], 0, u64::MAX - 100, &constants).unwrap_err(),
            ErrorCode::BlockCostExceedsMax
        );
    }
}
