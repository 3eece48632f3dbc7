use clvmr::allocator::{Allocator, NodePtr, SExp};
use clvmr::cost::Cost;

pub type ConditionOpcode = u8;

// signature obligations. AGG_SIG_ME binds the message to the spent coin's
// ID, AGG_SIG does not.
pub const AGG_SIG_ME: ConditionOpcode = 49;
pub const AGG_SIG: ConditionOpcode = 50;

// the conditions below create or reserve coin amounts and are accounted
// for in output totals
pub const CREATE_COIN: ConditionOpcode = 51;

pub const ASSERT_COIN_CONSUMED: ConditionOpcode = 52;
pub const ASSERT_MY_COIN_ID: ConditionOpcode = 53;

// wall-clock time and block-height guards. The NOW variants are absolute,
// the AGE variants are relative to the spent coin's confirmation.
pub const ASSERT_SECONDS_NOW_EXCEEDS: ConditionOpcode = 54;
pub const ASSERT_HEIGHT_NOW_EXCEEDS: ConditionOpcode = 55;
pub const ASSERT_HEIGHT_AGE_EXCEEDS: ConditionOpcode = 56;

pub const RESERVE_FEE: ConditionOpcode = 57;
pub const ASSERT_SECONDS_AGE_EXCEEDS: ConditionOpcode = 58;

// announcements, for inter-coin communication within a bundle
pub const CREATE_ANNOUNCEMENT: ConditionOpcode = 60;
pub const ASSERT_ANNOUNCEMENT: ConditionOpcode = 61;

// the conditions below let coins inquire about themselves
pub const ASSERT_MY_PARENT_ID: ConditionOpcode = 71;
pub const ASSERT_MY_PUZZLEHASH: ConditionOpcode = 72;
pub const ASSERT_MY_AMOUNT: ConditionOpcode = 73;

// admission cost of a single condition, in the same unit as program
// execution cost (after the byte-cost ratio is applied)
pub const AGG_SIG_COST: Cost = 20;
pub const CREATE_COIN_COST: Cost = 200;
pub const GENERIC_CONDITION_COST: Cost = 5;

/// The admission cost of one occurrence of `op`. Unknown conditions are
/// free, to leave room for soft-forked additions.
pub fn condition_cost(op: ConditionOpcode) -> Cost {
    match op {
        AGG_SIG | AGG_SIG_ME => AGG_SIG_COST,
        CREATE_COIN => CREATE_COIN_COST,
        ASSERT_COIN_CONSUMED | ASSERT_MY_COIN_ID | ASSERT_SECONDS_NOW_EXCEEDS
        | ASSERT_HEIGHT_NOW_EXCEEDS | ASSERT_HEIGHT_AGE_EXCEEDS | RESERVE_FEE
        | ASSERT_SECONDS_AGE_EXCEEDS | CREATE_ANNOUNCEMENT | ASSERT_ANNOUNCEMENT
        | ASSERT_MY_PARENT_ID | ASSERT_MY_PUZZLEHASH | ASSERT_MY_AMOUNT => GENERIC_CONDITION_COST,
        _ => 0,
    }
}

/// Parse a condition opcode. Opcodes are single-byte atoms; anything else
/// (pairs, multi-byte atoms, leading zeros) does not name a condition.
pub fn parse_opcode(a: &Allocator, op: NodePtr) -> Option<ConditionOpcode> {
    let buf = match a.sexp(op) {
        SExp::Atom => a.atom(op),
        SExp::Pair(..) => return None,
    };
    let buf = buf.as_ref();
    if buf.len() != 1 {
        return None;
    }

    match buf[0] {
        AGG_SIG_ME
        | AGG_SIG
        | CREATE_COIN
        | ASSERT_COIN_CONSUMED
        | ASSERT_MY_COIN_ID
        | ASSERT_SECONDS_NOW_EXCEEDS
        | ASSERT_HEIGHT_NOW_EXCEEDS
        | ASSERT_HEIGHT_AGE_EXCEEDS
        | RESERVE_FEE
        | ASSERT_SECONDS_AGE_EXCEEDS
        | CREATE_ANNOUNCEMENT
        | ASSERT_ANNOUNCEMENT
        | ASSERT_MY_PARENT_ID
        | ASSERT_MY_PUZZLEHASH
        | ASSERT_MY_AMOUNT => Some(buf[0]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn opcode_tester(a: &mut Allocator, val: &[u8]) -> Option<ConditionOpcode> {
        let v = a.new_atom(val).unwrap();
        parse_opcode(a, v)
    }

    #[rstest]
    // leading zeros are not allowed, it makes it a different value
    #[case(&[ASSERT_HEIGHT_NOW_EXCEEDS, 0], None)]
    #[case(&[0, ASSERT_HEIGHT_NOW_EXCEEDS], None)]
    #[case(&[0], None)]
    // unassigned bytes
    #[case(&[48], None)]
    #[case(&[59], None)]
    #[case(&[62], None)]
    #[case(&[70], None)]
    #[case(&[74], None)]
    // all condition codes
    #[case(&[AGG_SIG_ME], Some(AGG_SIG_ME))]
    #[case(&[AGG_SIG], Some(AGG_SIG))]
    #[case(&[CREATE_COIN], Some(CREATE_COIN))]
    #[case(&[ASSERT_COIN_CONSUMED], Some(ASSERT_COIN_CONSUMED))]
    #[case(&[ASSERT_MY_COIN_ID], Some(ASSERT_MY_COIN_ID))]
    #[case(&[ASSERT_SECONDS_NOW_EXCEEDS], Some(ASSERT_SECONDS_NOW_EXCEEDS))]
    #[case(&[ASSERT_HEIGHT_NOW_EXCEEDS], Some(ASSERT_HEIGHT_NOW_EXCEEDS))]
    #[case(&[ASSERT_HEIGHT_AGE_EXCEEDS], Some(ASSERT_HEIGHT_AGE_EXCEEDS))]
    #[case(&[RESERVE_FEE], Some(RESERVE_FEE))]
    #[case(&[ASSERT_SECONDS_AGE_EXCEEDS], Some(ASSERT_SECONDS_AGE_EXCEEDS))]
    #[case(&[CREATE_ANNOUNCEMENT], Some(CREATE_ANNOUNCEMENT))]
    #[case(&[ASSERT_ANNOUNCEMENT], Some(ASSERT_ANNOUNCEMENT))]
    #[case(&[ASSERT_MY_PARENT_ID], Some(ASSERT_MY_PARENT_ID))]
    #[case(&[ASSERT_MY_PUZZLEHASH], Some(ASSERT_MY_PUZZLEHASH))]
    #[case(&[ASSERT_MY_AMOUNT], Some(ASSERT_MY_AMOUNT))]
    fn test_parse_opcode(#[case] input: &[u8], #[case] expected: Option<ConditionOpcode>) {
        let mut a = Allocator::new();
        assert_eq!(opcode_tester(&mut a, input), expected);
    }

    #[test]
    fn test_parse_invalid_opcode() {
        // a pair is never a valid condition opcode
        let mut a = Allocator::new();
        let v1 = a.new_atom(&[0]).unwrap();
        let v2 = a.new_atom(&[0]).unwrap();
        let p = a.new_pair(v1, v2).unwrap();
        assert_eq!(parse_opcode(&a, p), None);
    }

    #[test]
    fn test_condition_cost() {
        assert_eq!(condition_cost(AGG_SIG), 20);
        assert_eq!(condition_cost(AGG_SIG_ME), 20);
        assert_eq!(condition_cost(CREATE_COIN), 200);
        assert_eq!(condition_cost(RESERVE_FEE), 5);
        assert_eq!(condition_cost(ASSERT_ANNOUNCEMENT), 5);
        // unknown conditions are free
        assert_eq!(condition_cost(0x7f), 0);
    }
}
