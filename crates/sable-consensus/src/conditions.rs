use crate::condition_sanitizers::{
    parse_amount, parse_height, parse_seconds, sanitize_announce_msg, sanitize_hash,
};
use crate::flags::{NO_UNKNOWN_CONDS, STRICT_ARGS_COUNT};
use crate::opcodes::{
    parse_opcode, ConditionOpcode, AGG_SIG, AGG_SIG_ME, ASSERT_ANNOUNCEMENT, ASSERT_COIN_CONSUMED,
    ASSERT_HEIGHT_AGE_EXCEEDS, ASSERT_HEIGHT_NOW_EXCEEDS, ASSERT_MY_AMOUNT, ASSERT_MY_COIN_ID,
    ASSERT_MY_PARENT_ID, ASSERT_MY_PUZZLEHASH, ASSERT_SECONDS_AGE_EXCEEDS,
    ASSERT_SECONDS_NOW_EXCEEDS, CREATE_ANNOUNCEMENT, CREATE_COIN, RESERVE_FEE,
};
use crate::sanitize_int::{sanitize_uint, SanitizedUint};
use crate::validation_error::{check_nil, first, next, rest, ErrorCode, ValidationErr};
use sable_protocol::{Bytes, Bytes32, PublicKey};
use clvmr::allocator::{Allocator, NodePtr, SExp};
use std::collections::BTreeMap;

// The output of a spend program is a list of conditions:
//
// ((<condition-opcode> <arg1> <arg2>) ...)
//
// Different conditions have different number and types of arguments. The
// classifier parses each entry into a typed `Condition`, grouped by opcode
// with the order of occurrence preserved within each group.

/// A single, fully-sanitized condition emitted by a spend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    // pubkey (48 bytes) and message (<= 1024 bytes)
    AggSig(PublicKey, Bytes),
    // like AggSig, but the verified message is bound to the spent coin's ID
    AggSigMe(PublicKey, Bytes),
    // puzzle hash (32 bytes) and amount of the created coin
    CreateCoin(Bytes32, u64),
    // amount that must be covered by this bundle's fee
    ReserveFee(u64),
    // message (<= 1024 bytes); the announcement ID is
    // sha256(coin_id | message)
    CreateAnnouncement(Bytes),
    // announcement ID (32 bytes)
    AssertAnnouncement(Bytes32),
    // coin ID that must also be spent in this bundle
    AssertCoinConsumed(Bytes32),
    AssertMyCoinId(Bytes32),
    AssertMyParentId(Bytes32),
    AssertMyPuzzlehash(Bytes32),
    AssertMyAmount(u64),
    // wall-clock guards, milliseconds
    AssertSecondsNowExceeds(u64),
    AssertSecondsAgeExceeds(u64),
    // block-height guards
    AssertHeightNowExceeds(u32),
    AssertHeightAgeExceeds(u32),
    // an unrecognized single-byte opcode, tolerated outside strict mode and
    // ignored by the checker
    Unknown(ConditionOpcode),
}

impl Condition {
    pub fn opcode(&self) -> ConditionOpcode {
        match self {
            Condition::AggSig(..) => AGG_SIG,
            Condition::AggSigMe(..) => AGG_SIG_ME,
            Condition::CreateCoin(..) => CREATE_COIN,
            Condition::ReserveFee(..) => RESERVE_FEE,
            Condition::CreateAnnouncement(..) => CREATE_ANNOUNCEMENT,
            Condition::AssertAnnouncement(..) => ASSERT_ANNOUNCEMENT,
            Condition::AssertCoinConsumed(..) => ASSERT_COIN_CONSUMED,
            Condition::AssertMyCoinId(..) => ASSERT_MY_COIN_ID,
            Condition::AssertMyParentId(..) => ASSERT_MY_PARENT_ID,
            Condition::AssertMyPuzzlehash(..) => ASSERT_MY_PUZZLEHASH,
            Condition::AssertMyAmount(..) => ASSERT_MY_AMOUNT,
            Condition::AssertSecondsNowExceeds(..) => ASSERT_SECONDS_NOW_EXCEEDS,
            Condition::AssertSecondsAgeExceeds(..) => ASSERT_SECONDS_AGE_EXCEEDS,
            Condition::AssertHeightNowExceeds(..) => ASSERT_HEIGHT_NOW_EXCEEDS,
            Condition::AssertHeightAgeExceeds(..) => ASSERT_HEIGHT_AGE_EXCEEDS,
            Condition::Unknown(op) => *op,
        }
    }
}

/// Conditions grouped by opcode. Iteration is ascending by opcode byte and
/// preserves emission order within each opcode, which keeps every consumer
/// deterministic.
pub type ConditionsByOpcode = BTreeMap<ConditionOpcode, Vec<Condition>>;

fn owned_hash(a: &Allocator, n: NodePtr) -> Bytes32 {
    // only called on nodes that passed sanitize_hash(32)
    Bytes32::from(a.atom(n).as_ref())
}

fn owned_pubkey(a: &Allocator, n: NodePtr) -> PublicKey {
    PublicKey::from(a.atom(n).as_ref())
}

fn owned_msg(a: &Allocator, n: NodePtr) -> Bytes {
    Bytes::from(a.atom(n).as_ref())
}

fn maybe_check_args_terminator(
    a: &Allocator,
    arg: NodePtr,
    flags: u32,
) -> Result<(), ValidationErr> {
    if (flags & STRICT_ARGS_COUNT) != 0 {
        check_nil(a, rest(a, arg)?)?;
    }
    Ok(())
}

/// Parse the argument list of one condition, `op` already recognized.
pub fn parse_args(
    a: &Allocator,
    mut c: NodePtr,
    op: ConditionOpcode,
    flags: u32,
) -> Result<Condition, ValidationErr> {
    match op {
        AGG_SIG | AGG_SIG_ME => {
            let pubkey = sanitize_hash(a, first(a, c)?, 48, ErrorCode::InvalidPublicKey)?;
            c = rest(a, c)?;
            let message = sanitize_announce_msg(a, first(a, c)?, ErrorCode::InvalidMessage)?;
            // AGG_SIG_* take two parameters
            if (flags & STRICT_ARGS_COUNT) != 0 {
                check_nil(a, rest(a, c)?)?;
            }
            let pubkey = owned_pubkey(a, pubkey);
            let message = owned_msg(a, message);
            if op == AGG_SIG {
                Ok(Condition::AggSig(pubkey, message))
            } else {
                Ok(Condition::AggSigMe(pubkey, message))
            }
        }
        CREATE_COIN => {
            let puzzle_hash = sanitize_hash(a, first(a, c)?, 32, ErrorCode::InvalidPuzzleHash)?;
            c = rest(a, c)?;
            let node = first(a, c)?;
            let amount = match sanitize_uint(a, node, 8, ErrorCode::InvalidCoinAmount)? {
                SanitizedUint::PositiveOverflow => {
                    return Err(ValidationErr(node, ErrorCode::CoinAmountExceedsMaximum));
                }
                SanitizedUint::NegativeOverflow => {
                    return Err(ValidationErr(node, ErrorCode::CoinAmountNegative));
                }
                SanitizedUint::Ok(amount) => amount,
            };
            maybe_check_args_terminator(a, c, flags)?;
            Ok(Condition::CreateCoin(owned_hash(a, puzzle_hash), amount))
        }
        RESERVE_FEE => {
            maybe_check_args_terminator(a, c, flags)?;
            let fee = parse_amount(a, first(a, c)?, ErrorCode::InvalidCondition)?;
            Ok(Condition::ReserveFee(fee))
        }
        CREATE_ANNOUNCEMENT => {
            maybe_check_args_terminator(a, c, flags)?;
            let msg = sanitize_announce_msg(a, first(a, c)?, ErrorCode::InvalidCondition)?;
            Ok(Condition::CreateAnnouncement(owned_msg(a, msg)))
        }
        ASSERT_ANNOUNCEMENT => {
            maybe_check_args_terminator(a, c, flags)?;
            let id = sanitize_hash(a, first(a, c)?, 32, ErrorCode::InvalidCondition)?;
            Ok(Condition::AssertAnnouncement(owned_hash(a, id)))
        }
        ASSERT_COIN_CONSUMED => {
            maybe_check_args_terminator(a, c, flags)?;
            let id = sanitize_hash(a, first(a, c)?, 32, ErrorCode::InvalidCondition)?;
            Ok(Condition::AssertCoinConsumed(owned_hash(a, id)))
        }
        ASSERT_MY_COIN_ID => {
            maybe_check_args_terminator(a, c, flags)?;
            let id = sanitize_hash(a, first(a, c)?, 32, ErrorCode::InvalidCondition)?;
            Ok(Condition::AssertMyCoinId(owned_hash(a, id)))
        }
        ASSERT_MY_PARENT_ID => {
            maybe_check_args_terminator(a, c, flags)?;
            let id = sanitize_hash(a, first(a, c)?, 32, ErrorCode::InvalidCondition)?;
            Ok(Condition::AssertMyParentId(owned_hash(a, id)))
        }
        ASSERT_MY_PUZZLEHASH => {
            maybe_check_args_terminator(a, c, flags)?;
            let id = sanitize_hash(a, first(a, c)?, 32, ErrorCode::InvalidCondition)?;
            Ok(Condition::AssertMyPuzzlehash(owned_hash(a, id)))
        }
        ASSERT_MY_AMOUNT => {
            maybe_check_args_terminator(a, c, flags)?;
            let amount = parse_amount(a, first(a, c)?, ErrorCode::InvalidCondition)?;
            Ok(Condition::AssertMyAmount(amount))
        }
        ASSERT_SECONDS_NOW_EXCEEDS => {
            maybe_check_args_terminator(a, c, flags)?;
            let t = parse_seconds(a, first(a, c)?)?;
            Ok(Condition::AssertSecondsNowExceeds(t))
        }
        ASSERT_SECONDS_AGE_EXCEEDS => {
            maybe_check_args_terminator(a, c, flags)?;
            let dt = parse_seconds(a, first(a, c)?)?;
            Ok(Condition::AssertSecondsAgeExceeds(dt))
        }
        ASSERT_HEIGHT_NOW_EXCEEDS => {
            maybe_check_args_terminator(a, c, flags)?;
            let h = parse_height(a, first(a, c)?)?;
            Ok(Condition::AssertHeightNowExceeds(h))
        }
        ASSERT_HEIGHT_AGE_EXCEEDS => {
            maybe_check_args_terminator(a, c, flags)?;
            let dh = parse_height(a, first(a, c)?)?;
            Ok(Condition::AssertHeightAgeExceeds(dh))
        }
        _ => Err(ValidationErr(c, ErrorCode::UnknownOperator)),
    }
}

/// Parse a spend program's output into conditions grouped by opcode.
///
/// In strict mode (`NO_UNKNOWN_CONDS`) any unrecognized opcode fails the
/// spend. Otherwise unrecognized single-byte opcodes are preserved as
/// `Condition::Unknown` and everything else is dropped, leaving room for
/// soft-forked additions.
pub fn parse_conditions_list(
    a: &Allocator,
    mut iter: NodePtr,
    flags: u32,
) -> Result<ConditionsByOpcode, ValidationErr> {
    let mut ret = ConditionsByOpcode::new();
    while let Some((c, tail)) = next(a, iter)? {
        iter = tail;
        let op_node = first(a, c)?;
        let Some(op) = parse_opcode(a, op_node) else {
            if (flags & NO_UNKNOWN_CONDS) != 0 {
                return Err(ValidationErr(c, ErrorCode::UnknownOperator));
            }
            if let SExp::Atom = a.sexp(op_node) {
                let buf = a.atom(op_node);
                if let [op] = buf.as_ref() {
                    ret.entry(*op).or_default().push(Condition::Unknown(*op));
                }
            }
            continue;
        };
        let cond = parse_args(a, rest(a, c)?, op, flags)?;
        ret.entry(op).or_default().push(cond);
    }
    Ok(ret)
}
