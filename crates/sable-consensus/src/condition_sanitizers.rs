use crate::sanitize_int::{sanitize_uint, SanitizedUint};
use crate::validation_error::{atom, ErrorCode, ValidationErr};
use clvmr::allocator::{Allocator, NodePtr};

pub const MAX_MESSAGE_LENGTH: usize = 1024;

/// A hash argument must be an atom of exactly `size` bytes.
pub fn sanitize_hash(
    a: &Allocator,
    n: NodePtr,
    size: usize,
    code: ErrorCode,
) -> Result<NodePtr, ValidationErr> {
    let buf = atom(a, n, code)?;

    if buf.as_ref().len() == size {
        Ok(n)
    } else {
        Err(ValidationErr(n, code))
    }
}

/// Amounts are unsigned 64-bit values in canonical encoding.
pub fn parse_amount(a: &Allocator, n: NodePtr, code: ErrorCode) -> Result<u64, ValidationErr> {
    match sanitize_uint(a, n, 8, code)? {
        SanitizedUint::NegativeOverflow | SanitizedUint::PositiveOverflow => {
            Err(ValidationErr(n, code))
        }
        SanitizedUint::Ok(r) => Ok(r),
    }
}

/// Heights are unsigned 32-bit values in canonical encoding. Non-canonical,
/// negative or oversized encodings are malformed conditions.
pub fn parse_height(a: &Allocator, n: NodePtr) -> Result<u32, ValidationErr> {
    match sanitize_uint(a, n, 4, ErrorCode::InvalidCondition)? {
        SanitizedUint::NegativeOverflow | SanitizedUint::PositiveOverflow => {
            Err(ValidationErr(n, ErrorCode::InvalidCondition))
        }
        SanitizedUint::Ok(r) => Ok(r as u32),
    }
}

/// Timestamps are unsigned 64-bit millisecond counts in canonical encoding.
pub fn parse_seconds(a: &Allocator, n: NodePtr) -> Result<u64, ValidationErr> {
    match sanitize_uint(a, n, 8, ErrorCode::InvalidCondition)? {
        SanitizedUint::NegativeOverflow | SanitizedUint::PositiveOverflow => {
            Err(ValidationErr(n, ErrorCode::InvalidCondition))
        }
        SanitizedUint::Ok(r) => Ok(r),
    }
}

/// Announcement messages are length-bounded atoms.
pub fn sanitize_announce_msg(
    a: &Allocator,
    n: NodePtr,
    code: ErrorCode,
) -> Result<NodePtr, ValidationErr> {
    let buf = atom(a, n, code)?;

    if buf.as_ref().len() > MAX_MESSAGE_LENGTH {
        Err(ValidationErr(n, code))
    } else {
        Ok(n)
    }
}
