use clvmr::allocator::{Allocator, Atom, NodePtr, SExp};
use clvmr::reduction::EvalErr;
use thiserror::Error;

/// Every way a spend bundle can fail validation or admission. One variant
/// per rejection; variants never nest other errors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCode {
    #[default]
    Unknown,
    InvalidProgram,
    InvalidSolution,
    InvalidCondition,
    UnknownOperator,
    InvalidParentId,
    InvalidPuzzleHash,
    InvalidPublicKey,
    InvalidMessage,
    InvalidCoinAmount,
    WrongPuzzleHash,
    DuplicateOutput,
    DoubleSpend,
    UnknownUnspent,
    BadAggregateSignature,
    CoinAmountExceedsMaximum,
    CoinAmountNegative,
    MintingCoin,
    ReserveFeeConditionFailed,
    AssertMyCoinIdFailed,
    AssertCoinConsumedFailed,
    AssertMyParentIdFailed,
    AssertMyPuzzlehashFailed,
    AssertMyAmountFailed,
    AssertAnnouncementFailed,
    AssertHeightNowExceedsFailed,
    AssertHeightAgeExceedsFailed,
    AssertSecondsNowExceedsFailed,
    AssertSecondsAgeExceedsFailed,
    CoinbaseNotYetSpendable,
    InvalidFeeLowFee,
    MempoolConflict,
    MempoolNotInitialized,
    BlockCostExceedsMax,
    CostExceeded,
    InternalEvalError,
}

impl ErrorCode {
    /// Transient rejections may self-heal: the bundle is parked in the
    /// potential-tx cache and replayed on tip transitions. Everything else
    /// is a permanent property of the bundle (or an internal failure) and
    /// is not worth retrying.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            ErrorCode::UnknownUnspent
                | ErrorCode::AssertHeightNowExceedsFailed
                | ErrorCode::AssertHeightAgeExceedsFailed
                | ErrorCode::AssertSecondsNowExceedsFailed
                | ErrorCode::AssertSecondsAgeExceedsFailed
                | ErrorCode::MempoolConflict
                | ErrorCode::InvalidFeeLowFee
        )
    }
}

/// An error raised while evaluating or parsing a program, pointing at the
/// offending node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("validation error: {1:?}")]
pub struct ValidationErr(pub NodePtr, pub ErrorCode);

impl From<EvalErr> for ValidationErr {
    fn from(v: EvalErr) -> Self {
        if v.1 == "cost exceeded" {
            ValidationErr(v.0, ErrorCode::CostExceeded)
        } else {
            ValidationErr(v.0, ErrorCode::InternalEvalError)
        }
    }
}

impl From<ValidationErr> for ErrorCode {
    fn from(v: ValidationErr) -> ErrorCode {
        v.1
    }
}

// Stable numeric codes, used in rejection messages on the peer protocol.
impl From<ErrorCode> for u32 {
    fn from(err: ErrorCode) -> u32 {
        match err {
            ErrorCode::Unknown => 1,
            ErrorCode::InvalidProgram => 2,
            ErrorCode::InvalidSolution => 3,
            ErrorCode::DuplicateOutput => 4,
            ErrorCode::DoubleSpend => 5,
            ErrorCode::UnknownUnspent => 6,
            ErrorCode::BadAggregateSignature => 7,
            ErrorCode::WrongPuzzleHash => 8,
            ErrorCode::InvalidCondition
            | ErrorCode::UnknownOperator
            | ErrorCode::InvalidParentId
            | ErrorCode::InvalidPuzzleHash
            | ErrorCode::InvalidPublicKey
            | ErrorCode::InvalidMessage
            | ErrorCode::InvalidCoinAmount => 10,
            ErrorCode::AssertMyCoinIdFailed => 11,
            ErrorCode::AssertCoinConsumedFailed | ErrorCode::AssertAnnouncementFailed => 12,
            ErrorCode::AssertHeightAgeExceedsFailed => 13,
            ErrorCode::AssertHeightNowExceedsFailed => 14,
            ErrorCode::AssertSecondsNowExceedsFailed => 15,
            ErrorCode::CoinAmountExceedsMaximum => 16,
            ErrorCode::InvalidFeeLowFee => 18,
            ErrorCode::MempoolConflict => 19,
            ErrorCode::MintingCoin => 20,
            ErrorCode::CoinbaseNotYetSpendable => 22,
            ErrorCode::BlockCostExceedsMax | ErrorCode::CostExceeded => 23,
            ErrorCode::ReserveFeeConditionFailed => 48,
            ErrorCode::MempoolNotInitialized => 94,
            ErrorCode::AssertSecondsAgeExceedsFailed => 105,
            ErrorCode::AssertMyParentIdFailed => 114,
            ErrorCode::AssertMyPuzzlehashFailed => 115,
            ErrorCode::AssertMyAmountFailed => 116,
            ErrorCode::InternalEvalError => 117,
            ErrorCode::CoinAmountNegative => 124,
        }
    }
}

// helper functions that fail with ValidationErr

pub fn first(a: &Allocator, n: NodePtr) -> Result<NodePtr, ValidationErr> {
    match a.sexp(n) {
        SExp::Pair(left, _) => Ok(left),
        SExp::Atom => Err(ValidationErr(n, ErrorCode::InvalidCondition)),
    }
}

pub fn rest(a: &Allocator, n: NodePtr) -> Result<NodePtr, ValidationErr> {
    match a.sexp(n) {
        SExp::Pair(_, right) => Ok(right),
        SExp::Atom => Err(ValidationErr(n, ErrorCode::InvalidCondition)),
    }
}

pub fn next(a: &Allocator, n: NodePtr) -> Result<Option<(NodePtr, NodePtr)>, ValidationErr> {
    match a.sexp(n) {
        SExp::Pair(left, right) => Ok(Some((left, right))),
        SExp::Atom => {
            // this is expected to be a valid list terminator
            if a.atom_len(n) == 0 {
                Ok(None)
            } else {
                Err(ValidationErr(n, ErrorCode::InvalidCondition))
            }
        }
    }
}

pub fn atom(a: &Allocator, n: NodePtr, code: ErrorCode) -> Result<Atom<'_>, ValidationErr> {
    match a.sexp(n) {
        SExp::Atom => Ok(a.atom(n)),
        SExp::Pair(..) => Err(ValidationErr(n, code)),
    }
}

pub fn check_nil(a: &Allocator, n: NodePtr) -> Result<(), ValidationErr> {
    if atom(a, n, ErrorCode::InvalidCondition)?.as_ref().is_empty() {
        Ok(())
    } else {
        Err(ValidationErr(n, ErrorCode::InvalidCondition))
    }
}
