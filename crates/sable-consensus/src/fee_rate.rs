use clvmr::cost::Cost;
use std::cmp::Ordering;

/// Fee per cost as an exact rational. Comparison cross-multiplies in u128,
/// so no precision is lost and no floating point enters admission
/// ordering. `cost` is non-zero for every admitted item (zero-cost bundles
/// are rejected before a rate is ever formed).
#[derive(Debug, Clone, Copy)]
pub struct FeeRate {
    pub fee: u64,
    pub cost: Cost,
}

impl FeeRate {
    pub fn new(fee: u64, cost: Cost) -> FeeRate {
        FeeRate { fee, cost }
    }
}

impl PartialEq for FeeRate {
    fn eq(&self, other: &FeeRate) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for FeeRate {}

impl PartialOrd for FeeRate {
    fn partial_cmp(&self, other: &FeeRate) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FeeRate {
    fn cmp(&self, other: &FeeRate) -> Ordering {
        let lhs = u128::from(self.fee) * u128::from(other.cost);
        let rhs = u128::from(other.fee) * u128::from(self.cost);
        lhs.cmp(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_by_rate() {
        // 10/100 < 5/10
        assert!(FeeRate::new(10, 100) < FeeRate::new(5, 10));
        assert!(FeeRate::new(5, 10) > FeeRate::new(10, 100));
        // 1/2 == 2/4
        assert_eq!(FeeRate::new(1, 2), FeeRate::new(2, 4));
    }

    #[test]
    fn no_overflow_at_the_extremes() {
        let big = FeeRate::new(u64::MAX, 1);
        let small = FeeRate::new(1, u64::MAX);
        assert!(small < big);
        assert_eq!(big.cmp(&big), Ordering::Equal);
    }

    #[test]
    fn zero_fee_sorts_lowest() {
        assert!(FeeRate::new(0, 1) < FeeRate::new(1, u64::MAX));
        assert_eq!(FeeRate::new(0, 1), FeeRate::new(0, 100));
    }
}
