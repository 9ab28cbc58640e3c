// src/accumulator.rs
use rust_decimal::Decimal;
use serde::Serialize;

/// Selects which accumulator value zero checks (and row/column exclusion)
/// read: the combined total, or just one of the two pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ZeroCheck {
    Total,
    Committed,
    NotCommitted,
}

/// The atomic unit of aggregation: worked hours split into committed
/// (finalized timesheet) and not-committed (still editable) pools.
///
/// Both fields only ever hold non-negative sums of real worked hours.
/// Subtraction is only used to remove values that were previously added, so a
/// well-formed accumulator never goes negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HoursAccumulator {
    pub committed: Decimal,
    pub not_committed: Decimal,
}

impl HoursAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add worked hours to the committed or not-committed pool.
    pub fn add(&mut self, hours: Decimal, committed: bool) {
        if committed {
            self.committed += hours;
        } else {
            self.not_committed += hours;
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: &HoursAccumulator) {
        self.committed += other.committed;
        self.not_committed += other.not_committed;
    }

    /// Remove a previously merged accumulator (used when a column is dropped
    /// after the fact and its cells must stop counting towards row totals).
    pub fn unmerge(&mut self, other: &HoursAccumulator) {
        self.committed -= other.committed;
        self.not_committed -= other.not_committed;
    }

    pub fn reset(&mut self) {
        self.committed = Decimal::ZERO;
        self.not_committed = Decimal::ZERO;
    }

    pub fn total(&self) -> Decimal {
        self.committed + self.not_committed
    }

    pub fn has_hours(&self) -> bool {
        !self.total().is_zero()
    }

    /// The value inspected under the given zero-check selector.
    pub fn value_for(&self, check: ZeroCheck) -> Decimal {
        match check {
            ZeroCheck::Total => self.total(),
            ZeroCheck::Committed => self.committed,
            ZeroCheck::NotCommitted => self.not_committed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn add_and_total() {
        let mut acc = HoursAccumulator::new();
        acc.add(dec!(5.0), true);
        acc.add(dec!(3.25), false);
        assert_eq!(acc.committed, dec!(5.0));
        assert_eq!(acc.not_committed, dec!(3.25));
        assert_eq!(acc.total(), dec!(8.25));
        assert!(acc.has_hours());
    }

    #[test]
    fn merge_then_unmerge_restores_original() {
        let mut acc = HoursAccumulator::new();
        acc.add(dec!(2.0), true);
        let mut other = HoursAccumulator::new();
        other.add(dec!(1.5), false);

        acc.merge(&other);
        assert_eq!(acc.total(), dec!(3.5));
        acc.unmerge(&other);
        assert_eq!(acc.committed, dec!(2.0));
        assert_eq!(acc.not_committed, dec!(0.0));
    }

    #[test]
    fn value_for_selects_the_right_pool() {
        let mut acc = HoursAccumulator::new();
        acc.add(dec!(4.0), true);
        assert_eq!(acc.value_for(ZeroCheck::Committed), dec!(4.0));
        assert_eq!(acc.value_for(ZeroCheck::NotCommitted), dec!(0.0));
        assert_eq!(acc.value_for(ZeroCheck::Total), dec!(4.0));
    }

    #[test]
    fn reset_clears_both_pools() {
        let mut acc = HoursAccumulator::new();
        acc.add(dec!(7.0), true);
        acc.add(dec!(1.0), false);
        acc.reset();
        assert!(!acc.has_hours());
        assert_eq!(acc, HoursAccumulator::default());
    }
}
