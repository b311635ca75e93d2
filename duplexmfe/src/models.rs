//! Reference implementations of the oracle interfaces.

use super::convert;
use super::energy::{Accessibility, InteractionEnergy};
use super::sequence::RnaSequence;

/// Accessibility view with a flat per-position unpairing cost and an
/// explicit blocked-position set.
#[derive(Clone, Debug)]
pub struct FlatAccessibility {
    sequence: RnaSequence,
    max_length: usize,
    blocked: Vec<bool>,
    ed_per_position: f64,
    reversed: bool,
}

impl FlatAccessibility {
    /// View of `sequence` in its given orientation.
    #[must_use]
    pub fn new(sequence: RnaSequence, max_length: usize) -> Self {
        let len = sequence.len();
        Self {
            sequence,
            max_length,
            blocked: vec![false; len],
            ed_per_position: 0.0,
            reversed: false,
        }
    }

    /// View of `sequence` stored reversed, the convention for the second
    /// interaction partner; reported indices map back to the original
    /// orientation through [`Accessibility::reversed_index`].
    #[must_use]
    pub fn reversed(sequence: RnaSequence, max_length: usize) -> Self {
        let mut accessibility = Self::new(sequence.reversed(), max_length);
        accessibility.reversed = true;
        accessibility
    }

    /// Marks the internal (stored-orientation) position `i` as unavailable
    /// for intermolecular pairing.
    pub fn block(&mut self, i: usize) {
        self.blocked[i] = true;
    }

    /// Sets the unpairing cost charged per window position.
    pub fn set_ed_per_position(&mut self, ed: f64) {
        self.ed_per_position = ed;
    }
}

impl Accessibility for FlatAccessibility {
    fn sequence(&self) -> &RnaSequence {
        &self.sequence
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn is_blocked(&self, i: usize) -> bool {
        self.blocked[i]
    }

    fn ed(&self, i: usize, j: usize) -> f64 {
        self.ed_per_position * convert::f64_from_usize(j - i + 1)
    }

    fn reversed_index(&self, k: usize) -> usize {
        if self.reversed {
            self.sequence.len() - 1 - k
        } else {
            k
        }
    }
}

/// Minimal duplex energy model: a constant stacking contribution for
/// adjacent flanking pairs, a linear penalty per unpaired loop position and
/// a half-stack closing contribution for the degenerate call. Loops wider
/// than the configured caps, and flanking pairs sharing an endpoint, are
/// infeasible.
#[derive(Clone, Debug)]
pub struct BasePairEnergy {
    accessibility1: FlatAccessibility,
    accessibility2: FlatAccessibility,
    stack: f64,
    loop_position: f64,
    dangle: f64,
    init: f64,
    max_loop_1: usize,
    max_loop_2: usize,
}

impl BasePairEnergy {
    /// Model over the two accessibility views with the default parameters
    /// (stack -1.0, +0.25 per unpaired loop position, no dangling
    /// contributions, loop caps of 2).
    #[must_use]
    pub fn new(accessibility1: FlatAccessibility, accessibility2: FlatAccessibility) -> Self {
        Self {
            accessibility1,
            accessibility2,
            stack: -1.0,
            loop_position: 0.25,
            dangle: 0.0,
            init: -1.0,
            max_loop_1: 2,
            max_loop_2: 2,
        }
    }

    /// Sets the maximal number of unpaired loop positions per sequence.
    pub fn set_max_internal_loop(&mut self, size1: usize, size2: usize) {
        self.max_loop_1 = size1;
        self.max_loop_2 = size2;
    }

    /// Sets the constant dangling-end contribution.
    pub fn set_dangle(&mut self, dangle: f64) {
        self.dangle = dangle;
    }
}

impl InteractionEnergy for BasePairEnergy {
    fn accessibility1(&self) -> &dyn Accessibility {
        &self.accessibility1
    }

    fn accessibility2(&self) -> &dyn Accessibility {
        &self.accessibility2
    }

    fn inter_loop(&self, i1: usize, j1: usize, i2: usize, j2: usize) -> f64 {
        if i1 == j1 && i2 == j2 {
            // closing contribution; the recurrence adds it once per flank of
            // the single-pair stub
            return self.stack / 2.0;
        }
        if i1 == j1 || i2 == j2 {
            // flanking pairs sharing an endpoint cannot enclose a loop
            return f64::INFINITY;
        }
        let gap1 = j1 - i1 - 1;
        let gap2 = j2 - i2 - 1;
        if gap1 > self.max_loop_1 || gap2 > self.max_loop_2 {
            return f64::INFINITY;
        }
        self.loop_position
            .mul_add(convert::f64_from_usize(gap1 + gap2), self.stack)
    }

    fn dangling_left(&self, _i1: usize, _i2: usize) -> f64 {
        self.dangle
    }

    fn dangling_right(&self, _j1: usize, _j2: usize) -> f64 {
        self.dangle
    }

    fn best_stacking(&self) -> f64 {
        self.stack
    }

    fn best_init(&self) -> f64 {
        self.init
    }

    fn best_dangle(&self) -> f64 {
        self.dangle.min(0.0)
    }

    fn max_internal_loop_1(&self) -> usize {
        self.max_loop_1
    }

    fn max_internal_loop_2(&self) -> usize {
        self.max_loop_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> BasePairEnergy {
        let acc1 = FlatAccessibility::new(RnaSequence::new("AAAA"), 10);
        let acc2 = FlatAccessibility::reversed(RnaSequence::new("UUUU"), 10);
        BasePairEnergy::new(acc1, acc2)
    }

    #[test]
    fn stacked_pair() {
        let energy = fixture();
        assert_eq!(energy.inter_loop(0, 1, 0, 1), -1.0);
    }

    #[test]
    fn two_gap_loop() {
        let energy = fixture();
        assert_eq!(energy.inter_loop(0, 2, 0, 2), -0.5);
        assert_eq!(energy.inter_loop(1, 3, 1, 3), -0.5);
    }

    #[test]
    fn degenerate_closing() {
        let energy = fixture();
        assert_eq!(energy.inter_loop(3, 3, 3, 3), -0.5);
    }

    #[test]
    fn oversized_loop_is_infeasible() {
        let energy = fixture();
        assert_eq!(energy.inter_loop(0, 4, 0, 1), f64::INFINITY);
        assert_eq!(energy.inter_loop(0, 1, 0, 4), f64::INFINITY);
    }

    #[test]
    fn shared_endpoint_is_infeasible() {
        let energy = fixture();
        assert_eq!(energy.inter_loop(1, 1, 0, 2), f64::INFINITY);
        assert_eq!(energy.inter_loop(0, 2, 1, 1), f64::INFINITY);
    }

    #[test]
    fn flat_ed_is_linear_in_window_length() {
        let mut accessibility = FlatAccessibility::new(RnaSequence::new("ACGU"), 10);
        assert_eq!(accessibility.ed(0, 3), 0.0);

        accessibility.set_ed_per_position(0.5);
        assert_eq!(accessibility.ed(0, 0), 0.5);
        assert_eq!(accessibility.ed(0, 3), 2.0);
        assert_eq!(accessibility.ed(2, 3), 1.0);
    }

    #[test]
    fn reversed_index_maps_to_original_orientation() {
        let accessibility = FlatAccessibility::reversed(RnaSequence::new("ACGU"), 10);
        // internally stored as UGCA
        assert_eq!(accessibility.sequence().base(0), crate::sequence::Base::U);
        assert_eq!(accessibility.reversed_index(0), 3);
        assert_eq!(accessibility.reversed_index(3), 0);

        let unreversed = FlatAccessibility::new(RnaSequence::new("ACGU"), 10);
        assert_eq!(unreversed.reversed_index(1), 1);
    }

    #[test]
    fn blocked_positions() {
        let mut accessibility = FlatAccessibility::new(RnaSequence::new("ACGU"), 10);
        assert!(!accessibility.is_blocked(2));
        accessibility.block(2);
        assert!(accessibility.is_blocked(2));
        assert!(!accessibility.is_blocked(1));
    }
}
