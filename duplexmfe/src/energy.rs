//! The consumed energy-oracle interfaces.

use super::sequence::RnaSequence;

/// Read access to one interaction partner: the sequence in its internally
/// stored orientation together with its accessibility information.
pub trait Accessibility {
    /// The sequence this view covers.
    fn sequence(&self) -> &RnaSequence;

    /// Maximal length of an interaction window on this sequence.
    fn max_length(&self) -> usize;

    /// Returns `true` if position `i` must stay free of intermolecular
    /// pairing.
    fn is_blocked(&self, i: usize) -> bool;

    /// Free-energy penalty of making the window `[i, j]` accessible
    /// (unpaired) for intermolecular pairing.
    fn ed(&self, i: usize, j: usize) -> f64;

    /// Maps an internal index to the reporting coordinate of the original
    /// transcript orientation. The identity unless the sequence is stored
    /// reversed; the transform is an involution.
    fn reversed_index(&self, k: usize) -> usize {
        k
    }
}

/// The interaction-energy oracle consumed by the predictor. All methods are
/// expected to be pure and cheap; the predictor may evaluate them from
/// several threads at once.
pub trait InteractionEnergy: Sync {
    /// Accessibility view of the first sequence.
    fn accessibility1(&self) -> &dyn Accessibility;

    /// Accessibility view of the second sequence (stored reversed).
    fn accessibility2(&self) -> &dyn Accessibility;

    /// Free energy of the internal loop enclosed by the base pairs
    /// `(i1, i2)` and `(j1, j2)`. The degenerate call with `i1 == j1` and
    /// `i2 == j2` yields the closing-pair contribution. Infeasible loops
    /// evaluate to `f64::INFINITY`.
    fn inter_loop(&self, i1: usize, j1: usize, i2: usize, j2: usize) -> f64;

    /// Dangling-end contribution left of the pair `(i1, i2)`.
    fn dangling_left(&self, i1: usize, i2: usize) -> f64;

    /// Dangling-end contribution right of the pair `(j1, j2)`.
    fn dangling_right(&self, j1: usize, j2: usize) -> f64;

    /// Lower bound (non-positive) on any stacking contribution; used for
    /// pruning only.
    fn best_stacking(&self) -> f64;

    /// Lower bound (non-positive) on the initiation contribution; used for
    /// pruning only.
    fn best_init(&self) -> f64;

    /// Lower bound (non-positive) on any dangling-end contribution; used
    /// for pruning only.
    fn best_dangle(&self) -> f64;

    /// Maximal number of unpaired positions an internal loop may span on
    /// the first sequence.
    fn max_internal_loop_1(&self) -> usize;

    /// Maximal number of unpaired positions an internal loop may span on
    /// the second sequence.
    fn max_internal_loop_2(&self) -> usize;
}
