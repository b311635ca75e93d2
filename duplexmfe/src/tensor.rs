//! The sparse interaction-site energy tensor.
//!
//! The outer grid is indexed by start positions `(i1, i2)`; a cell is `None`
//! whenever the two starting nucleotides cannot form a left-end base pair.
//! Every allocated cell owns a [`WindowGrid`] indexed by window sizes
//! `(w1, w2)` whose slots begin as [`Slot::Unfilled`] unless a pruning rule
//! decides them to be [`Slot::Infeasible`] before any arithmetic.

use super::convert;
use super::energy::{Accessibility, InteractionEnergy};
use super::sequence::RnaSequence;
use itertools::iproduct;
use ndarray::Array2;

/// State of one `(w1, w2)` slot of a [`WindowGrid`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Slot {
    /// Not yet computed by the filler.
    #[default]
    Unfilled,
    /// Pruned; never to be computed. Reads as positive infinity.
    Infeasible,
    /// Hybridization energy of the window.
    Energy(f64),
}

impl Slot {
    /// The energy value of the slot; infeasible and unfilled slots read as
    /// positive infinity.
    #[must_use]
    pub const fn energy(self) -> f64 {
        match self {
            Self::Energy(e) => e,
            Self::Unfilled | Self::Infeasible => f64::INFINITY,
        }
    }

    /// Returns `true` if the slot was pruned.
    #[must_use]
    pub const fn is_infeasible(self) -> bool {
        matches!(self, Self::Infeasible)
    }
}

/// Inner grid of one start cell, indexed by window sizes `(w1, w2)`. The
/// window `(w1, w2)` covers the base pairs `(i1, i2)` and `(i1+w1, i2+w2)`.
#[derive(Clone, Debug)]
pub struct WindowGrid {
    slots: Array2<Slot>,
}

impl WindowGrid {
    fn new(w1max: usize, w2max: usize) -> Self {
        Self {
            slots: Array2::default((w1max, w2max)),
        }
    }

    /// The `(w1max, w2max)` shape of this grid.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.slots.dim()
    }

    /// The slot for window sizes `(w1, w2)`.
    #[must_use]
    pub fn get(&self, w1: usize, w2: usize) -> Slot {
        self.slots[[w1, w2]]
    }

    fn set(&mut self, w1: usize, w2: usize, slot: Slot) {
        self.slots[[w1, w2]] = slot;
    }

    fn infeasible_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_infeasible()).count()
    }
}

/// Allocation statistics of a [`SiteTensor`]; observability only.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Stats {
    /// Slot capacity of the full start grid, allocated or not.
    pub total: usize,
    /// Slots inside start cells that were never allocated.
    pub unallocated: usize,
    /// Allocated slots pruned before any arithmetic.
    pub infeasible: usize,
    /// Allocated slots left for the filler.
    pub fillable: usize,
}

/// The sparse `(start1, start2) -> (width1, width2)` energy tensor.
#[derive(Clone, Debug)]
pub struct SiteTensor {
    cells: Array2<Option<WindowGrid>>,
}

impl SiteTensor {
    /// Builds the tensor for `n1 x n2` start positions at the given sequence
    /// offsets: decides which start cells are allocated and marks the window
    /// slots that no computation can ever improve as infeasible.
    pub fn allocate<E: InteractionEnergy + ?Sized>(
        energy: &E,
        n1: usize,
        n2: usize,
        offset1: usize,
        offset2: usize,
    ) -> Self {
        let acc1 = energy.accessibility1();
        let acc2 = energy.accessibility2();
        let best_stacking = energy.best_stacking();
        let best_init = energy.best_init();
        let best_dangle = energy.best_dangle();
        let max_loop_1 = energy.max_internal_loop_1();
        let max_loop_2 = energy.max_internal_loop_2();

        let mut cells: Array2<Option<WindowGrid>> = Array2::default((n1, n2));

        for (i1, i2) in iproduct!(0..n1, 0..n2) {
            let blocked = acc1.sequence().is_ambiguous(i1 + offset1)
                || acc1.is_blocked(i1 + offset1)
                || acc2.sequence().is_ambiguous(i2 + offset2)
                || acc2.is_blocked(i2 + offset2);
            if blocked
                || !RnaSequence::are_complementary(
                    acc1.sequence(),
                    acc2.sequence(),
                    i1 + offset1,
                    i2 + offset2,
                )
            {
                continue;
            }

            let w1max = acc1.max_length().min(n1 - i1);
            let w2max = acc2.max_length().min(n2 - i2);
            let mut grid = WindowGrid::new(w1max, w2max);

            // descending walk, so every window is decided after all windows
            // that would extend it
            for (w1, w2) in iproduct!((0..w1max).rev(), (0..w2max).rev()) {
                // the loop-size caps bound how far one side can advance per
                // base pair
                let mut prune = 1 + w1 * (max_loop_1 + 1) < w2 || 1 + w2 * (max_loop_2 + 1) < w1;

                if !prune
                    && iproduct!(w1 + 1..w1max, w2 + 1..w2max)
                        .all(|(w1p, w2p)| grid.get(w1p, w2p).is_infeasible())
                {
                    // no feasible extension left; prune if the unpairing
                    // penalties exceed the best possible energy gain
                    let ed = acc1.ed(i1 + offset1, i1 + w1 + offset1)
                        + acc2.ed(i2 + offset2, i2 + w2 + offset2);
                    let gain = convert::f64_from_usize(w1.min(w2))
                        .mul_add(best_stacking, best_init + best_dangle);
                    prune = ed > -gain;
                }

                if prune {
                    grid.set(w1, w2, Slot::Infeasible);
                }
            }

            cells[[i1, i2]] = Some(grid);
        }

        Self { cells }
    }

    /// Number of start positions per dimension.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        self.cells.dim()
    }

    /// The inner grid at `(i1, i2)`, or `None` if the cell cannot form a
    /// left-end base pair.
    #[must_use]
    pub fn cell(&self, i1: usize, i2: usize) -> Option<&WindowGrid> {
        self.cells[[i1, i2]].as_ref()
    }

    /// The hybridization energy stored for the window starting at
    /// `(i1, i2)` with sizes `(w1, w2)`; unallocated cells read as positive
    /// infinity.
    #[must_use]
    pub fn energy(&self, i1: usize, i2: usize, w1: usize, w2: usize) -> f64 {
        self.cell(i1, i2)
            .map_or(f64::INFINITY, |grid| grid.get(w1, w2).energy())
    }

    pub(crate) fn set_slot(&mut self, i1: usize, i2: usize, w1: usize, w2: usize, slot: Slot) {
        let grid = self.cells[[i1, i2]]
            .as_mut()
            .expect("slot write into an unallocated cell");
        grid.set(w1, w2, slot);
    }

    /// Tallies the allocation statistics given the two maximal window
    /// lengths.
    #[must_use]
    pub fn stats(&self, max_length1: usize, max_length2: usize) -> Stats {
        let (n1, n2) = self.cells.dim();
        let mut stats = Stats::default();
        for (i1, i2) in iproduct!(0..n1, 0..n2) {
            let capacity = max_length1.min(n1 - i1) * max_length2.min(n2 - i2);
            stats.total += capacity;
            match &self.cells[[i1, i2]] {
                None => stats.unallocated += capacity,
                Some(grid) => {
                    let infeasible = grid.infeasible_count();
                    stats.infeasible += infeasible;
                    stats.fillable += capacity - infeasible;
                }
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BasePairEnergy, FlatAccessibility};

    fn fixture(seq1: &str, seq2: &str, max_length: usize) -> BasePairEnergy {
        let acc1 = FlatAccessibility::new(RnaSequence::new(seq1), max_length);
        let acc2 = FlatAccessibility::reversed(RnaSequence::new(seq2), max_length);
        BasePairEnergy::new(acc1, acc2)
    }

    #[test]
    fn slot_defaults_and_energy() {
        assert_eq!(Slot::default(), Slot::Unfilled);
        assert_eq!(Slot::Unfilled.energy(), f64::INFINITY);
        assert_eq!(Slot::Infeasible.energy(), f64::INFINITY);
        assert_eq!(Slot::Energy(-1.5).energy(), -1.5);
        assert!(Slot::Infeasible.is_infeasible());
        assert!(!Slot::Energy(f64::INFINITY).is_infeasible());
    }

    #[test]
    fn cells_follow_complementarity() {
        // seq2 is stored reversed as UUCGUU
        let energy = fixture("AAGCAA", "UUGCUU", 10);
        let tensor = SiteTensor::allocate(&energy, 6, 6, 0, 0);

        // A opposite U
        assert!(tensor.cell(0, 0).is_some());
        // G opposite C, C opposite G
        assert!(tensor.cell(2, 2).is_some());
        assert!(tensor.cell(3, 3).is_some());
        // G opposite U wobble
        assert!(tensor.cell(2, 0).is_some());
        // A opposite C and C opposite U cannot pair
        assert!(tensor.cell(0, 2).is_none());
        assert!(tensor.cell(3, 0).is_none());
    }

    #[test]
    fn ambiguous_and_blocked_positions_stay_unallocated() {
        let acc1 = FlatAccessibility::new(RnaSequence::new("ANAA"), 10);
        let mut acc2 = FlatAccessibility::reversed(RnaSequence::new("UUUU"), 10);
        acc2.block(2);
        let energy = BasePairEnergy::new(acc1, acc2);
        let tensor = SiteTensor::allocate(&energy, 4, 4, 0, 0);

        for i2 in 0..4 {
            assert!(tensor.cell(1, i2).is_none());
        }
        for i1 in 0..4 {
            assert!(tensor.cell(i1, 2).is_none());
        }
        assert!(tensor.cell(0, 0).is_some());
        assert!(tensor.cell(3, 3).is_some());
    }

    #[test]
    fn inner_grids_are_clipped_to_remaining_length() {
        let energy = fixture("AAAA", "UUUU", 3);
        let tensor = SiteTensor::allocate(&energy, 4, 4, 0, 0);

        for (i1, i2) in iproduct!(0..4, 0..4) {
            let grid = tensor.cell(i1, i2).unwrap();
            assert_eq!(grid.shape(), (3.min(4 - i1), 3.min(4 - i2)));
        }
    }

    #[test]
    fn geometry_prune_marks_unreachable_windows() {
        let mut energy = fixture("AAAAAAAA", "UUUUUUUU", 8);
        energy.set_max_internal_loop(0, 0);
        let tensor = SiteTensor::allocate(&energy, 8, 8, 0, 0);

        let grid = tensor.cell(0, 0).unwrap();
        // with no unpaired positions allowed, both sides must advance in
        // lockstep
        assert!(grid.get(2, 4).is_infeasible());
        assert!(grid.get(4, 2).is_infeasible());
        assert!(!grid.get(3, 3).is_infeasible());
        assert!(!grid.get(3, 4).is_infeasible());
    }

    #[test]
    fn dominant_ed_penalty_prunes_everything() {
        let acc1 = FlatAccessibility::new(RnaSequence::new("AAAA"), 10);
        let mut acc2 = FlatAccessibility::reversed(RnaSequence::new("UUUU"), 10);
        acc2.set_ed_per_position(100.0);
        let energy = BasePairEnergy::new(acc1, acc2);
        let tensor = SiteTensor::allocate(&energy, 4, 4, 0, 0);

        let stats = tensor.stats(10, 10);
        assert_eq!(stats.fillable, 0);
        assert_eq!(stats.unallocated, 0);
        assert_eq!(stats.infeasible, stats.total);
    }

    #[test]
    fn zero_ed_never_triggers_the_dominance_prune() {
        let energy = fixture("AAAA", "UUUU", 10);
        let tensor = SiteTensor::allocate(&energy, 4, 4, 0, 0);

        for (i1, i2) in iproduct!(0..4, 0..4) {
            let grid = tensor.cell(i1, i2).unwrap();
            let (w1max, w2max) = grid.shape();
            for (w1, w2) in iproduct!(0..w1max, 0..w2max) {
                // loop caps of 2 make geometry the only active rule
                let geometry = 1 + w1 * 3 < w2 || 1 + w2 * 3 < w1;
                assert_eq!(grid.get(w1, w2).is_infeasible(), geometry);
            }
        }
    }

    #[test]
    fn stats_split_the_capacity() {
        let energy = fixture("AAGCAA", "UUGCUU", 4);
        let tensor = SiteTensor::allocate(&energy, 6, 6, 0, 0);

        let stats = tensor.stats(4, 4);
        assert_eq!(
            stats.total,
            iproduct!(0..6usize, 0..6usize)
                .map(|(i1, i2)| 4.min(6 - i1) * 4.min(6 - i2))
                .sum::<usize>()
        );
        assert_eq!(
            stats.total,
            stats.unallocated + stats.infeasible + stats.fillable
        );
        assert!(stats.unallocated > 0);
        assert!(stats.fillable > 0);
    }

    #[test]
    fn offsets_shift_the_allocation_window() {
        // seq2 stored reversed as UUCGUU; with offsets (2, 2) the tensor
        // sees G/C opposite C/G
        let energy = fixture("AAGCAA", "UUGCUU", 10);
        let tensor = SiteTensor::allocate(&energy, 2, 2, 2, 2);

        assert_eq!(tensor.shape(), (2, 2));
        assert!(tensor.cell(0, 0).is_some());
        assert!(tensor.cell(1, 1).is_some());
        assert!(tensor.cell(0, 1).is_none());
        assert!(tensor.cell(1, 0).is_none());
    }
}
