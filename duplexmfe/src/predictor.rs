//! The MFE predictor facade: tensor allocation, the two-pass fill and the
//! traceback reconstructing the base pairs of the optimum.

use super::energy::{Accessibility, InteractionEnergy};
use super::error::{Error, Result};
use super::interaction::{BasePair, IndexRange, Interaction, OutputHandler, LAST_POS};
use super::tensor::{SiteTensor, Slot};
use itertools::iproduct;
use rayon::prelude::*;

/// Running global minimum of the total-energy pass, in internal
/// coordinates.
#[derive(Clone, Copy, Debug)]
struct Mfe {
    energy: f64,
    i1: usize,
    j1: usize,
    i2: usize,
    j2: usize,
}

/// Predictor computing the single minimum-free-energy interaction site of
/// two RNA sequences with a full dynamic-programming model (no seed
/// heuristic).
///
/// The oracle is borrowed read-only, the sink write-only; each successful
/// [`predict`](Self::predict) call hands exactly one interaction to the
/// sink. Successive calls are independent; the energy tensor is rebuilt
/// from scratch on every call and released on the next call or when the
/// predictor is dropped.
pub struct MfePredictor<'a, E, O> {
    energy: &'a E,
    output: &'a mut O,
    tensor: Option<SiteTensor>,
    offset1: usize,
    offset2: usize,
}

impl<'a, E: InteractionEnergy, O: OutputHandler> MfePredictor<'a, E, O> {
    /// Creates a predictor borrowing the energy oracle and the output sink.
    pub fn new(energy: &'a E, output: &'a mut O) -> Self {
        Self {
            energy,
            output,
            tensor: None,
            offset1: 0,
            offset2: 0,
        }
    }

    /// Computes the minimum-free-energy interaction of the two sequence
    /// ranges and reports it to the output sink. When no interaction has
    /// negative free energy, the empty interaction with energy 0 is
    /// reported instead.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidRange`] if a range is not ascending or starts beyond
    /// the end of its sequence; nothing is reported to the sink then.
    pub fn predict(&mut self, r1: IndexRange, r2: IndexRange) -> Result<()> {
        // release the previous round's tensor before building the next one
        self.tensor = None;

        let n1 = dimension(r1, self.energy.accessibility1().sequence().len())?;
        let n2 = dimension(r2, self.energy.accessibility2().sequence().len())?;
        self.offset1 = r1.from;
        self.offset2 = r2.from;

        let tensor = SiteTensor::allocate(self.energy, n1, n2, self.offset1, self.offset2);
        let stats = tensor.stats(
            self.energy.accessibility1().max_length(),
            self.energy.accessibility2().max_length(),
        );
        tracing::debug!(
            total = stats.total,
            unallocated = stats.unallocated,
            infeasible = stats.infeasible,
            fillable = stats.fillable,
            "allocated interaction-site tensor"
        );
        self.tensor = Some(tensor);

        self.fill_hybrid(n1, n2);
        let mfe = self.fill_total(n1, n2);

        let interaction = match mfe {
            Some(mfe) if mfe.energy < 0.0 => self.trace_back(mfe),
            _ => Interaction::empty(),
        };
        self.output.add(interaction);
        Ok(())
    }

    /// Predicts over the full lengths of both sequences.
    ///
    /// # Errors
    ///
    /// See [`predict`](Self::predict).
    pub fn predict_full(&mut self) -> Result<()> {
        self.predict(IndexRange::default(), IndexRange::default())
    }

    /// First round: hybridization energies for every feasible window,
    /// smaller windows first. Within one `(w1, w2)` slice all reads touch
    /// strictly smaller windows, so the per-start computations run in
    /// parallel and are written back in iteration order.
    fn fill_hybrid(&mut self, n1: usize, n2: usize) {
        let lmax1 = self.energy.accessibility1().max_length();
        let lmax2 = self.energy.accessibility2().max_length();

        for (w1, w2) in iproduct!(0..lmax1.min(n1), 0..lmax2.min(n2)) {
            let updates: Vec<((usize, usize), Slot)> = {
                let tensor = self.tensor.as_ref().expect("tensor allocated by predict");
                let energy = self.energy;
                let (offset1, offset2) = (self.offset1, self.offset2);
                iproduct!(0..n1 - w1, 0..n2 - w2)
                    .collect::<Vec<_>>()
                    .into_par_iter()
                    .filter_map(|(i1, i2)| {
                        hybrid_slot(energy, tensor, offset1, offset2, i1, i2, w1, w2)
                            .map(|slot| ((i1, i2), slot))
                    })
                    .collect()
            };

            let tensor = self.tensor.as_mut().expect("tensor allocated by predict");
            for ((i1, i2), slot) in updates {
                tensor.set_slot(i1, i2, w1, w2, slot);
            }
        }
    }

    /// Second round: total energies with dangling-end and accessibility
    /// corrections, tracking the global minimum. Iteration order matches
    /// the first round; ties keep the first candidate seen.
    fn fill_total(&self, n1: usize, n2: usize) -> Option<Mfe> {
        let lmax1 = self.energy.accessibility1().max_length();
        let lmax2 = self.energy.accessibility2().max_length();
        let tensor = self.tensor.as_ref().expect("tensor allocated by predict");

        let mut mfe: Option<Mfe> = None;
        for (w1, w2) in iproduct!(0..lmax1.min(n1), 0..lmax2.min(n2)) {
            for (i1, i2) in iproduct!(0..n1 - w1, 0..n2 - w2) {
                let Some(grid) = tensor.cell(i1, i2) else {
                    continue;
                };
                let hybrid = grid.get(w1, w2).energy();
                if !hybrid.is_finite() {
                    continue;
                }
                let (j1, j2) = (i1 + w1, i2 + w2);
                let total = self.total_energy(hybrid, i1, j1, i2, j2);
                if mfe.is_none_or(|mfe| total < mfe.energy) {
                    mfe = Some(Mfe {
                        energy: total,
                        i1,
                        j1,
                        i2,
                        j2,
                    });
                }
            }
        }
        mfe
    }

    /// Overall energy of the site `(i1, j1, i2, j2)` given its
    /// hybridization energy. Summed left to right; the traceback equality
    /// depends on this exact order.
    fn total_energy(&self, hybrid: f64, i1: usize, j1: usize, i2: usize, j2: usize) -> f64 {
        hybrid
            + self
                .energy
                .dangling_left(i1 + self.offset1, i2 + self.offset2)
            + self
                .energy
                .dangling_right(j1 + self.offset1, j2 + self.offset2)
            + self
                .energy
                .accessibility1()
                .ed(i1 + self.offset1, j1 + self.offset1)
            + self
                .energy
                .accessibility2()
                .ed(i2 + self.offset2, j2 + self.offset2)
    }

    /// Reconstructs the base pairs of the optimum from the filled tensor by
    /// re-deriving the decomposition points from the stored energies.
    // ALLOW: the stored energy is re-derived with the identical float sums,
    // so the comparisons must be exact
    #[allow(clippy::float_cmp)]
    fn trace_back(&self, mfe: Mfe) -> Interaction {
        let tensor = self.tensor.as_ref().expect("tensor allocated by predict");
        let acc2 = self.energy.accessibility2();
        let max_loop_1 = self.energy.max_internal_loop_1();
        let max_loop_2 = self.energy.max_internal_loop_2();
        let Mfe {
            energy: total,
            mut i1,
            j1,
            mut i2,
            j2,
        } = mfe;

        let left = BasePair::new(i1 + self.offset1, acc2.reversed_index(i2 + self.offset2));
        let right = BasePair::new(j1 + self.offset1, acc2.reversed_index(j2 + self.offset2));
        if left.first == right.first {
            // degenerate site of a single base pair
            return Interaction {
                energy: total,
                base_pairs: vec![left],
            };
        }

        let mut base_pairs = vec![left];
        let mut cur = tensor.energy(i1, i2, j1 - i1, j2 - i2);
        loop {
            // the remaining segment may close as one pure internal loop
            if cur
                == self.energy.inter_loop(
                    i1 + self.offset1,
                    j1 + self.offset1,
                    i2 + self.offset2,
                    j2 + self.offset2,
                ) + self.energy.inter_loop(
                    j1 + self.offset1,
                    j1 + self.offset1,
                    j2 + self.offset2,
                    j2 + self.offset2,
                )
            {
                break;
            }

            let mut split = None;
            'search: for k1 in (i1 + 1..=(j1 - 1).min(i1 + max_loop_1 + 1)).rev() {
                for k2 in (i2 + 1..=(j2 - 1).min(i2 + max_loop_2 + 1)).rev() {
                    if tensor.cell(k1, k2).is_none() {
                        continue;
                    }
                    if cur
                        == self.energy.inter_loop(
                            i1 + self.offset1,
                            k1 + self.offset1,
                            i2 + self.offset2,
                            k2 + self.offset2,
                        ) + tensor.energy(k1, k2, j1 - k1, j2 - k2)
                    {
                        split = Some((k1, k2));
                        break 'search;
                    }
                }
            }

            let (k1, k2) = split.expect("stored energy has no matching decomposition");
            base_pairs.push(BasePair::new(
                k1 + self.offset1,
                acc2.reversed_index(k2 + self.offset2),
            ));
            i1 = k1;
            i2 = k2;
            cur = tensor.energy(i1, i2, j1 - i1, j2 - i2);
        }
        base_pairs.push(right);

        let mut interaction = Interaction {
            energy: total,
            base_pairs,
        };
        interaction.sort();
        debug_assert!(interaction.is_valid());
        interaction
    }
}

/// Derives the number of start positions covered by `range` on a sequence
/// of length `len`.
fn dimension(range: IndexRange, len: usize) -> Result<usize> {
    if !range.is_ascending() || range.from >= len {
        return Err(Error::InvalidRange {
            from: range.from,
            to: range.to,
            len,
        });
    }
    let to = if range.to == LAST_POS {
        len - 1
    } else {
        range.to.min(len - 1)
    };
    Ok(len.min(to - range.from + 1))
}

/// Computes the first-round slot for one start position of the `(w1, w2)`
/// slice, or `None` if the slot must stay as the pruner left it.
#[allow(clippy::too_many_arguments)]
fn hybrid_slot<E: InteractionEnergy>(
    energy: &E,
    tensor: &SiteTensor,
    offset1: usize,
    offset2: usize,
    i1: usize,
    i2: usize,
    w1: usize,
    w2: usize,
) -> Option<Slot> {
    // left boundary must be pairable
    let grid = tensor.cell(i1, i2)?;
    let (j1, j2) = (i1 + w1, i2 + w2);
    if tensor.cell(j1, j2).is_none() {
        // right boundary not pairable; collapses any pruner state
        return Some(Slot::Infeasible);
    }
    if grid.get(w1, w2).is_infeasible() {
        return None;
    }

    // full internal loop plus closing-pair contribution
    let mut min_e = energy.inter_loop(i1 + offset1, j1 + offset1, i2 + offset2, j2 + offset2)
        + energy.inter_loop(j1 + offset1, j1 + offset1, j2 + offset2, j2 + offset2);

    if w1 > 1 && w2 > 1 {
        // decompose into (i1,i2)..(k1,k2) plus the stored tail (k1,k2)..(j1,j2)
        let max_loop_1 = energy.max_internal_loop_1();
        let max_loop_2 = energy.max_internal_loop_2();
        for k1 in (i1 + 1..=(j1 - 1).min(i1 + max_loop_1 + 1)).rev() {
            for k2 in (i2 + 1..=(j2 - 1).min(i2 + max_loop_2 + 1)).rev() {
                if tensor.cell(k1, k2).is_none() {
                    continue;
                }
                let candidate = energy.inter_loop(
                    i1 + offset1,
                    k1 + offset1,
                    i2 + offset2,
                    k2 + offset2,
                ) + tensor.energy(k1, k2, j1 - k1, j2 - k2);
                min_e = min_e.min(candidate);
            }
        }
    }

    Some(Slot::Energy(min_e))
}
