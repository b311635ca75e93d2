//! Index ranges, base pairs and predicted interactions.

use serde::{Deserialize, Serialize};

/// Sentinel index meaning "the last valid position of the sequence".
pub const LAST_POS: usize = usize::MAX;

/// A closed index range `[from, to]` on one sequence, in original sequence
/// coordinates. `to == LAST_POS` means "until the last index".
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IndexRange {
    /// First index covered by the range.
    pub from: usize,
    /// Last index covered by the range.
    pub to: usize,
}

impl Default for IndexRange {
    fn default() -> Self {
        Self {
            from: 0,
            to: LAST_POS,
        }
    }
}

impl IndexRange {
    /// Constructor.
    #[must_use]
    pub const fn new(from: usize, to: usize) -> Self {
        Self { from, to }
    }

    /// Returns `true` if `from <= to`.
    #[must_use]
    pub const fn is_ascending(&self) -> bool {
        self.from <= self.to
    }
}

/// One intermolecular base pair in reporting coordinates: `first` indexes
/// the first sequence, `second` the second sequence in its original
/// (unreversed) orientation.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BasePair {
    /// Position on the first sequence.
    pub first: usize,
    /// Position on the second sequence.
    pub second: usize,
}

impl BasePair {
    /// Constructor.
    #[must_use]
    pub const fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }
}

/// A predicted interaction: the overall free energy and the base pairs
/// realizing it, sorted ascending in the first-sequence coordinate. The
/// empty interaction with energy 0 means "no site beats not interacting".
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Interaction {
    /// Overall free energy in kcal/mol.
    pub energy: f64,
    /// The intermolecular base pairs of the site.
    pub base_pairs: Vec<BasePair>,
}

impl Interaction {
    /// The empty interaction.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            energy: 0.0,
            base_pairs: Vec::new(),
        }
    }

    /// Sorts the base pairs ascending in the first-sequence coordinate.
    pub fn sort(&mut self) {
        self.base_pairs.sort_by_key(|bp| bp.first);
    }

    /// Returns `true` if the base pairs strictly increase in the
    /// first-sequence coordinate.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.base_pairs.windows(2).all(|w| w[0].first < w[1].first)
    }
}

/// Sink receiving the finished interaction of a prediction, exactly once
/// per successful call.
pub trait OutputHandler {
    /// Accepts one finished interaction.
    fn add(&mut self, interaction: Interaction);
}

/// Output handler that buffers every reported interaction in order.
#[derive(Clone, Debug, Default)]
pub struct InteractionCollector {
    /// The collected interactions.
    pub interactions: Vec<Interaction>,
}

impl OutputHandler for InteractionCollector {
    fn add(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_is_full() {
        let range = IndexRange::default();
        assert_eq!(range.from, 0);
        assert_eq!(range.to, LAST_POS);
        assert!(range.is_ascending());
    }

    #[test]
    fn descending_range() {
        assert!(!IndexRange::new(3, 2).is_ascending());
        assert!(IndexRange::new(2, 2).is_ascending());
    }

    #[test]
    fn sort_and_validity() {
        let mut interaction = Interaction {
            energy: -1.0,
            base_pairs: vec![BasePair::new(4, 0), BasePair::new(1, 3), BasePair::new(2, 2)],
        };
        assert!(!interaction.is_valid());

        interaction.sort();
        assert!(interaction.is_valid());
        assert_eq!(
            interaction.base_pairs,
            vec![BasePair::new(1, 3), BasePair::new(2, 2), BasePair::new(4, 0)]
        );
    }

    #[test]
    fn empty_interaction() {
        let interaction = Interaction::empty();
        assert_eq!(interaction.energy, 0.0);
        assert!(interaction.base_pairs.is_empty());
        assert!(interaction.is_valid());
    }

    #[test]
    fn collector_buffers_in_order() {
        let mut collector = InteractionCollector::default();
        collector.add(Interaction::empty());
        collector.add(Interaction {
            energy: -2.0,
            base_pairs: vec![BasePair::new(0, 1)],
        });

        assert_eq!(collector.interactions.len(), 2);
        assert_eq!(collector.interactions[0], Interaction::empty());
        assert_eq!(collector.interactions[1].energy, -2.0);
    }
}