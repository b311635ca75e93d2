//! `duplexmfe` predicts the single minimum-free-energy interaction site
//! between two RNA sequences under a full dynamic-programming model, without
//! any seed heuristic.
//!
//! The prediction runs over a sparse four-dimensional energy tensor indexed
//! by start positions and window sizes on both sequences: infeasible
//! sub-structures are pruned before any arithmetic, hybridization energies
//! are filled bottom-up, totals add dangling-end and accessibility
//! corrections, and an exact traceback reconstructs the base pairs of the
//! optimum. Thermodynamics are consumed through the
//! [`energy::InteractionEnergy`] oracle; results are delivered to an
//! [`interaction::OutputHandler`] sink.

mod convert;
pub mod energy;
pub mod error;
pub mod interaction;
pub mod models;
pub mod predictor;
pub mod sequence;
pub mod tensor;
