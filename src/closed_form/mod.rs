//! Closed forms in the generation index
//!
//! Builds the state-level transition matrix of a cross design, diagonalizes
//! it exactly and expresses every genotype-class probability as a single
//! expression in (r, k).

pub mod formula;
pub mod reference;
pub mod transition;

pub use formula::{ClosedForm, Term};
pub use reference::{broman_states, broman_unphased};
pub use transition::{ClosedFormSolution, TransitionSystem};
