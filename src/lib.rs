//! selfing-core — symbolic two-locus genotype probabilities under selfing
//!
//! Tracks diplotype distributions generation by generation as exact
//! expressions in the recombination fraction `r`, collapses genotypes into
//! symmetry states and diagonalizes the state transition matrix to obtain
//! closed forms valid for any generation.

pub mod algebra;
pub mod closed_form;
pub mod error;
pub mod genetics;
pub mod numeric;
pub mod states;
pub mod storage;
pub mod validate;

pub use algebra::{Polynomial, RationalFunction};
pub use closed_form::{ClosedForm, ClosedFormSolution, TransitionSystem};
pub use error::{InheritanceError, Result};
pub use genetics::{Diplotype, GenotypeKey, Haplotype, Population};
pub use states::{CrossDesign, StatePartition};
pub use storage::FormulaStore;
pub use validate::{ValidationConfig, ValidationReport, Validator};
