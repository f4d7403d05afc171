//! Genetics — haplotypes, meiosis, diplotypes and selfing populations
//!
//! Every probability in this module is an exact polynomial in the
//! recombination fraction r.

pub mod diplotype;
pub mod gamete;
pub mod haplotype;
pub mod population;

pub use diplotype::Diplotype;
pub use gamete::{meiosis, Gamete};
pub use haplotype::{GenotypeKey, Haplotype};
pub use population::Population;
