//! Exact algebra over Q(r)
//!
//! Polynomials and rational functions in the recombination fraction with
//! arbitrary-precision rational coefficients, plus the matrix routines the
//! transition solver needs. Nothing in here touches floating point except the
//! explicit `eval_f64` boundaries.

pub mod eigen;
pub mod matrix;
pub mod poly;
pub mod ratfunc;

pub use eigen::{diagonalize, Eigendecomposition};
pub use matrix::{PolynomialMatrix, RationalMatrix};
pub use poly::{rational, Polynomial};
pub use ratfunc::RationalFunction;
