//! Numeric bridge — exact expressions evaluated at sampled recombination rates
//!
//! The only place floating point enters the crate. Grids are nalgebra
//! vectors so a whole sweep of rates is evaluated in one call.

use crate::algebra::{Polynomial, RationalFunction};
use nalgebra::DVector;
use serde::{Deserialize, Serialize};

/// Anything that can be evaluated at a numeric recombination fraction.
pub trait RateExpression {
    fn evaluate(&self, r: f64) -> f64;

    /// Vectorized evaluation over a grid of rates.
    fn evaluate_grid(&self, rates: &DVector<f64>) -> DVector<f64> {
        rates.map(|r| self.evaluate(r))
    }
}

impl RateExpression for Polynomial {
    fn evaluate(&self, r: f64) -> f64 {
        self.eval_f64(r)
    }
}

impl RateExpression for RationalFunction {
    fn evaluate(&self, r: f64) -> f64 {
        self.eval_f64(r)
    }
}

/// A labelled exact expression, e.g. one unphased genotype's frequency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateFunction {
    pub label: String,
    pub expression: RationalFunction,
}

impl RateFunction {
    pub fn new(label: impl Into<String>, expression: RationalFunction) -> Self {
        Self {
            label: label.into(),
            expression,
        }
    }
}

impl RateExpression for RateFunction {
    fn evaluate(&self, r: f64) -> f64 {
        self.expression.evaluate(r)
    }
}

/// Haldane's map function: recombination fraction at `morgans` of genetic
/// distance, r = ½(1 − e^(−2M)).
pub fn haldane(morgans: f64) -> f64 {
    0.5 * (1.0 - (-2.0 * morgans).exp())
}

/// Haldane-mapped rates for `steps` equally spaced distances starting at 0 M
/// with spacing `step` Morgans.
pub fn haldane_grid(steps: usize, step: f64) -> DVector<f64> {
    DVector::from_fn(steps, |i, _| haldane(i as f64 * step))
}

/// Largest absolute elementwise difference between two equally long vectors.
pub fn max_abs_difference(a: &DVector<f64>, b: &DVector<f64>) -> f64 {
    (a - b).amax()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::rational;

    #[test]
    fn test_haldane() {
        assert_eq!(haldane(0.0), 0.0);
        assert!((haldane(0.5) - 0.5 * (1.0 - (-1.0f64).exp())).abs() < 1e-15);
        assert!(haldane(0.99) < 0.5);
        assert!((haldane(50.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_grid_is_monotone_and_bounded() {
        let grid = haldane_grid(100, 0.01);
        assert_eq!(grid.len(), 100);
        assert_eq!(grid[0], 0.0);
        for i in 1..grid.len() {
            assert!(grid[i] > grid[i - 1]);
            assert!(grid[i] < 0.5);
        }
    }

    #[test]
    fn test_vectorized_evaluation() {
        // (1 - r)^2 / 2
        let p = Polynomial::linear(rational(1, 1), rational(-1, 1))
            .pow(2)
            .scale(&rational(1, 2));
        let rates = DVector::from_vec(vec![0.0, 0.2, 0.5]);
        let values = p.evaluate_grid(&rates);
        let expected = DVector::from_vec(vec![0.5, 0.32, 0.125]);
        assert!(max_abs_difference(&values, &expected) < 1e-12);

        let f = RateFunction::new("AAAA", RationalFunction::from(p));
        assert_eq!(f.evaluate_grid(&rates), values);
    }
}
