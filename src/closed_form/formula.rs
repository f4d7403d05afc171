//! ClosedForm — Σ coefficient(r) · base(r)^(k − offset)
//!
//! The exponent is the generation index k shifted by the design's offset.
//! Terms are kept normalized (one term per base, no zero coefficients,
//! sorted by base), so two closed forms describing the same function of
//! (r, k) compare equal.

use crate::algebra::{Polynomial, RationalFunction};
use crate::error::{InheritanceError, Result};
use nalgebra::DVector;
use num_rational::BigRational;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;

/// `coefficient · base^(k − offset)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub coefficient: RationalFunction,
    pub base: Polynomial,
}

impl Term {
    pub fn new(coefficient: RationalFunction, base: Polynomial) -> Self {
        Self { coefficient, base }
    }
}

/// An exact expression in the recombination fraction and the generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedForm {
    offset: u32,
    terms: Vec<Term>,
}

impl ClosedForm {
    pub fn new(offset: u32, terms: Vec<Term>) -> Self {
        let mut merged: Vec<Term> = Vec::with_capacity(terms.len());
        for term in terms {
            match merged.iter_mut().find(|t| t.base == term.base) {
                Some(existing) => {
                    existing.coefficient = &existing.coefficient + &term.coefficient
                }
                None => merged.push(term),
            }
        }
        merged.retain(|t| !t.coefficient.is_zero());
        merged.sort_by(|a, b| a.base.cmp(&b.base));
        Self {
            offset,
            terms: merged,
        }
    }

    pub fn zero(offset: u32) -> Self {
        Self {
            offset,
            terms: Vec::new(),
        }
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(&self, factor: &RationalFunction) -> Self {
        Self::new(
            self.offset,
            self.terms
                .iter()
                .map(|t| Term::new(&t.coefficient * factor, t.base.clone()))
                .collect(),
        )
    }

    fn exponent(&self, k: u32) -> Result<u32> {
        k.checked_sub(self.offset)
            .ok_or(InheritanceError::GenerationOutOfRange {
                generation: k,
                first: self.offset,
            })
    }

    /// Exact value at generation `k` as a reduced rational function of r.
    ///
    /// Removable singularities of the individual coefficients cancel here.
    /// The expansion grows with k, so numeric callers use [`Self::evaluate`].
    pub fn at_generation(&self, k: u32) -> Result<RationalFunction> {
        let exponent = self.exponent(k)?;
        Ok(self.terms.iter().fold(RationalFunction::zero(), |acc, t| {
            &acc + &(&t.coefficient * &RationalFunction::from(t.base.pow(exponent)))
        }))
    }

    /// Numeric value at generation `k`, term by term in floating point.
    ///
    /// Near a pole of some coefficient the terms cancel badly, so the value
    /// there comes from the exact expansion at the rational nearest `r`.
    pub fn evaluate(&self, k: u32, r: f64) -> Result<f64> {
        let exponent = self.exponent(k)?;
        let near_pole = self
            .terms
            .iter()
            .any(|t| t.coefficient.denom().eval_f64(r).abs() < POLE_GUARD);
        if near_pole {
            return self.evaluate_exact(k, r);
        }
        Ok(self
            .terms
            .iter()
            .map(|t| t.coefficient.eval_f64(r) * power(t.base.eval_f64(r), exponent))
            .sum())
    }

    fn evaluate_exact(&self, k: u32, r: f64) -> Result<f64> {
        let Some(x) = BigRational::from_float(r) else {
            return Ok(f64::NAN);
        };
        Ok(self
            .at_generation(k)?
            .eval_exact_f64(&x)
            .unwrap_or(f64::NAN))
    }

    /// Values at generation `k` over a whole grid of rates.
    pub fn evaluate_grid(&self, k: u32, rates: &DVector<f64>) -> Result<DVector<f64>> {
        let values = rates
            .iter()
            .map(|&r| self.evaluate(k, r))
            .collect::<Result<Vec<_>>>()?;
        Ok(DVector::from_vec(values))
    }
}

/// Coefficient denominators smaller than this in magnitude count as a pole.
const POLE_GUARD: f64 = 1e-6;

fn power(base: f64, exponent: u32) -> f64 {
    match i32::try_from(exponent) {
        Ok(e) => base.powi(e),
        Err(_) => base.powf(f64::from(exponent)),
    }
}

impl Add<&ClosedForm> for &ClosedForm {
    type Output = ClosedForm;

    /// Both operands must share the same offset.
    fn add(self, rhs: &ClosedForm) -> ClosedForm {
        assert_eq!(self.offset, rhs.offset, "closed forms with different offsets");
        ClosedForm::new(
            self.offset,
            self.terms.iter().chain(rhs.terms.iter()).cloned().collect(),
        )
    }
}

impl fmt::Display for ClosedForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, " + ")?;
            }
            write!(f, "[{}]", t.coefficient)?;
            if !t.base.is_one() {
                write!(f, "·({})^(k-{})", t.base, self.offset)?;
            }
        }
        Ok(())
    }
}
