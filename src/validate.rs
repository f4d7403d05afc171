//! Validator — closed forms against brute-force generational iteration
//!
//! For every generation in range and every sampled recombination fraction the
//! unphased closed forms are compared with `Population::cycle` results, the
//! state closed forms with numeric powers of the transition matrix, and (for
//! the biparental design) with the published reference formulas. The first
//! discrepancy beyond tolerance aborts with `ValidationMismatch`.

use crate::closed_form::{broman_unphased, ClosedForm, ClosedFormSolution, TransitionSystem};
use crate::error::{InheritanceError, Result};
use crate::numeric::{haldane_grid, max_abs_difference, RateExpression};
use crate::states::CrossDesign;
use log::{debug, info};
use nalgebra::{DVector, RowDVector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Which generations and rates to check, and how strictly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// First generation compared (generation 1 is the founding cross)
    pub first_generation: u32,
    /// Last generation compared, inclusive
    pub last_generation: u32,
    /// Recombination fractions sampled
    pub rates: Vec<f64>,
    /// Largest tolerated absolute difference
    pub tolerance: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            first_generation: 2,
            last_generation: 5,
            rates: haldane_grid(100, 0.01).iter().copied().collect(),
            tolerance: 1e-8,
        }
    }
}

impl ValidationConfig {
    /// Three rates, generations 2 to 4
    pub fn quick() -> Self {
        Self {
            first_generation: 2,
            last_generation: 4,
            rates: vec![0.0, 0.2, 0.5],
            tolerance: 1e-8,
        }
    }

    /// 0–299 cM Haldane grid plus r = 0.5, generations 2 to 6
    pub fn thorough() -> Self {
        let mut rates: Vec<f64> = haldane_grid(300, 0.01).iter().copied().collect();
        rates.push(0.5);
        Self {
            first_generation: 2,
            last_generation: 6,
            rates,
            tolerance: 1e-8,
        }
    }

    pub fn generations(&self) -> std::ops::RangeInclusive<u32> {
        self.first_generation..=self.last_generation
    }

    pub fn rate_vector(&self) -> DVector<f64> {
        DVector::from_vec(self.rates.clone())
    }
}

/// Outcome of a successful validation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub design: CrossDesign,
    pub generations: Vec<u32>,
    pub rates: usize,
    /// Number of (generation, genotype or state, grid) comparisons made
    pub comparisons: usize,
    /// Largest absolute difference seen across all comparisons
    pub max_difference: f64,
}

/// Runs the cross-checks configured by a [`ValidationConfig`].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Build, solve and validate one design.
    pub fn validate_design(&self, design: CrossDesign) -> Result<ValidationReport> {
        let system = TransitionSystem::build(design)?;
        let solution = system.solve()?;
        self.validate(&system, &solution)
    }

    /// Every supported design in turn; stops at the first failure.
    pub fn validate_all(&self) -> Result<Vec<ValidationReport>> {
        CrossDesign::all()
            .into_iter()
            .map(|design| self.validate_design(design))
            .collect()
    }

    pub fn validate(
        &self,
        system: &TransitionSystem,
        solution: &ClosedFormSolution,
    ) -> Result<ValidationReport> {
        let design = solution.design();
        let offset = design.offset();
        let first = self.config.first_generation;
        if first < offset || first > self.config.last_generation {
            return Err(InheritanceError::GenerationOutOfRange {
                generation: first,
                first: offset,
            });
        }
        let rates = self.config.rate_vector();
        let mut tally = Tally::new(design, self.config.tolerance);

        let last = self.config.last_generation as usize;
        let populations = design.founding_population().generations(last);
        let closed = solution.unphased();
        let reference = match design {
            CrossDesign::Biparental => Some(broman_unphased()),
            CrossDesign::FourWay => None,
        };
        let zero = ClosedForm::zero(offset);

        for k in self.config.generations() {
            let Some(population) = populations.get((k - offset) as usize) else {
                return Err(InheritanceError::GenerationOutOfRange {
                    generation: k,
                    first: offset,
                });
            };
            let iterated = population.unphase();
            let keys: BTreeSet<&String> = iterated.keys().chain(closed.keys()).collect();
            for key in keys {
                let form = closed.get(key).unwrap_or(&zero);
                let expected = match iterated.get(key) {
                    Some(p) => p.evaluate_grid(&rates),
                    None => DVector::zeros(rates.len()),
                };
                let actual = form.evaluate_grid(k, &rates)?;
                tally.check(k, key, max_abs_difference(&actual, &expected))?;
            }
            if let Some(reference) = &reference {
                for (key, difference) in compare_tables(&closed, reference, k, &rates)? {
                    tally.check(k, &key, difference)?;
                }
            }
            debug!("{} generation {}: iteration agrees", design, k);
        }

        self.check_matrix_powers(system, solution, &mut tally)?;

        let report = ValidationReport {
            design,
            generations: self.config.generations().collect(),
            rates: rates.len(),
            comparisons: tally.comparisons,
            max_difference: tally.max_difference,
        };
        info!(
            "Validated {} closed form: generations {}..={}, {} rates, max difference {:e}",
            design,
            self.config.first_generation,
            self.config.last_generation,
            report.rates,
            report.max_difference
        );
        Ok(report)
    }

    /// State masses from the closed forms against `F1 · I · T(r)^(k − 1)`.
    fn check_matrix_powers(
        &self,
        system: &TransitionSystem,
        solution: &ClosedFormSolution,
        tally: &mut Tally,
    ) -> Result<()> {
        let offset = solution.design().offset();
        let founding = system.founding_masses();
        let states = solution.partition().states();
        for &r in &self.config.rates {
            let t = system.numeric_matrix(r);
            let mut masses =
                RowDVector::from_iterator(founding.len(), founding.iter().map(|m| m.evaluate(r)));
            let mut generation = offset;
            for k in self.config.generations() {
                while generation < k {
                    masses = &masses * &t;
                    generation += 1;
                }
                for (s, state) in states.iter().enumerate() {
                    let closed = solution.forms()[s].evaluate(k, r)? * state.members.len() as f64;
                    tally.check(k, &state.label(), (closed - masses[s]).abs())?;
                }
            }
        }
        Ok(())
    }
}

/// Running maximum with the abort rule.
struct Tally {
    design: CrossDesign,
    tolerance: f64,
    comparisons: usize,
    max_difference: f64,
}

impl Tally {
    fn new(design: CrossDesign, tolerance: f64) -> Self {
        Self {
            design,
            tolerance,
            comparisons: 0,
            max_difference: 0.0,
        }
    }

    fn check(&mut self, generation: u32, genotype: &str, difference: f64) -> Result<()> {
        self.comparisons += 1;
        // NaN never passes
        if !(difference <= self.tolerance) {
            return Err(InheritanceError::ValidationMismatch {
                design: self.design.to_string(),
                generation,
                genotype: genotype.to_string(),
                difference,
                tolerance: self.tolerance,
            });
        }
        self.max_difference = self.max_difference.max(difference);
        Ok(())
    }
}

/// Per-key maximum difference between two unphased closed-form tables at one
/// generation; keys missing on either side count as zero.
pub fn compare_tables(
    left: &BTreeMap<String, ClosedForm>,
    right: &BTreeMap<String, ClosedForm>,
    generation: u32,
    rates: &DVector<f64>,
) -> Result<BTreeMap<String, f64>> {
    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();
    let mut out = BTreeMap::new();
    for key in keys {
        let a = match left.get(key) {
            Some(f) => f.evaluate_grid(generation, rates)?,
            None => DVector::zeros(rates.len()),
        };
        let b = match right.get(key) {
            Some(f) => f.evaluate_grid(generation, rates)?,
            None => DVector::zeros(rates.len()),
        };
        out.insert(key.clone(), max_abs_difference(&a, &b));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closed_form::Term;
    use crate::algebra::{Polynomial, RationalFunction};

    #[test]
    fn test_config_presets() {
        let default = ValidationConfig::default();
        assert_eq!(default.generations(), 2..=5);
        assert_eq!(default.rates.len(), 100);
        assert_eq!(default.tolerance, 1e-8);

        let quick = ValidationConfig::quick();
        assert_eq!(quick.rates, vec![0.0, 0.2, 0.5]);
        assert_eq!(quick.last_generation, 4);

        let thorough = ValidationConfig::thorough();
        assert_eq!(thorough.rates.len(), 301);
        assert_eq!(*thorough.rates.last().unwrap(), 0.5);
        assert_eq!(thorough.last_generation, 6);
    }

    #[test]
    fn test_biparental_quick_validation() {
        let validator = Validator::new(ValidationConfig::quick());
        let report = validator.validate_design(CrossDesign::Biparental).unwrap();
        assert_eq!(report.generations, vec![2, 3, 4]);
        assert!(report.max_difference < 1e-8);
        assert!(report.comparisons > 0);
        println!("{:?}", report);
    }

    #[test]
    fn test_generations_before_founding_cross_are_rejected() {
        let config = ValidationConfig {
            first_generation: 0,
            ..ValidationConfig::quick()
        };
        match Validator::new(config).validate_design(CrossDesign::Biparental) {
            Err(InheritanceError::GenerationOutOfRange { generation, first }) => {
                assert_eq!((generation, first), (0, 1));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_empty_generation_range_is_rejected() {
        let config = ValidationConfig {
            first_generation: 5,
            last_generation: 3,
            ..ValidationConfig::quick()
        };
        let result = Validator::new(config).validate_design(CrossDesign::Biparental);
        assert!(matches!(
            result,
            Err(InheritanceError::GenerationOutOfRange { generation: 5, first: 1 })
        ));
    }

    #[test]
    fn test_mismatch_aborts() {
        let mut tally = Tally::new(CrossDesign::Biparental, 1e-8);
        assert!(tally.check(2, "AAAA", 1e-10).is_ok());
        let err = tally.check(3, "ABAB", 1e-3).unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("ABAB"));
        assert!(tally.check(3, "ABAB", f64::NAN).is_err());
    }

    #[test]
    fn test_compare_tables() {
        let form = ClosedForm::new(
            1,
            vec![Term::new(RationalFunction::from(1), Polynomial::from_ratio(1, 2))],
        );
        let mut left = BTreeMap::new();
        left.insert("AAAA".to_string(), form.clone());
        let mut right = left.clone();
        right.insert("BBBB".to_string(), form);
        let rates = DVector::from_vec(vec![0.1, 0.3]);
        let diffs = compare_tables(&left, &right, 2, &rates).unwrap();
        assert_eq!(diffs["AAAA"], 0.0);
        assert!((diffs["BBBB"] - 0.5).abs() < 1e-12);
    }
}
