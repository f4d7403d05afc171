//! Published reference formulas for two-locus selfing from an F1
//!
//! Broman (2012), "Genotype probabilities at intermediate generations in the
//! construction of recombinant inbred lines", Table 1: probabilities of the
//! five biparental diplotype classes at generation k (F1 = generation 1).

use super::formula::{ClosedForm, Term};
use crate::algebra::{rational, Polynomial, RationalFunction};
use std::collections::BTreeMap;

const OFFSET: u32 = 1;

fn constant(numer: i64, denom: i64) -> RationalFunction {
    RationalFunction::constant(rational(numer, denom))
}

/// 1 + 2r
fn one_plus_2r() -> Polynomial {
    Polynomial::linear(rational(1, 1), rational(2, 1))
}

/// 1 − 2r
fn one_minus_2r() -> Polynomial {
    Polynomial::linear(rational(1, 1), rational(-2, 1))
}

/// Bases of the four exponential terms: 1, 1/2, 1/2 − r, r² − r + 1/2.
fn bases() -> [Polynomial; 4] {
    [
        Polynomial::from(1),
        Polynomial::from_ratio(1, 2),
        Polynomial::linear(rational(1, 2), rational(-1, 1)),
        Polynomial::from_coeffs(vec![rational(1, 2), rational(-1, 1), rational(1, 1)]),
    ]
}

fn ratio(numer: Polynomial, denom: Polynomial) -> RationalFunction {
    RationalFunction::new(numer, denom).expect("Table 1 denominators are multiples of 1 + 2r")
}

/// The five Table-1 equations keyed by the state representative they give
/// the per-genotype probability of.
pub fn broman_states() -> BTreeMap<String, ClosedForm> {
    let [one, half, decay, quad] = bases();
    let two_one_plus_2r = one_plus_2r().scale(&rational(2, 1));
    let four_one_plus_2r = one_plus_2r().scale(&rational(4, 1));

    // AA|AA
    let eqn1 = ClosedForm::new(
        OFFSET,
        vec![
            Term::new(ratio(Polynomial::from(1), two_one_plus_2r), one.clone()),
            Term::new(constant(-1, 2), half.clone()),
            Term::new(constant(1, 4), quad.clone()),
            Term::new(ratio(-&one_minus_2r(), four_one_plus_2r.clone()), decay.clone()),
        ],
    );
    // AB|AB
    let eqn2 = ClosedForm::new(
        OFFSET,
        vec![
            Term::new(ratio(Polynomial::variable(), one_plus_2r()), one),
            Term::new(constant(-1, 2), half.clone()),
            Term::new(constant(1, 4), quad.clone()),
            Term::new(ratio(one_minus_2r(), four_one_plus_2r), decay.clone()),
        ],
    );
    // AA|AB
    let eqn3 = ClosedForm::new(
        OFFSET,
        vec![
            Term::new(constant(1, 2), half),
            Term::new(constant(-1, 2), quad.clone()),
        ],
    );
    // AA|BB
    let eqn4 = ClosedForm::new(
        OFFSET,
        vec![
            Term::new(constant(1, 2), quad.clone()),
            Term::new(constant(1, 2), decay.clone()),
        ],
    );
    // AB|BA
    let eqn5 = ClosedForm::new(
        OFFSET,
        vec![
            Term::new(constant(1, 2), quad),
            Term::new(constant(-1, 2), decay),
        ],
    );

    [
        ("AA|AA", eqn1),
        ("AB|AB", eqn2),
        ("AA|AB", eqn3),
        ("AA|BB", eqn4),
        ("AB|BA", eqn5),
    ]
    .into_iter()
    .map(|(label, form)| (label.to_string(), form))
    .collect()
}

/// Table 1 mapped onto unphased genotype keys.
pub fn broman_unphased() -> BTreeMap<String, ClosedForm> {
    let states = broman_states();
    let mut table = BTreeMap::new();
    let assignments: [(&str, &[&str]); 3] = [
        ("AA|AA", &["AAAA", "BBBB"]),
        ("AB|AB", &["AABB", "BBAA"]),
        ("AA|AB", &["AAAB", "ABAA", "ABBB", "BBAB"]),
    ];
    for (state, keys) in assignments {
        for key in keys {
            table.insert(key.to_string(), states[state].clone());
        }
    }
    // double heterozygotes in coupling and repulsion share one unphased key
    let double_heterozygote = &states["AA|BB"] + &states["AB|BA"];
    table.insert("ABAB".to_string(), double_heterozygote);
    table
}
