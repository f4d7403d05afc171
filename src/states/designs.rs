//! Cross designs — founders, the founding cross and hand-curated state tables
//!
//! The biparental design selfs the F1 of two inbred founders (`AA|AA` ×
//! `BB|BB`). The four-way design selfs the progeny of a double cross
//! (`AA|AA` × `BB|BB`) × (`CC|CC` × `DD|DD`). Each design's states are
//! symmetry classes under relabelling of founder alleles and are listed
//! explicitly below; `StatePartition::validate` checks them.

use super::{StateDeclaration, StatePartition};
use crate::error::Result;
use crate::genetics::{Diplotype, Haplotype, Population};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A supported cross design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrossDesign {
    Biparental,
    FourWay,
}

const BIPARENTAL_STATES: &[(&str, &[&str])] = &[
    ("AA|AA", &["AA|AA", "BB|BB"]),
    ("AB|AB", &["AB|AB", "BA|BA"]),
    (
        "AA|AB",
        &["AA|AB", "AB|AA", "BA|BB", "BB|BA", "AA|BA", "AB|BB", "BA|AA", "BB|AB"],
    ),
    ("AA|BB", &["AA|BB", "BB|AA"]),
    ("AB|BA", &["AB|BA", "BA|AB"]),
];

const FOUR_WAY_STATES: &[(&str, &[&str])] = &[
    ("AA|AA", &["AA|AA", "BB|BB", "CC|CC", "DD|DD"]),
    (
        "AA|AC",
        &[
            "AA|AC", "AA|AD", "AA|CA", "AA|DA", "AC|CC", "AD|DD", "BB|BC", "BB|BD", "BB|CB",
            "BB|DB", "BC|CC", "BD|DD", "CA|CC", "CB|CC", "DA|DD", "DB|DD",
        ],
    ),
    ("AA|CC", &["AA|CC", "AA|DD", "BB|CC", "BB|DD"]),
    (
        "AA|CD",
        &["AA|CD", "AA|DC", "AB|CC", "AB|DD", "BA|CC", "BA|DD", "BB|CD", "BB|DC"],
    ),
    ("AB|AB", &["AB|AB", "BA|BA", "CD|CD", "DC|DC"]),
    (
        "AB|AC",
        &[
            "AB|AC", "AB|AD", "AB|CB", "AB|DB", "AC|DC", "AD|CD", "BA|BC", "BA|BD", "BA|CA",
            "BA|DA", "BC|DC", "BD|CD", "CA|CD", "CB|CD", "DA|DC", "DB|DC",
        ],
    ),
    ("AB|CD", &["AB|CD", "AB|DC", "BA|CD", "BA|DC"]),
    (
        "AC|AC",
        &["AC|AC", "AD|AD", "BC|BC", "BD|BD", "CA|CA", "CB|CB", "DA|DA", "DB|DB"],
    ),
    ("AC|CA", &["AC|CA", "AD|DA", "BC|CB", "BD|DB"]),
    (
        "AC|CB",
        &["AC|CB", "AC|DA", "AD|CA", "AD|DB", "BC|CA", "BC|DB", "BD|CB", "BD|DA"],
    ),
    ("AC|DB", &["AC|DB", "AD|CB", "BC|DA", "BD|CA"]),
];

fn inbred(allele: char) -> Diplotype {
    let h = Haplotype::new(allele, allele);
    Diplotype::new(h, h)
}

impl CrossDesign {
    pub fn all() -> [CrossDesign; 2] {
        [CrossDesign::Biparental, CrossDesign::FourWay]
    }

    pub fn name(&self) -> &'static str {
        match self {
            CrossDesign::Biparental => "biparental",
            CrossDesign::FourWay => "four-way",
        }
    }

    /// Inbred founder lines, in crossing order.
    pub fn founders(&self) -> Vec<Diplotype> {
        let alleles: &[char] = match self {
            CrossDesign::Biparental => &['A', 'B'],
            CrossDesign::FourWay => &['A', 'B', 'C', 'D'],
        };
        alleles.iter().copied().map(inbred).collect()
    }

    /// Generation 1: the product of the founding cross.
    pub fn founding_population(&self) -> Population {
        let founders = self.founders();
        match self {
            CrossDesign::Biparental => Population::from_cross(&founders[0], &founders[1]),
            CrossDesign::FourWay => {
                let left = Population::from_cross(&founders[0], &founders[1]);
                let right = Population::from_cross(&founders[2], &founders[3]);
                left.cross(&right)
            }
        }
    }

    /// Exponent offset: generation k is generation 1 selfed k − offset times.
    pub fn offset(&self) -> u32 {
        1
    }

    pub fn state_table(&self) -> Vec<StateDeclaration> {
        let table = match self {
            CrossDesign::Biparental => BIPARENTAL_STATES,
            CrossDesign::FourWay => FOUR_WAY_STATES,
        };
        table
            .iter()
            .map(|(representative, members)| StateDeclaration::new(representative, members))
            .collect()
    }

    /// The declared states validated against the selfing closure of
    /// generation 1.
    pub fn partition(&self) -> Result<StatePartition> {
        let alphabet = self.founding_population().selfing_closure();
        StatePartition::validate(&self.state_table(), &alphabet)
    }
}

impl fmt::Display for CrossDesign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
