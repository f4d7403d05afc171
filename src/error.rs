//! Error taxonomy for the inheritance engine
//!
//! Three families of failure are kept apart so callers can tell bad input
//! from a broken derivation:
//! - structural errors: malformed haplotypes, diplotypes and state tables
//! - algebraic errors: the transition matrix cannot be diagonalized exactly
//! - validation errors: closed form and generational iteration disagree
//!
//! Persistence errors from the formula store ride along in the same enum.

use thiserror::Error;

/// Errors raised while building, solving or validating a selfing model.
#[derive(Debug, Error)]
pub enum InheritanceError {
    #[error("Haplotype '{haplotype}' has {length} loci (expected 2)")]
    HaplotypeLength { haplotype: String, length: usize },

    #[error("A diplotype needs exactly two haplotypes, got {count}")]
    HaplotypeCount { count: usize },

    #[error("Malformed genotype '{genotype}': {reason}")]
    MalformedGenotype { genotype: String, reason: String },

    #[error("Genotype {genotype} is declared in both state {first} and state {second}")]
    PartitionOverlap {
        genotype: String,
        first: String,
        second: String,
    },

    #[error("Genotype {genotype} is not covered by any declared state")]
    PartitionMissing { genotype: String },

    #[error("State {state} declares genotype {genotype}, which the cross never produces")]
    PartitionExtraneous { state: String, genotype: String },

    #[error("State {state} has no members")]
    EmptyState { state: String },

    #[error("Representative {state} is not a member of its own state")]
    RepresentativeNotMember { state: String },

    #[error("Genotype {genotype} in state {state} does not share the representative's transitions")]
    NotLumpable { state: String, genotype: String },

    #[error("Founding population is not symmetric within state {state} (genotype {genotype})")]
    AsymmetricFounders { state: String, genotype: String },

    #[error("Transition matrix is not diagonalizable over Q(r): {found} independent eigenvectors for dimension {dimension}")]
    NotDiagonalizable { found: usize, dimension: usize },

    #[error("Singular matrix while {context}")]
    SingularMatrix { context: String },

    #[error("Generation {generation} is outside the closed form's range (first valid generation {first})")]
    GenerationOutOfRange { generation: u32, first: u32 },

    #[error("{design} generation {generation}, genotype {genotype}: closed form differs from iteration by {difference:e} (tolerance {tolerance:e})")]
    ValidationMismatch {
        design: String,
        generation: u32,
        genotype: String,
        difference: f64,
        tolerance: f64,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Checksum mismatch for artifact '{name}'")]
    ChecksumMismatch { name: String },

    #[error("No stored artifact named '{name}'")]
    MissingArtifact { name: String },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, InheritanceError>;

impl InheritanceError {
    /// Bad input: haplotypes, genotype strings or declared state tables.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::HaplotypeLength { .. }
                | Self::HaplotypeCount { .. }
                | Self::MalformedGenotype { .. }
                | Self::PartitionOverlap { .. }
                | Self::PartitionMissing { .. }
                | Self::PartitionExtraneous { .. }
                | Self::EmptyState { .. }
                | Self::RepresentativeNotMember { .. }
                | Self::NotLumpable { .. }
                | Self::AsymmetricFounders { .. }
                | Self::GenerationOutOfRange { .. }
        )
    }

    /// The closed-form algorithm does not apply to this transition system.
    pub fn is_algebraic(&self) -> bool {
        matches!(
            self,
            Self::NotDiagonalizable { .. } | Self::SingularMatrix { .. }
        )
    }

    /// Closed form and iteration disagree: a derivation bug, not bad input.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationMismatch { .. })
    }

    pub(crate) fn malformed(genotype: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedGenotype {
            genotype: genotype.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn singular(context: impl Into<String>) -> Self {
        Self::SingularMatrix {
            context: context.into(),
        }
    }
}
