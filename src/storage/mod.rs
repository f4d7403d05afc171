//! Formula store — derived closed forms and state tables on disk
//!
//! One JSON file holds an artifact per cross design: the closed form of every
//! state, the unphased closed forms and the validated state partition. Each
//! artifact carries a SHA-256 checksum of its content that is verified
//! whenever the store is opened.

use crate::closed_form::{ClosedForm, ClosedFormSolution};
use crate::error::{InheritanceError, Result};
use crate::states::{CrossDesign, StatePartition};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything downstream tools need from one solved design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormulaArtifact {
    pub design: CrossDesign,
    /// State label → per-genotype closed form
    pub formulas: BTreeMap<String, ClosedForm>,
    /// Unphased genotype key → closed form
    pub unphased: BTreeMap<String, ClosedForm>,
    pub partition: StatePartition,
    pub checksum: String,
    pub created_at: DateTime<Utc>,
}

impl FormulaArtifact {
    pub fn from_solution(solution: &ClosedFormSolution) -> Result<Self> {
        let formulas = solution.by_state();
        let unphased = solution.unphased();
        let partition = solution.partition().clone();
        let checksum = Self::checksum_of(&formulas, &unphased, &partition)?;
        Ok(Self {
            design: solution.design(),
            formulas,
            unphased,
            partition,
            checksum,
            created_at: Utc::now(),
        })
    }

    fn checksum_of(
        formulas: &BTreeMap<String, ClosedForm>,
        unphased: &BTreeMap<String, ClosedForm>,
        partition: &StatePartition,
    ) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(formulas)?);
        hasher.update(serde_json::to_vec(unphased)?);
        hasher.update(serde_json::to_vec(partition)?);
        Ok(hex::encode(hasher.finalize()))
    }

    /// Recompute the checksum and compare with the stored one.
    pub fn verify(&self) -> Result<()> {
        let actual = Self::checksum_of(&self.formulas, &self.unphased, &self.partition)?;
        if actual != self.checksum {
            return Err(InheritanceError::ChecksumMismatch {
                name: self.design.to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub created_at: String,
    pub saved_at: Option<DateTime<Utc>>,
    pub total_saves: u64,
}

/// JSON-backed collection of formula artifacts keyed by design name.
#[derive(Debug, Serialize, Deserialize)]
pub struct FormulaStore {
    pub artifacts: BTreeMap<String, FormulaArtifact>,
    pub path: PathBuf,
    pub metadata: StoreMetadata,
}

impl FormulaStore {
    /// Load the store at `path`, or start an empty one if the file is absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let data = std::fs::read_to_string(&path)?;
            let mut store: FormulaStore = serde_json::from_str(&data)?;
            store.path = path;
            store.verify()?;
            info!(
                "Loaded formula store {} with {} artifacts",
                store.path.display(),
                store.artifacts.len()
            );
            return Ok(store);
        }
        Ok(Self {
            artifacts: BTreeMap::new(),
            path,
            metadata: StoreMetadata {
                created_at: Utc::now().to_rfc3339(),
                saved_at: None,
                total_saves: 0,
            },
        })
    }

    pub fn save(&mut self) -> Result<()> {
        self.metadata.saved_at = Some(Utc::now());
        self.metadata.total_saves += 1;
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.path, json)?;
        info!(
            "Saved formula store {} ({} artifacts)",
            self.path.display(),
            self.artifacts.len()
        );
        Ok(())
    }

    /// Store a solved design, replacing any earlier artifact for it.
    pub fn insert(&mut self, solution: &ClosedFormSolution) -> Result<&FormulaArtifact> {
        let artifact = FormulaArtifact::from_solution(solution)?;
        let name = artifact.design.to_string();
        self.artifacts.insert(name.clone(), artifact);
        self.get(&name)
    }

    pub fn get(&self, name: &str) -> Result<&FormulaArtifact> {
        self.artifacts
            .get(name)
            .ok_or_else(|| InheritanceError::MissingArtifact {
                name: name.to_string(),
            })
    }

    pub fn get_design(&self, design: CrossDesign) -> Result<&FormulaArtifact> {
        self.get(design.name())
    }

    pub fn remove(&mut self, name: &str) -> Option<FormulaArtifact> {
        self.artifacts.remove(name)
    }

    pub fn verify(&self) -> Result<()> {
        self.artifacts.values().try_for_each(FormulaArtifact::verify)
    }

    pub fn names(&self) -> Vec<&str> {
        self.artifacts.keys().map(String::as_str).collect()
    }

    pub fn summary(&self) -> String {
        let states: usize = self.artifacts.values().map(|a| a.formulas.len()).sum();
        format!(
            "FormulaStore '{}' | {} artifacts | {} state formulas | saved {} times",
            self.path.display(),
            self.artifacts.len(),
            states,
            self.metadata.total_saves
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::closed_form::TransitionSystem;

    fn biparental() -> ClosedFormSolution {
        TransitionSystem::build(CrossDesign::Biparental)
            .unwrap()
            .solve()
            .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formulas.json");

        let solution = biparental();
        let mut store = FormulaStore::open(&path).unwrap();
        assert!(store.artifacts.is_empty());
        store.insert(&solution).unwrap();
        store.save().unwrap();

        let reopened = FormulaStore::open(&path).unwrap();
        let artifact = reopened.get_design(CrossDesign::Biparental).unwrap();
        assert_eq!(artifact.formulas, solution.by_state());
        assert_eq!(artifact.unphased, solution.unphased());
        assert_eq!(&artifact.partition, solution.partition());
        assert_eq!(reopened.metadata.total_saves, 1);
        println!("{}", reopened.summary());
    }

    #[test]
    fn test_tampering_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formulas.json");
        let mut store = FormulaStore::open(&path).unwrap();
        store.insert(&biparental()).unwrap();
        if let Some(artifact) = store.artifacts.get_mut("biparental") {
            artifact.formulas.remove("AA|AA");
        }
        store.save().unwrap();

        match FormulaStore::open(&path) {
            Err(InheritanceError::ChecksumMismatch { name }) => assert_eq!(name, "biparental"),
            other => panic!("unexpected {:?}", other.map(|s| s.names().len())),
        }
    }

    #[test]
    fn test_missing_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FormulaStore::open(dir.path().join("empty.json")).unwrap();
        assert!(matches!(
            store.get("four-way"),
            Err(InheritanceError::MissingArtifact { .. })
        ));
    }
}
