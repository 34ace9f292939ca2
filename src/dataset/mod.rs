//! Reaction dataset: records, reactant extraction, pre-split filtering.
//!
//! Raw file loading is the caller's concern; this module owns the in-memory
//! record collection, the seeded global shuffle applied once before fold
//! partitioning, and the data-quality filter that removes records whose
//! descriptor entries are unusable (fail soft, logged) before any split.

use std::collections::{BTreeSet, HashSet};

use log::warn;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::primitives::Vector;

/// One reaction: identifier, reaction SMILES, and the two target energies
/// in original units. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    /// Reaction identifier (the id column of the input table).
    pub rxn_id: String,
    /// Reaction SMILES, `reactants>agents>products`.
    pub rxn_smiles: String,
    /// Activation energy target.
    pub activation_energy: f32,
    /// Reaction energy target.
    pub reaction_energy: f32,
}

/// An owned collection of reaction records.
///
/// # Examples
///
/// ```
/// use reaccion::dataset::{ReactionDataset, ReactionRecord};
///
/// let ds = ReactionDataset::new(vec![ReactionRecord {
///     rxn_id: "rxn0".to_string(),
///     rxn_smiles: "CBr.[OH-]>>CO.[Br-]".to_string(),
///     activation_energy: 20.1,
///     reaction_energy: -15.4,
/// }]);
/// assert_eq!(ds.len(), 1);
/// assert_eq!(ds.reactants(), vec!["CBr", "[OH-]"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionDataset {
    records: Vec<ReactionRecord>,
}

impl ReactionDataset {
    /// Creates a dataset from records.
    #[must_use]
    pub fn new(records: Vec<ReactionRecord>) -> Self {
        Self { records }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The records, in current order.
    #[must_use]
    pub fn records(&self) -> &[ReactionRecord] {
        &self.records
    }

    /// Seeded whole-dataset shuffle, applied once before fold partitioning
    /// so that contiguous fold ranges are random samples.
    #[must_use]
    pub fn shuffled(mut self, seed: u64) -> Self {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        self.records.shuffle(&mut rng);
        self
    }

    /// Clones the records at `indices` into a new dataset, preserving the
    /// index order given.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
        }
    }

    /// Reaction SMILES of every record, in order.
    #[must_use]
    pub fn rxn_smiles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.rxn_smiles.as_str()).collect()
    }

    /// Reaction identifiers of every record, in order.
    #[must_use]
    pub fn rxn_ids(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.rxn_id.as_str()).collect()
    }

    /// The deduplicated reactant structures appearing across all records,
    /// in sorted order.
    #[must_use]
    pub fn reactants(&self) -> Vec<String> {
        reaction_to_reactants(self.rxn_smiles().into_iter())
    }

    /// Target vectors `(activation_energy, reaction_energy)`, in record order.
    #[must_use]
    pub fn targets(&self) -> (Vector<f32>, Vector<f32>) {
        let activation: Vec<f32> = self.records.iter().map(|r| r.activation_energy).collect();
        let reaction: Vec<f32> = self.records.iter().map(|r| r.reaction_energy).collect();
        (Vector::from_vec(activation), Vector::from_vec(reaction))
    }

    /// Removes records whose reactants include any of the given invalid
    /// structures. Each exclusion is logged; returns the number dropped.
    ///
    /// This is the pre-split data-quality filter: record-level problems are
    /// dropped softly here, never surfaced as run-aborting errors later.
    pub fn drop_invalid_records(&mut self, invalid_structures: &HashSet<String>) -> usize {
        if invalid_structures.is_empty() {
            return 0;
        }
        let before = self.records.len();
        self.records.retain(|r| {
            let bad = reactants_of(&r.rxn_smiles)
                .iter()
                .any(|s| invalid_structures.contains(*s));
            if bad {
                warn!(
                    "excluding reaction {} ({}): descriptor table has missing values for a reactant",
                    r.rxn_id, r.rxn_smiles
                );
            }
            !bad
        });
        before - self.records.len()
    }
}

/// Splits a reaction SMILES into its reactant components.
fn reactants_of(rxn_smiles: &str) -> Vec<&str> {
    rxn_smiles
        .split('>')
        .next()
        .unwrap_or("")
        .split('.')
        .filter(|s| !s.is_empty())
        .collect()
}

/// Collects the sorted, deduplicated reactant structures of a set of
/// reactions.
///
/// Multi-component reactant strings are split on `.`; agents and products
/// (after the first `>`) are ignored. Sorted output keeps downstream scaler
/// fitting deterministic.
pub fn reaction_to_reactants<'a>(reactions: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: BTreeSet<&str> = BTreeSet::new();
    for rxn in reactions {
        out.extend(reactants_of(rxn));
    }
    out.into_iter().map(str::to_string).collect()
}
