//! QM descriptor tables.
//!
//! Atom tables map a reactant structure string to variable-length per-atom
//! (or per-bond) descriptor vectors in canonical atom order; reaction tables
//! map a full reaction SMILES to scalar descriptors. Both are persisted as
//! plain serialized mappings keyed by the structure string, which is the join
//! key everywhere in the pipeline.
//!
//! `BTreeMap` storage keeps iteration deterministic: scaler fitting pools
//! values in table order, so a nondeterministic order would change nothing
//! numerically but would break bit-reproducibility of fitted bundles.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-structure atom-level (and bond-level) descriptor vectors.
///
/// # Examples
///
/// ```
/// use reaccion::descriptors::AtomDescriptorTable;
///
/// let mut table = AtomDescriptorTable::new();
/// table.insert("CO", "partial_charge", vec![-0.1, 0.3, 0.05, 0.05, 0.05, -0.35]);
/// assert!(table.has_column("partial_charge"));
/// assert_eq!(table.values("CO", "partial_charge").unwrap().len(), 6);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AtomDescriptorTable {
    rows: BTreeMap<String, BTreeMap<String, Vec<f32>>>,
}

impl AtomDescriptorTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one descriptor vector for a structure.
    pub fn insert(&mut self, smiles: &str, descriptor: &str, values: Vec<f32>) {
        self.rows
            .entry(smiles.to_string())
            .or_default()
            .insert(descriptor.to_string(), values);
    }

    /// Number of structures in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if the structure has a row.
    #[must_use]
    pub fn contains_structure(&self, smiles: &str) -> bool {
        self.rows.contains_key(smiles)
    }

    /// Returns true if any row carries the descriptor column.
    #[must_use]
    pub fn has_column(&self, descriptor: &str) -> bool {
        self.rows.values().any(|row| row.contains_key(descriptor))
    }

    /// The descriptor vector for one structure, if present.
    #[must_use]
    pub fn values(&self, smiles: &str, descriptor: &str) -> Option<&[f32]> {
        self.rows
            .get(smiles)
            .and_then(|row| row.get(descriptor))
            .map(Vec::as_slice)
    }

    /// Iterates rows in structure-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Vec<f32>>)> {
        self.rows.iter()
    }

    /// Structures whose row is unusable for the required descriptor columns:
    /// a column missing from the row, or containing a non-finite value.
    ///
    /// The returned structures are meant to be dropped from the dataset
    /// before any fold split (fail soft), matching the validation the
    /// descriptor-generation step's output goes through.
    #[must_use]
    pub fn invalid_structures(&self, required: &[&str]) -> Vec<String> {
        self.rows
            .iter()
            .filter(|(_, row)| {
                required.iter().any(|col| match row.get(*col) {
                    Some(values) => values.iter().any(|v| !v.is_finite()),
                    None => true,
                })
            })
            .map(|(smiles, _)| smiles.clone())
            .collect()
    }

    /// Reads a table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes the table to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}

/// Per-reaction scalar descriptors, keyed by full reaction SMILES.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReactionDescriptorTable {
    rows: BTreeMap<String, BTreeMap<String, f32>>,
}

impl ReactionDescriptorTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts one scalar descriptor for a reaction.
    pub fn insert(&mut self, rxn_smiles: &str, descriptor: &str, value: f32) {
        self.rows
            .entry(rxn_smiles.to_string())
            .or_default()
            .insert(descriptor.to_string(), value);
    }

    /// Number of reactions in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if any row carries the descriptor column.
    #[must_use]
    pub fn has_column(&self, descriptor: &str) -> bool {
        self.rows.values().any(|row| row.contains_key(descriptor))
    }

    /// The scalar value for one reaction, if present.
    #[must_use]
    pub fn value(&self, rxn_smiles: &str, descriptor: &str) -> Option<f32> {
        self.rows
            .get(rxn_smiles)
            .and_then(|row| row.get(descriptor))
            .copied()
    }

    /// Iterates rows in reaction-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, f32>)> {
        self.rows.iter()
    }

    /// Reads a table from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Writes the table to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = serde_json::to_string(self)?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
