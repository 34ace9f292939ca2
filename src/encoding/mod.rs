//! Assembly of normalized descriptor tables into model-ready tensors.
//!
//! One reaction becomes one [`ReactionTensors`] sample: an atom feature
//! matrix, one dense symmetric bond matrix per bond descriptor, a
//! reaction-level feature vector, and the two regression targets. Atom
//! ordering is the resolver ordering per reactant component, with
//! components stacked in the order they appear in the reactants segment;
//! multi-component reactants get block-diagonal bond matrices since no
//! bond crosses a component boundary.

use crate::dataset::ReactionDataset;
use crate::descriptors::{AtomDescriptorTable, ReactionDescriptorTable};
use crate::error::{ReaccionError, Result};
use crate::preprocessing::StandardScaler;
use crate::primitives::{Matrix, Vector};
use crate::structure::{resolve, Molecule};
use crate::traits::Scaler;

/// Scatters a per-bond descriptor vector into a dense symmetric matrix.
///
/// `values[k]` is the descriptor of the k-th bond in resolver bond order;
/// it lands at both `(i, j)` and `(j, i)` for that bond's endpoints. The
/// diagonal stays zero.
///
/// # Errors
///
/// Returns [`ReaccionError::DimensionMismatch`] if the vector length
/// differs from the molecule's bond count.
pub fn bond_to_matrix(mol: &Molecule, values: &[f32]) -> Result<Matrix<f32>> {
    let bonds = mol.bonds();
    if values.len() != bonds.len() {
        return Err(ReaccionError::dimension_mismatch("bonds", bonds.len(), values.len()));
    }
    let n = mol.atom_count();
    let mut matrix = Matrix::zeros(n, n);
    for (&value, (i, j)) in values.iter().zip(bonds) {
        matrix.set(i, j, value);
        matrix.set(j, i, value);
    }
    Ok(matrix)
}

/// The tensors for a single reaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionTensors {
    pub rxn_id: String,
    /// `n_atoms x n_atom_descriptors`, resolver atom order.
    pub atom_features: Matrix<f32>,
    /// One symmetric `n_atoms x n_atoms` matrix per bond descriptor.
    pub bond_features: Vec<Matrix<f32>>,
    /// Reaction-level descriptors, empty unless the model consumes them.
    pub reaction_features: Vector<f32>,
    /// `[activation_energy, reaction_energy]`, in scaler units when target
    /// scalers were supplied to the encoder.
    pub targets: [f32; 2],
}

/// An encoded batch of reactions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TensorSet {
    samples: Vec<ReactionTensors>,
}

impl TensorSet {
    /// Number of reactions in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The encoded samples in dataset order.
    #[must_use]
    pub fn samples(&self) -> &[ReactionTensors] {
        &self.samples
    }

    /// Targets as an `(n, 2)` matrix: column 0 activation energy,
    /// column 1 reaction energy.
    #[must_use]
    pub fn targets_matrix(&self) -> Matrix<f32> {
        let mut m = Matrix::zeros(self.samples.len(), 2);
        for (row, sample) in self.samples.iter().enumerate() {
            m.set(row, 0, sample.targets[0]);
            m.set(row, 1, sample.targets[1]);
        }
        m
    }

    /// Reaction identifiers in dataset order.
    #[must_use]
    pub fn rxn_ids(&self) -> Vec<&str> {
        self.samples.iter().map(|s| s.rxn_id.as_str()).collect()
    }
}

/// Builds [`TensorSet`]s from normalized descriptor tables.
///
/// The three column lists select which descriptor blocks a model variant
/// consumes; an empty list skips that block entirely.
#[derive(Debug, Clone)]
pub struct TensorEncoder {
    atom_columns: Vec<String>,
    bond_columns: Vec<String>,
    reaction_columns: Vec<String>,
}

impl TensorEncoder {
    /// Creates an encoder over the given descriptor columns.
    #[must_use]
    pub fn new(
        atom_columns: Vec<String>,
        bond_columns: Vec<String>,
        reaction_columns: Vec<String>,
    ) -> Self {
        Self {
            atom_columns,
            bond_columns,
            reaction_columns,
        }
    }

    /// Encodes every record of a dataset.
    ///
    /// `target_scalers` is `(activation, reaction_energy)`; when supplied,
    /// targets are transformed into scaler units.
    ///
    /// # Errors
    ///
    /// Returns [`ReaccionError::MissingDescriptor`] when a required table
    /// row or column is absent, [`ReaccionError::StructureParse`] for an
    /// unresolvable reactant, and [`ReaccionError::DimensionMismatch`]
    /// when a descriptor vector length disagrees with the resolved
    /// structure.
    pub fn encode(
        &self,
        dataset: &ReactionDataset,
        atoms: &AtomDescriptorTable,
        reactions: &ReactionDescriptorTable,
        target_scalers: Option<(&StandardScaler, &StandardScaler)>,
    ) -> Result<TensorSet> {
        let mut samples = Vec::with_capacity(dataset.len());
        for record in dataset.records() {
            let components: Vec<&str> = record
                .rxn_smiles
                .split('>')
                .next()
                .unwrap_or("")
                .split('.')
                .filter(|s| !s.is_empty())
                .collect();
            let mols: Vec<Molecule> =
                components.iter().map(|s| resolve(s)).collect::<Result<_>>()?;
            let total_atoms: usize = mols.iter().map(Molecule::atom_count).sum();

            let atom_features =
                self.encode_atom_block(&components, &mols, atoms, total_atoms)?;
            let bond_features =
                self.encode_bond_block(&components, &mols, atoms, total_atoms)?;
            let reaction_features =
                self.encode_reaction_block(&record.rxn_smiles, reactions)?;

            let targets = match target_scalers {
                Some((act, rxn)) => [
                    act.transform(record.activation_energy),
                    rxn.transform(record.reaction_energy),
                ],
                None => [record.activation_energy, record.reaction_energy],
            };

            samples.push(ReactionTensors {
                rxn_id: record.rxn_id.clone(),
                atom_features,
                bond_features,
                reaction_features,
                targets,
            });
        }
        Ok(TensorSet { samples })
    }

    fn encode_atom_block(
        &self,
        components: &[&str],
        mols: &[Molecule],
        atoms: &AtomDescriptorTable,
        total_atoms: usize,
    ) -> Result<Matrix<f32>> {
        let mut features = Matrix::zeros(total_atoms, self.atom_columns.len());
        let mut row_offset = 0;
        for (smiles, mol) in components.iter().zip(mols) {
            for (col_idx, col) in self.atom_columns.iter().enumerate() {
                let values = atoms
                    .values(smiles, col)
                    .ok_or_else(|| missing(col, "atom"))?;
                if values.len() != mol.atom_count() {
                    return Err(ReaccionError::dimension_mismatch(
                        "atoms",
                        mol.atom_count(),
                        values.len(),
                    ));
                }
                for (i, &value) in values.iter().enumerate() {
                    features.set(row_offset + i, col_idx, value);
                }
            }
            row_offset += mol.atom_count();
        }
        Ok(features)
    }

    fn encode_bond_block(
        &self,
        components: &[&str],
        mols: &[Molecule],
        atoms: &AtomDescriptorTable,
        total_atoms: usize,
    ) -> Result<Vec<Matrix<f32>>> {
        let mut block = Vec::with_capacity(self.bond_columns.len());
        for col in &self.bond_columns {
            let mut matrix = Matrix::zeros(total_atoms, total_atoms);
            let mut offset = 0;
            for (smiles, mol) in components.iter().zip(mols) {
                let values = atoms
                    .values(smiles, col)
                    .ok_or_else(|| missing(col, "atom"))?;
                let scatter = bond_to_matrix(mol, values)?;
                let n = mol.atom_count();
                for i in 0..n {
                    for j in 0..n {
                        matrix.set(offset + i, offset + j, scatter.get(i, j));
                    }
                }
                offset += n;
            }
            block.push(matrix);
        }
        Ok(block)
    }

    fn encode_reaction_block(
        &self,
        rxn_smiles: &str,
        reactions: &ReactionDescriptorTable,
    ) -> Result<Vector<f32>> {
        let mut values = Vec::with_capacity(self.reaction_columns.len());
        for col in &self.reaction_columns {
            let value = reactions
                .value(rxn_smiles, col)
                .ok_or_else(|| missing(col, "reaction"))?;
            values.push(value);
        }
        Ok(Vector::from_vec(values))
    }
}

fn missing(descriptor: &str, table: &str) -> ReaccionError {
    ReaccionError::MissingDescriptor {
        descriptor: descriptor.to_string(),
        table: table.to_string(),
    }
}
