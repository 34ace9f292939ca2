//! Descriptor normalization with leakage-safe scaler fitting.
//!
//! Tree-level QM descriptors arrive on wildly different scales (partial
//! charges near zero, NMR shielding constants in the hundreds), so every
//! column is rescaled before tensor assembly. Three scaling families:
//!
//! - **Atom-type scaled** columns (by default `NMR` and `sasa`) get one
//!   [`MinMaxScaler`] per chemical element, fitted on the pooled values of
//!   all atoms of that element. Shielding ranges differ per element by an
//!   order of magnitude, so a single global range would crush the carbon
//!   signal under the hydrogen one.
//! - Every other atom or bond column gets one global [`MinMaxScaler`].
//! - Reaction-level columns get one [`StandardScaler`] each.
//!
//! All fitted scalers for one fold live in a [`ScalerBundle`], a frozen
//! value object created by [`DescriptorNormalizer::fit`] and never mutated
//! afterwards. Fitting restricts pooling to an optional reference set of
//! structures (the training fold), and transformation can likewise be
//! restricted to the rows a fold actually uses, so held-out statistics
//! never reach the scalers and abandoned rows are never touched.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::descriptors::{AtomDescriptorTable, ReactionDescriptorTable};
use crate::error::{ReaccionError, Result};
use crate::preprocessing::{MinMaxScaler, StandardScaler};
use crate::structure::resolve;
use crate::traits::Scaler;

/// Default columns scaled per chemical element rather than globally.
pub const DEFAULT_ATOM_SCALE: &[&str] = &["NMR", "sasa"];

/// The frozen set of scalers fitted on one training fold.
///
/// Constructed only by [`DescriptorNormalizer::fit`]; a bundle is immutable
/// once built, so the same bundle applied twice yields bit-identical output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScalerBundle {
    /// descriptor -> element -> scaler, for atom-type scaled columns.
    atom_type: BTreeMap<String, BTreeMap<String, MinMaxScaler>>,
    /// descriptor -> scaler, for globally scaled atom and bond columns.
    column: BTreeMap<String, MinMaxScaler>,
    /// descriptor -> scaler, for reaction-level columns.
    reaction: BTreeMap<String, StandardScaler>,
}

impl ScalerBundle {
    /// The per-element scaler for an atom-type scaled column, if fitted.
    #[must_use]
    pub fn atom_type_scaler(&self, descriptor: &str, element: &str) -> Option<&MinMaxScaler> {
        self.atom_type.get(descriptor).and_then(|m| m.get(element))
    }

    /// The global scaler for a column, if fitted.
    #[must_use]
    pub fn column_scaler(&self, descriptor: &str) -> Option<&MinMaxScaler> {
        self.column.get(descriptor)
    }

    /// The scaler for a reaction-level column, if fitted.
    #[must_use]
    pub fn reaction_scaler(&self, descriptor: &str) -> Option<&StandardScaler> {
        self.reaction.get(descriptor)
    }

    /// Elements seen during fitting for an atom-type scaled column.
    #[must_use]
    pub fn elements_seen(&self, descriptor: &str) -> Vec<&str> {
        self.atom_type
            .get(descriptor)
            .map(|m| m.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Fits and applies descriptor scalers.
///
/// # Examples
///
/// ```
/// use reaccion::descriptors::{AtomDescriptorTable, ReactionDescriptorTable};
/// use reaccion::normalize::DescriptorNormalizer;
///
/// let mut atoms = AtomDescriptorTable::new();
/// // methane: one C, four H
/// atoms.insert("C", "partial_charge", vec![-0.4, 0.1, 0.1, 0.1, 0.1]);
/// let reactions = ReactionDescriptorTable::new();
///
/// let normalizer = DescriptorNormalizer::new();
/// let bundle = normalizer
///     .fit(&atoms, &["partial_charge".into()], &reactions, &[], None, None)
///     .unwrap();
/// let scaled = normalizer
///     .transform_atoms(&atoms, &["partial_charge".into()], &bundle, None)
///     .unwrap();
/// let values = scaled.values("C", "partial_charge").unwrap();
/// assert_eq!(values[0], 0.0); // column minimum maps to 0
/// assert_eq!(values[1], 1.0); // column maximum maps to 1
/// ```
#[derive(Debug, Clone)]
pub struct DescriptorNormalizer {
    atom_scale: HashSet<String>,
}

impl Default for DescriptorNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorNormalizer {
    /// Creates a normalizer with the default atom-type scaled columns.
    #[must_use]
    pub fn new() -> Self {
        Self {
            atom_scale: DEFAULT_ATOM_SCALE.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Overrides the set of columns scaled per chemical element.
    #[must_use]
    pub fn with_atom_scale<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.atom_scale = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Fits a complete [`ScalerBundle`] for one fold.
    ///
    /// `atom_reference` and `reaction_reference` restrict the rows pooled
    /// for fitting (training-fold reactant structures and training-fold
    /// reaction SMILES respectively); `None` pools every row.
    ///
    /// # Errors
    ///
    /// - [`ReaccionError::MissingDescriptor`] if a requested column is
    ///   absent from a table row.
    /// - [`ReaccionError::StructureParse`] if a structure string in an
    ///   atom-type scaled row cannot be resolved.
    /// - [`ReaccionError::DimensionMismatch`] if a per-atom vector length
    ///   disagrees with the resolved atom count.
    pub fn fit(
        &self,
        atoms: &AtomDescriptorTable,
        atom_columns: &[String],
        reactions: &ReactionDescriptorTable,
        reaction_columns: &[String],
        atom_reference: Option<&HashSet<String>>,
        reaction_reference: Option<&HashSet<String>>,
    ) -> Result<ScalerBundle> {
        let mut bundle = ScalerBundle::default();

        for col in atom_columns {
            if self.atom_scale.contains(col) {
                let scalers = self.fit_atom_type_column(atoms, col, atom_reference)?;
                bundle.atom_type.insert(col.clone(), scalers);
            } else {
                let scaler = self.fit_global_column(atoms, col, atom_reference)?;
                bundle.column.insert(col.clone(), scaler);
            }
        }

        for col in reaction_columns {
            let mut pooled = Vec::new();
            for (rxn, row) in reactions.iter() {
                if reaction_reference.is_some_and(|set| !set.contains(rxn)) {
                    continue;
                }
                let value = row.get(col).copied().ok_or_else(|| missing(col, "reaction"))?;
                pooled.push(value);
            }
            let mut scaler = StandardScaler::new();
            scaler.fit(&pooled)?;
            bundle.reaction.insert(col.clone(), scaler);
        }

        Ok(bundle)
    }

    fn fit_atom_type_column(
        &self,
        atoms: &AtomDescriptorTable,
        col: &str,
        reference: Option<&HashSet<String>>,
    ) -> Result<BTreeMap<String, MinMaxScaler>> {
        let mut pooled: BTreeMap<String, Vec<f32>> = BTreeMap::new();
        for (smiles, row) in atoms.iter() {
            if reference.is_some_and(|set| !set.contains(smiles)) {
                continue;
            }
            let values = row.get(col).ok_or_else(|| missing(col, "atom"))?;
            let mol = resolve(smiles)?;
            if values.len() != mol.atom_count() {
                return Err(ReaccionError::dimension_mismatch(
                    "atoms",
                    mol.atom_count(),
                    values.len(),
                ));
            }
            for (symbol, &value) in mol.symbols().iter().zip(values.iter()) {
                pooled.entry((*symbol).to_string()).or_default().push(value);
            }
        }
        let mut scalers = BTreeMap::new();
        for (element, values) in pooled {
            let mut scaler = MinMaxScaler::new();
            scaler.fit(&values)?;
            scalers.insert(element, scaler);
        }
        Ok(scalers)
    }

    fn fit_global_column(
        &self,
        atoms: &AtomDescriptorTable,
        col: &str,
        reference: Option<&HashSet<String>>,
    ) -> Result<MinMaxScaler> {
        let mut pooled = Vec::new();
        for (smiles, row) in atoms.iter() {
            if reference.is_some_and(|set| !set.contains(smiles)) {
                continue;
            }
            let values = row.get(col).ok_or_else(|| missing(col, "atom"))?;
            pooled.extend_from_slice(values);
        }
        let mut scaler = MinMaxScaler::new();
        scaler.fit(&pooled)?;
        Ok(scaler)
    }

    /// Applies a fitted bundle to an atom table.
    ///
    /// `structures` restricts transformation to the named rows; `None`
    /// transforms every row. Rows outside the restriction are skipped
    /// without inspection, so a table may carry deficient rows as long as
    /// nothing references them.
    ///
    /// # Errors
    ///
    /// In addition to the errors of [`DescriptorNormalizer::fit`], returns
    /// [`ReaccionError::UnseenAtomType`] when a structure contains an
    /// element with no fitted scaler for an atom-type scaled column. An
    /// element outside the fitted inventory has no defensible scale, so
    /// the run aborts rather than extrapolate.
    pub fn transform_atoms(
        &self,
        atoms: &AtomDescriptorTable,
        atom_columns: &[String],
        bundle: &ScalerBundle,
        structures: Option<&HashSet<String>>,
    ) -> Result<AtomDescriptorTable> {
        let mut out = AtomDescriptorTable::new();
        for (smiles, row) in atoms.iter() {
            if structures.is_some_and(|set| !set.contains(smiles)) {
                continue;
            }
            for col in atom_columns {
                let values = row.get(col).ok_or_else(|| missing(col, "atom"))?;
                let scaled = if self.atom_scale.contains(col) {
                    let scalers = bundle.atom_type.get(col).ok_or_else(|| missing(col, "atom"))?;
                    let mol = resolve(smiles)?;
                    if values.len() != mol.atom_count() {
                        return Err(ReaccionError::dimension_mismatch(
                            "atoms",
                            mol.atom_count(),
                            values.len(),
                        ));
                    }
                    let mut scaled = Vec::with_capacity(values.len());
                    for (symbol, &value) in mol.symbols().iter().zip(values.iter()) {
                        let scaler = scalers.get(*symbol).ok_or_else(|| {
                            ReaccionError::UnseenAtomType {
                                element: (*symbol).to_string(),
                                descriptor: col.clone(),
                            }
                        })?;
                        scaled.push(scaler.transform(value));
                    }
                    scaled
                } else {
                    let scaler = bundle.column.get(col).ok_or_else(|| missing(col, "atom"))?;
                    scaler.transform_slice(values)
                };
                out.insert(smiles, col, scaled);
            }
        }
        Ok(out)
    }

    /// Applies a fitted bundle to a reaction table.
    ///
    /// `rxns` restricts transformation to the named rows, like
    /// `structures` in [`DescriptorNormalizer::transform_atoms`].
    ///
    /// # Errors
    ///
    /// Returns [`ReaccionError::MissingDescriptor`] if a requested column
    /// is absent from a transformed row or from the bundle.
    pub fn transform_reactions(
        &self,
        reactions: &ReactionDescriptorTable,
        reaction_columns: &[String],
        bundle: &ScalerBundle,
        rxns: Option<&HashSet<String>>,
    ) -> Result<ReactionDescriptorTable> {
        let mut out = ReactionDescriptorTable::new();
        for (rxn, row) in reactions.iter() {
            if rxns.is_some_and(|set| !set.contains(rxn)) {
                continue;
            }
            for col in reaction_columns {
                let value = row.get(col).copied().ok_or_else(|| missing(col, "reaction"))?;
                let scaler = bundle.reaction.get(col).ok_or_else(|| missing(col, "reaction"))?;
                out.insert(rxn, col, scaler.transform(value));
            }
        }
        Ok(out)
    }
}

fn missing(descriptor: &str, table: &str) -> ReaccionError {
    ReaccionError::MissingDescriptor {
        descriptor: descriptor.to_string(),
        table: table.to_string(),
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
