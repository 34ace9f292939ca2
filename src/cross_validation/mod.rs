//! Ensembled k-fold cross-validation driver.
//!
//! One `run` owns the whole evaluation protocol: pre-filtering records with
//! unusable descriptors, a single seeded shuffle, and for every fold an
//! ensemble of freshly built regressors. All scaler fitting inside a fold is
//! scoped to that fold's training split, so no statistic of a held-out
//! reaction ever reaches a scaler, and the per-member seeds make a run
//! reproducible end to end from one `random_state`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::dataset::{reaction_to_reactants, ReactionDataset};
use crate::descriptors::{AtomDescriptorTable, ReactionDescriptorTable};
use crate::encoding::TensorEncoder;
use crate::error::Result;
use crate::metrics::{mean_absolute_error, root_mean_squared_error};
use crate::model_selection::CrossValSplitter;
use crate::normalize::DescriptorNormalizer;
use crate::preprocessing::StandardScaler;
use crate::primitives::{Matrix, Vector};
use crate::regressor::{ModelKind, RegressorFactory};
use crate::traits::Scaler;

/// Default atom-level descriptor columns.
pub const DEFAULT_ATOM_DESCRIPTORS: &[&str] =
    &["partial_charge", "fukui_elec", "fukui_neu", "NMR"];

/// Default bond-level descriptor columns.
pub const DEFAULT_BOND_DESCRIPTORS: &[&str] = &["bond_order", "bond_length"];

/// Default reaction-level descriptor columns.
pub const DEFAULT_REACTION_DESCRIPTORS: &[&str] = &["G", "E_r", "G_alt1", "G_alt2"];

/// Scores of one fold, in original energy units.
#[derive(Debug, Clone, PartialEq)]
pub struct FoldScore {
    /// Fold index in `0..k`.
    pub fold: usize,
    /// RMSE of the activation energy on the held-out slice.
    pub activation_rmse: f32,
    /// MAE of the activation energy on the held-out slice.
    pub activation_mae: f32,
    /// RMSE of the reaction energy on the held-out slice.
    pub reaction_rmse: f32,
    /// MAE of the reaction energy on the held-out slice.
    pub reaction_mae: f32,
}

/// The result of a full cross-validation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossValReport {
    /// Per-fold scores, in fold order.
    pub folds: Vec<FoldScore>,
    /// Records removed by the descriptor pre-filter before splitting.
    pub dropped_records: usize,
}

impl CrossValReport {
    /// Mean activation-energy RMSE across folds.
    #[must_use]
    pub fn mean_activation_rmse(&self) -> f32 {
        mean(self.folds.iter().map(|f| f.activation_rmse))
    }

    /// Mean activation-energy MAE across folds.
    #[must_use]
    pub fn mean_activation_mae(&self) -> f32 {
        mean(self.folds.iter().map(|f| f.activation_mae))
    }

    /// Mean reaction-energy RMSE across folds.
    #[must_use]
    pub fn mean_reaction_rmse(&self) -> f32 {
        mean(self.folds.iter().map(|f| f.reaction_rmse))
    }

    /// Mean reaction-energy MAE across folds.
    #[must_use]
    pub fn mean_reaction_mae(&self) -> f32 {
        mean(self.folds.iter().map(|f| f.reaction_mae))
    }
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let collected: Vec<f32> = values.collect();
    if collected.is_empty() {
        return 0.0;
    }
    collected.iter().sum::<f32>() / collected.len() as f32
}

/// Configuration and entry point for a cross-validation run.
///
/// Built with the usual chained setters; every field has the conventional
/// default, so `CrossValidation::new(10).run(..)` reproduces the standard
/// 10-fold protocol.
#[derive(Debug, Clone)]
pub struct CrossValidation {
    k: usize,
    ensemble_size: usize,
    epochs: usize,
    random_state: u64,
    sample: Option<usize>,
    valid_fraction: f32,
    model: ModelKind,
    atom_descriptors: Vec<String>,
    bond_descriptors: Vec<String>,
    reaction_descriptors: Vec<String>,
    held_out_ids: Option<HashSet<String>>,
    output_dir: Option<PathBuf>,
}

impl CrossValidation {
    /// Creates a run configuration with `k` folds and default settings:
    /// ensemble size 1, 100 epochs, random state 0, 10% validation split,
    /// the full quantum-descriptor model, and the default descriptor
    /// columns.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ensemble_size: 1,
            epochs: 100,
            random_state: 0,
            sample: None,
            valid_fraction: 0.1,
            model: ModelKind::MlQmGnn,
            atom_descriptors: to_strings(DEFAULT_ATOM_DESCRIPTORS),
            bond_descriptors: to_strings(DEFAULT_BOND_DESCRIPTORS),
            reaction_descriptors: to_strings(DEFAULT_REACTION_DESCRIPTORS),
            held_out_ids: None,
            output_dir: None,
        }
    }

    /// Sets the number of regressors trained and averaged per fold.
    #[must_use]
    pub fn with_ensemble_size(mut self, ensemble_size: usize) -> Self {
        self.ensemble_size = ensemble_size.max(1);
        self
    }

    /// Sets the training epochs handed to each regressor.
    #[must_use]
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Sets the base random state for the shuffle and all member seeds.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Caps the per-fold training pool for learning-curve runs.
    #[must_use]
    pub fn with_sample(mut self, sample: usize) -> Self {
        self.sample = Some(sample);
        self
    }

    /// Sets the validation fraction of the non-test pool.
    #[must_use]
    pub fn with_valid_fraction(mut self, fraction: f32) -> Self {
        self.valid_fraction = fraction;
        self
    }

    /// Selects the model family, which decides the descriptor blocks fed
    /// to the regressor.
    #[must_use]
    pub fn with_model(mut self, model: ModelKind) -> Self {
        self.model = model;
        self
    }

    /// Overrides the atom-level descriptor columns.
    #[must_use]
    pub fn with_atom_descriptors(mut self, columns: Vec<String>) -> Self {
        self.atom_descriptors = columns;
        self
    }

    /// Overrides the bond-level descriptor columns.
    #[must_use]
    pub fn with_bond_descriptors(mut self, columns: Vec<String>) -> Self {
        self.bond_descriptors = columns;
        self
    }

    /// Overrides the reaction-level descriptor columns.
    #[must_use]
    pub fn with_reaction_descriptors(mut self, columns: Vec<String>) -> Self {
        self.reaction_descriptors = columns;
        self
    }

    /// Evaluates every fold on the named reactions instead of the rotating
    /// slice; the folds then only vary the train/validation partition.
    #[must_use]
    pub fn with_held_out_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.held_out_ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    /// Writes `test_predicted_{fold}.csv` files into this directory.
    #[must_use]
    pub fn with_output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Runs the full protocol and returns per-fold scores.
    ///
    /// The `factory` is called once per (fold, member) pair and must return
    /// a fresh, untrained regressor.
    ///
    /// # Errors
    ///
    /// Propagates structure-resolution, descriptor-lookup, splitting, model
    /// and I/O errors; any of these aborts the run.
    pub fn run(
        &self,
        dataset: ReactionDataset,
        atoms: &AtomDescriptorTable,
        reactions: &ReactionDescriptorTable,
        factory: &RegressorFactory<'_>,
    ) -> Result<CrossValReport> {
        let mut dataset = dataset;

        // Records with unusable descriptor rows are dropped before the
        // shuffle so fold boundaries never shift mid-run.
        let mut dropped = 0;
        if self.model.uses_qm_descriptors() {
            let required: Vec<&str> = self
                .atom_descriptors
                .iter()
                .chain(self.bond_descriptors.iter())
                .map(String::as_str)
                .collect();
            let invalid: HashSet<String> =
                atoms.invalid_structures(&required).into_iter().collect();
            dropped = dataset.drop_invalid_records(&invalid);
            if dropped > 0 {
                info!("dropped {dropped} records with unusable descriptors");
            }
        }

        let dataset = dataset.shuffled(self.random_state);
        let n = dataset.len();
        info!(
            "cross-validation: {} records, k={}, ensemble={}, model={}",
            n,
            self.k,
            self.ensemble_size,
            self.model.name()
        );

        let mut splitter = CrossValSplitter::new(self.k)
            .with_random_state(self.random_state)
            .with_valid_fraction(self.valid_fraction);
        if let Some(sample) = self.sample {
            splitter = splitter.with_sample(sample);
        }
        if let Some(ids) = &self.held_out_ids {
            let indices: Vec<usize> = dataset
                .rxn_ids()
                .iter()
                .enumerate()
                .filter(|(_, id)| ids.contains(**id))
                .map(|(i, _)| i)
                .collect();
            if indices.is_empty() {
                return Err(crate::error::ReaccionError::InvalidHyperparameter {
                    param: "held_out_ids".to_string(),
                    value: ids.len().to_string(),
                    constraint: "must name at least one record in the dataset".to_string(),
                });
            }
            if indices.len() != ids.len() {
                info!(
                    "held-out set: {} of {} requested ids present",
                    indices.len(),
                    ids.len()
                );
            }
            splitter = splitter.with_held_out(indices);
        }

        let normalizer = DescriptorNormalizer::new();
        let mut fold_scores = Vec::with_capacity(self.k);

        for fold_idx in 0..self.k {
            let test_indices = splitter.test_indices(n, fold_idx);
            let test_ds = dataset.subset(&test_indices);
            let (true_activation, true_reaction) = test_ds.targets();

            let mut prediction_sum = Matrix::zeros(test_ds.len(), 2);

            for member in 0..self.ensemble_size {
                let fold = splitter.fold_indices(n, fold_idx, member)?;
                debug_assert_eq!(fold.test, test_indices);
                let train_ds = dataset.subset(&fold.train);
                let valid_ds = dataset.subset(&fold.valid);

                let predictions = self.train_member(
                    &train_ds, &valid_ds, &test_ds, atoms, reactions, &normalizer,
                    factory, fold_idx, member,
                )?;
                for row in 0..test_ds.len() {
                    for col in 0..2 {
                        prediction_sum.set(
                            row,
                            col,
                            prediction_sum.get(row, col) + predictions.get(row, col),
                        );
                    }
                }
            }

            let scale = 1.0 / self.ensemble_size as f32;
            let predicted_activation = Vector::from_vec(
                (0..test_ds.len()).map(|r| prediction_sum.get(r, 0) * scale).collect(),
            );
            let predicted_reaction = Vector::from_vec(
                (0..test_ds.len()).map(|r| prediction_sum.get(r, 1) * scale).collect(),
            );

            if let Some(dir) = &self.output_dir {
                write_predictions(
                    dir,
                    fold_idx,
                    &test_ds.rxn_ids(),
                    &predicted_activation,
                    &predicted_reaction,
                )?;
            }

            let score = FoldScore {
                fold: fold_idx,
                activation_rmse: root_mean_squared_error(&predicted_activation, &true_activation),
                activation_mae: mean_absolute_error(&predicted_activation, &true_activation),
                reaction_rmse: root_mean_squared_error(&predicted_reaction, &true_reaction),
                reaction_mae: mean_absolute_error(&predicted_reaction, &true_reaction),
            };
            info!(
                "fold {}: activation RMSE {:.4} MAE {:.4}, reaction RMSE {:.4} MAE {:.4}",
                fold_idx,
                score.activation_rmse,
                score.activation_mae,
                score.reaction_rmse,
                score.reaction_mae
            );
            fold_scores.push(score);
        }

        let report = CrossValReport {
            folds: fold_scores,
            dropped_records: dropped,
        };
        info!(
            "means: activation RMSE {:.4} MAE {:.4}, reaction RMSE {:.4} MAE {:.4}",
            report.mean_activation_rmse(),
            report.mean_activation_mae(),
            report.mean_reaction_rmse(),
            report.mean_reaction_mae()
        );
        Ok(report)
    }

    /// Trains one ensemble member and returns de-normalized test
    /// predictions as an `(n_test, 2)` matrix.
    #[allow(clippy::too_many_arguments)]
    fn train_member(
        &self,
        train_ds: &ReactionDataset,
        valid_ds: &ReactionDataset,
        test_ds: &ReactionDataset,
        atoms: &AtomDescriptorTable,
        reactions: &ReactionDescriptorTable,
        normalizer: &DescriptorNormalizer,
        factory: &RegressorFactory<'_>,
        fold_idx: usize,
        member: usize,
    ) -> Result<Matrix<f32>> {
        // Scaler fitting is scoped to this member's training split.
        let (scaled_atoms, scaled_reactions) = if self.model.uses_qm_descriptors() {
            let atom_columns: Vec<String> = self
                .atom_descriptors
                .iter()
                .chain(self.bond_descriptors.iter())
                .cloned()
                .collect();
            let reaction_columns: Vec<String> = if self.model.uses_reaction_descriptors() {
                self.reaction_descriptors.clone()
            } else {
                Vec::new()
            };
            let train_structures: HashSet<String> =
                reaction_to_reactants(train_ds.rxn_smiles().into_iter())
                    .into_iter()
                    .collect();
            let train_rxns: HashSet<String> =
                train_ds.rxn_smiles().iter().map(|s| (*s).to_string()).collect();

            // Transformation covers only the rows this member references;
            // rows orphaned by the record pre-filter are never touched.
            let used_structures: HashSet<String> = reaction_to_reactants(
                train_ds
                    .rxn_smiles()
                    .into_iter()
                    .chain(valid_ds.rxn_smiles())
                    .chain(test_ds.rxn_smiles()),
            )
            .into_iter()
            .collect();
            let mut used_rxns = train_rxns.clone();
            for ds in [valid_ds, test_ds] {
                used_rxns.extend(ds.rxn_smiles().iter().map(|s| (*s).to_string()));
            }

            let bundle = normalizer.fit(
                atoms,
                &atom_columns,
                reactions,
                &reaction_columns,
                Some(&train_structures),
                Some(&train_rxns),
            )?;
            let scaled_atoms = normalizer.transform_atoms(
                atoms,
                &atom_columns,
                &bundle,
                Some(&used_structures),
            )?;
            let scaled_reactions = normalizer.transform_reactions(
                reactions,
                &reaction_columns,
                &bundle,
                Some(&used_rxns),
            )?;
            (scaled_atoms, scaled_reactions)
        } else {
            (AtomDescriptorTable::new(), ReactionDescriptorTable::new())
        };

        // Target scalers are member-local too.
        let (train_activation, train_reaction) = train_ds.targets();
        let mut activation_scaler = StandardScaler::new();
        activation_scaler.fit(train_activation.as_slice())?;
        let mut reaction_scaler = StandardScaler::new();
        reaction_scaler.fit(train_reaction.as_slice())?;

        let encoder = self.encoder();
        let target_scalers = Some((&activation_scaler, &reaction_scaler));
        let train = encoder.encode(train_ds, &scaled_atoms, &scaled_reactions, target_scalers)?;
        let valid = encoder.encode(valid_ds, &scaled_atoms, &scaled_reactions, target_scalers)?;
        let test = encoder.encode(test_ds, &scaled_atoms, &scaled_reactions, target_scalers)?;

        let mut model = factory(fold_idx, member);
        let history = model.fit(&train, &valid, self.epochs)?;
        if let Some(loss) = history.final_valid_loss() {
            info!("fold {fold_idx} member {member}: final validation loss {loss:.6}");
        }
        let raw = model.predict(&test)?;

        let mut predictions = Matrix::zeros(test.len(), 2);
        for row in 0..test.len() {
            predictions.set(row, 0, activation_scaler.inverse_transform(raw.get(row, 0)));
            predictions.set(row, 1, reaction_scaler.inverse_transform(raw.get(row, 1)));
        }
        Ok(predictions)
    }

    fn encoder(&self) -> TensorEncoder {
        if !self.model.uses_qm_descriptors() {
            return TensorEncoder::new(Vec::new(), Vec::new(), Vec::new());
        }
        let reaction = if self.model.uses_reaction_descriptors() {
            self.reaction_descriptors.clone()
        } else {
            Vec::new()
        };
        TensorEncoder::new(
            self.atom_descriptors.clone(),
            self.bond_descriptors.clone(),
            reaction,
        )
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

/// Writes one fold's ensemble-mean predictions as
/// `test_predicted_{fold}.csv`.
fn write_predictions(
    dir: &Path,
    fold: usize,
    rxn_ids: &[&str],
    activation: &Vector<f32>,
    reaction: &Vector<f32>,
) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("test_predicted_{fold}.csv"));
    let mut writer = BufWriter::new(File::create(&path)?);
    writeln!(
        writer,
        "rxn_id,predicted_activation_energy,predicted_reaction_energy"
    )?;
    for (i, id) in rxn_ids.iter().enumerate() {
        writeln!(writer, "{},{},{}", id, activation.get(i), reaction.get(i))?;
    }
    writer.flush()?;
    Ok(())
}
