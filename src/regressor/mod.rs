//! The trainable-model boundary and a deterministic baseline.
//!
//! The pipeline treats the regressor as an opaque collaborator behind the
//! [`TrainableRegressor`] trait: the driver hands it normalized tensors and
//! de-normalizes whatever comes back. Which descriptor blocks a run feeds
//! the model is decided by [`ModelKind`]; the graph-network architectures
//! themselves live outside this crate. [`MeanRegressor`] is the in-crate
//! baseline used for plumbing tests and as a sanity floor for real models.

use crate::encoding::TensorSet;
use crate::error::{ReaccionError, Result};
use crate::primitives::Matrix;
use crate::traits::TrainableRegressor;

/// Which model family a run trains, and therefore which descriptor blocks
/// the tensors carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Structure-only graph network, no QM descriptors.
    Gnn,
    /// Graph network with atom and bond QM descriptors.
    QmGnn,
    /// Graph network with atom, bond and reaction-level QM descriptors.
    MlQmGnn,
}

impl ModelKind {
    /// Parses the conventional configuration names.
    ///
    /// # Errors
    ///
    /// Returns [`ReaccionError::InvalidHyperparameter`] for unknown names.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "GNN" => Ok(Self::Gnn),
            "QM_GNN" => Ok(Self::QmGnn),
            "ml_QM_GNN" => Ok(Self::MlQmGnn),
            other => Err(ReaccionError::InvalidHyperparameter {
                param: "model".to_string(),
                value: other.to_string(),
                constraint: "must be one of GNN, QM_GNN, ml_QM_GNN".to_string(),
            }),
        }
    }

    /// The conventional configuration name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gnn => "GNN",
            Self::QmGnn => "QM_GNN",
            Self::MlQmGnn => "ml_QM_GNN",
        }
    }

    /// Whether tensors for this model carry atom and bond descriptor blocks.
    #[must_use]
    pub fn uses_qm_descriptors(&self) -> bool {
        !matches!(self, Self::Gnn)
    }

    /// Whether tensors for this model carry reaction-level descriptors.
    #[must_use]
    pub fn uses_reaction_descriptors(&self) -> bool {
        matches!(self, Self::MlQmGnn)
    }
}

/// Per-epoch loss curves returned by a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainHistory {
    /// Training loss per epoch.
    pub train_loss: Vec<f32>,
    /// Validation loss per epoch.
    pub valid_loss: Vec<f32>,
}

impl TrainHistory {
    /// The final validation loss, if any epoch ran.
    #[must_use]
    pub fn final_valid_loss(&self) -> Option<f32> {
        self.valid_loss.last().copied()
    }
}

/// Builds one fresh regressor per (fold, ensemble member) pair.
///
/// The driver never reuses a trained model across folds, so the factory is
/// the only place model state can enter a fold.
pub type RegressorFactory<'a> = dyn Fn(usize, usize) -> Box<dyn TrainableRegressor> + 'a;

/// Predicts the per-column mean of its training targets.
///
/// Deliberately ignores every feature block. Useful as a plumbing baseline:
/// a real model that cannot beat it on held-out folds has learned nothing.
#[derive(Debug, Clone, Default)]
pub struct MeanRegressor {
    means: Option<[f32; 2]>,
}

impl MeanRegressor {
    /// Creates an unfitted baseline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrainableRegressor for MeanRegressor {
    fn fit(&mut self, train: &TensorSet, valid: &TensorSet, epochs: usize) -> Result<TrainHistory> {
        if train.is_empty() {
            return Err(ReaccionError::Other(
                "cannot fit on an empty training set".to_string(),
            ));
        }
        let n = train.len() as f32;
        let mut means = [0.0f32; 2];
        for sample in train.samples() {
            means[0] += sample.targets[0];
            means[1] += sample.targets[1];
        }
        means[0] /= n;
        means[1] /= n;
        self.means = Some(means);

        // Constant predictor: the loss curve is flat from epoch one.
        let loss = |set: &TensorSet| -> f32 {
            if set.is_empty() {
                return 0.0;
            }
            set.samples()
                .iter()
                .map(|s| {
                    (s.targets[0] - means[0]).powi(2) + (s.targets[1] - means[1]).powi(2)
                })
                .sum::<f32>()
                / set.len() as f32
        };
        let train_loss = loss(train);
        let valid_loss = loss(valid);
        Ok(TrainHistory {
            train_loss: vec![train_loss; epochs],
            valid_loss: vec![valid_loss; epochs],
        })
    }

    fn predict(&self, x: &TensorSet) -> Result<Matrix<f32>> {
        let means = self
            .means
            .ok_or_else(|| ReaccionError::Other("predict called before fit".to_string()))?;
        let mut out = Matrix::zeros(x.len(), 2);
        for row in 0..x.len() {
            out.set(row, 0, means[0]);
            out.set(row, 1, means[1]);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::TensorEncoder;
    use crate::dataset::{ReactionDataset, ReactionRecord};
    use crate::descriptors::{AtomDescriptorTable, ReactionDescriptorTable};

    fn tensor_set(targets: &[(f32, f32)]) -> TensorSet {
        let records = targets
            .iter()
            .enumerate()
            .map(|(i, &(ea, er))| ReactionRecord {
                rxn_id: format!("r{i}"),
                rxn_smiles: "C>>C".to_string(),
                activation_energy: ea,
                reaction_energy: er,
            })
            .collect();
        let dataset = ReactionDataset::new(records);
        let atoms = AtomDescriptorTable::new();
        let reactions = ReactionDescriptorTable::new();
        let encoder = TensorEncoder::new(vec![], vec![], vec![]);
        encoder.encode(&dataset, &atoms, &reactions, None).unwrap()
    }

    #[test]
    fn test_model_kind_parse() {
        assert_eq!(ModelKind::parse("ml_QM_GNN").unwrap(), ModelKind::MlQmGnn);
        assert_eq!(ModelKind::parse("GNN").unwrap().name(), "GNN");
        assert!(ModelKind::parse("WLN").is_err());
    }

    #[test]
    fn test_model_kind_descriptor_blocks() {
        assert!(!ModelKind::Gnn.uses_qm_descriptors());
        assert!(ModelKind::QmGnn.uses_qm_descriptors());
        assert!(!ModelKind::QmGnn.uses_reaction_descriptors());
        assert!(ModelKind::MlQmGnn.uses_reaction_descriptors());
    }

    #[test]
    fn test_mean_regressor_predicts_train_mean() {
        let train = tensor_set(&[(10.0, -2.0), (20.0, 2.0)]);
        let valid = tensor_set(&[(15.0, 0.0)]);
        let mut model = MeanRegressor::new();
        let history = model.fit(&train, &valid, 3).unwrap();
        assert_eq!(history.train_loss.len(), 3);
        assert!(history.final_valid_loss().is_some());

        let preds = model.predict(&valid).unwrap();
        assert_eq!(preds.shape(), (1, 2));
        assert!((preds.get(0, 0) - 15.0).abs() < 1e-6);
        assert!((preds.get(0, 1)).abs() < 1e-6);
    }

    #[test]
    fn test_mean_regressor_unfitted_predict_fails() {
        let model = MeanRegressor::new();
        let set = tensor_set(&[(1.0, 1.0)]);
        assert!(model.predict(&set).is_err());
    }

    #[test]
    fn test_mean_regressor_empty_train_fails() {
        let empty = tensor_set(&[]);
        let mut model = MeanRegressor::new();
        assert!(model.fit(&empty, &empty, 1).is_err());
    }
}
