//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use reaccion::prelude::*;
//! ```

pub use crate::cross_validation::{CrossValReport, CrossValidation, FoldScore};
pub use crate::dataset::{reaction_to_reactants, ReactionDataset, ReactionRecord};
pub use crate::descriptors::{AtomDescriptorTable, ReactionDescriptorTable};
pub use crate::encoding::{bond_to_matrix, ReactionTensors, TensorEncoder, TensorSet};
pub use crate::error::{ReaccionError, Result};
pub use crate::metrics::{mean_absolute_error, mean_squared_error, root_mean_squared_error};
pub use crate::model_selection::{CrossValSplitter, Fold};
pub use crate::normalize::{DescriptorNormalizer, ScalerBundle};
pub use crate::preprocessing::{MinMaxScaler, StandardScaler};
pub use crate::primitives::{Matrix, Vector};
pub use crate::regressor::{MeanRegressor, ModelKind, TrainHistory};
pub use crate::structure::{resolve, Molecule};
pub use crate::traits::{Scaler, TrainableRegressor};
