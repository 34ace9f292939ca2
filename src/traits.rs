//! Core traits for scalers and the external model boundary.
//!
//! These traits define the API contracts between the normalization pipeline
//! and its collaborators.

use crate::encoding::TensorSet;
use crate::error::Result;
use crate::primitives::Matrix;
use crate::regressor::TrainHistory;

/// A fitted numeric transform over a pooled stream of scalar values.
///
/// Scalers are fit once on a designated reference set (the training fold) and
/// never refit within a fold; `transform` is a pure function of the fitted
/// parameters.
///
/// # Examples
///
/// ```
/// use reaccion::prelude::*;
///
/// let mut scaler = MinMaxScaler::new();
/// scaler.fit(&[2.0, 4.0, 6.0]).unwrap();
/// assert!((scaler.transform(2.0) - 0.0).abs() < 1e-6);
/// assert!((scaler.transform(6.0) - 1.0).abs() < 1e-6);
/// ```
pub trait Scaler {
    /// Fits the transform parameters to the reference values.
    ///
    /// # Errors
    ///
    /// Returns an error if `values` is empty.
    fn fit(&mut self, values: &[f32]) -> Result<()>;

    /// Transforms a single value using the fitted parameters.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    fn transform(&self, x: f32) -> f32;

    /// Maps a transformed value back to the original scale.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    fn inverse_transform(&self, x: f32) -> f32;

    /// Returns true if the scaler has been fitted.
    fn is_fitted(&self) -> bool;

    /// Transforms a slice of values elementwise.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    fn transform_slice(&self, values: &[f32]) -> Vec<f32> {
        values.iter().map(|&x| self.transform(x)).collect()
    }
}

/// The external trainable model boundary.
///
/// The cross-validation driver hands the model already-normalized tensors and
/// de-normalizes its raw predictions before scoring; the model itself (its
/// architecture, optimizer, batching) is an opaque collaborator. The `fit`
/// call is synchronous: it blocks until training completes.
///
/// Predictions are a `(n_reactions, 2)` matrix in normalized units, column 0
/// the activation energy and column 1 the reaction energy.
pub trait TrainableRegressor {
    /// Trains on the training tensors, monitoring the validation tensors.
    ///
    /// # Errors
    ///
    /// Returns an error if the tensors are inconsistent or training fails.
    fn fit(&mut self, train: &TensorSet, valid: &TensorSet, epochs: usize) -> Result<TrainHistory>;

    /// Predicts normalized targets for the given tensors.
    ///
    /// # Errors
    ///
    /// Returns an error if called before `fit` or on inconsistent tensors.
    fn predict(&self, x: &TensorSet) -> Result<Matrix<f32>>;
}
