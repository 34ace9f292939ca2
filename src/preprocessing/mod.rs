//! Scaling transforms for descriptor and target normalization.
//!
//! Both scalers operate on pooled streams of scalar values rather than
//! feature matrices: descriptor columns are ragged (one variable-length
//! vector per molecule), so fitting pools every value of a column (or of an
//! element group) into one slice and transformation is applied elementwise.
//!
//! # Example
//!
//! ```
//! use reaccion::prelude::*;
//!
//! let mut scaler = StandardScaler::new();
//! scaler.fit(&[1.0, 2.0, 3.0, 4.0]).unwrap();
//! let z = scaler.transform(2.5);
//! assert!(z.abs() < 1e-6); // 2.5 is the mean
//! ```

use crate::error::{ReaccionError, Result};
use crate::traits::Scaler;
use serde::{Deserialize, Serialize};

/// Scales values to a given range (default [0, 1]).
///
/// The transformation is: x' = (x - min) / (max - min)
///
/// Used for atom-level descriptors, either per descriptor column or per
/// element type within an atom-type-scaled column.
///
/// # Example
///
/// ```
/// use reaccion::prelude::*;
///
/// let mut scaler = MinMaxScaler::new();
/// scaler.fit(&[0.0, 5.0, 10.0]).unwrap();
/// assert!((scaler.transform(5.0) - 0.5).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    /// Minimum of the reference values (computed during fit).
    data_min: Option<f32>,
    /// Maximum of the reference values (computed during fit).
    data_max: Option<f32>,
    /// Target minimum for scaling (default 0.0).
    feature_min: f32,
    /// Target maximum for scaling (default 1.0).
    feature_max: f32,
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl MinMaxScaler {
    /// Creates a new `MinMaxScaler` with default range [0, 1].
    #[must_use]
    pub fn new() -> Self {
        Self {
            data_min: None,
            data_max: None,
            feature_min: 0.0,
            feature_max: 1.0,
        }
    }

    /// Sets the target range for scaling.
    #[must_use]
    pub fn with_range(mut self, min: f32, max: f32) -> Self {
        self.feature_min = min;
        self.feature_max = max;
        self
    }

    /// Returns the minimum of the reference values.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn data_min(&self) -> f32 {
        self.data_min.expect("Scaler not fitted. Call fit() first.")
    }

    /// Returns the maximum of the reference values.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn data_max(&self) -> f32 {
        self.data_max.expect("Scaler not fitted. Call fit() first.")
    }
}

impl Scaler for MinMaxScaler {
    /// Computes the min and max of the reference values.
    fn fit(&mut self, values: &[f32]) -> Result<()> {
        if values.is_empty() {
            return Err(ReaccionError::from("Cannot fit scaler on zero values"));
        }
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for &v in values {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
        self.data_min = Some(min);
        self.data_max = Some(max);
        Ok(())
    }

    fn transform(&self, x: f32) -> f32 {
        let min = self.data_min.expect("Scaler not fitted. Call fit() first.");
        let max = self.data_max.expect("Scaler not fitted. Call fit() first.");
        let data_range = max - min;
        let feature_range = self.feature_max - self.feature_min;
        if data_range.abs() > 1e-10 {
            (x - min) / data_range * feature_range + self.feature_min
        } else {
            // Degenerate column: every reference value identical.
            self.feature_min
        }
    }

    fn inverse_transform(&self, x: f32) -> f32 {
        let min = self.data_min.expect("Scaler not fitted. Call fit() first.");
        let max = self.data_max.expect("Scaler not fitted. Call fit() first.");
        let data_range = max - min;
        let feature_range = self.feature_max - self.feature_min;
        if data_range.abs() > 1e-10 {
            (x - self.feature_min) / feature_range * data_range + min
        } else {
            min
        }
    }

    fn is_fitted(&self) -> bool {
        self.data_min.is_some()
    }
}

/// Standardizes values by removing the mean and scaling to unit variance.
///
/// The standard score is: z = (x - mean) / std
///
/// Used for reaction-level descriptor columns and for the target energies
/// (whose scaler is inverted on predictions before scoring).
///
/// # Example
///
/// ```
/// use reaccion::prelude::*;
///
/// let mut scaler = StandardScaler::new();
/// scaler.fit(&[0.0, 10.0, 20.0]).unwrap();
/// let z = scaler.transform(10.0);
/// assert!(z.abs() < 1e-6);
/// assert!((scaler.inverse_transform(z) - 10.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of the reference values (computed during fit).
    mean: Option<f32>,
    /// Standard deviation of the reference values (computed during fit).
    std: Option<f32>,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates a new `StandardScaler`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
        }
    }

    /// Returns the mean of the reference values.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn mean(&self) -> f32 {
        self.mean.expect("Scaler not fitted. Call fit() first.")
    }

    /// Returns the standard deviation of the reference values.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn std(&self) -> f32 {
        self.std.expect("Scaler not fitted. Call fit() first.")
    }
}

impl Scaler for StandardScaler {
    /// Computes the mean and (population) standard deviation.
    fn fit(&mut self, values: &[f32]) -> Result<()> {
        if values.is_empty() {
            return Err(ReaccionError::from("Cannot fit scaler on zero values"));
        }
        let n = values.len() as f32;
        let mean = values.iter().sum::<f32>() / n;
        let var = values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f32>() / n;
        self.mean = Some(mean);
        self.std = Some(var.sqrt());
        Ok(())
    }

    fn transform(&self, x: f32) -> f32 {
        let mean = self.mean.expect("Scaler not fitted. Call fit() first.");
        let std = self.std.expect("Scaler not fitted. Call fit() first.");
        if std > 1e-10 {
            (x - mean) / std
        } else {
            x - mean
        }
    }

    fn inverse_transform(&self, x: f32) -> f32 {
        let mean = self.mean.expect("Scaler not fitted. Call fit() first.");
        let std = self.std.expect("Scaler not fitted. Call fit() first.");
        if std > 1e-10 {
            x * std + mean
        } else {
            x + mean
        }
    }

    fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }
}


#[cfg(test)]
#[path = "tests_scaling_contract.rs"]
mod tests_scaling_contract;
