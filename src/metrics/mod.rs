//! Evaluation metrics for reaction energetics regression.
//!
//! All metrics operate on de-normalized predictions, in the original
//! energy units of the input data (typically kcal/mol).

use crate::primitives::Vector;

/// Computes the mean squared error.
///
/// # Examples
///
/// ```
/// use reaccion::metrics::mean_squared_error;
/// use reaccion::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// assert!((mean_squared_error(&y_pred, &y_true) - 0.375).abs() < 1e-6);
/// ```
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn mean_squared_error(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    if y_true.is_empty() {
        return 0.0;
    }

    let sum: f32 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    sum / y_true.len() as f32
}

/// Computes the root mean squared error.
///
/// This is the headline per-fold score of a cross-validation run.
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn root_mean_squared_error(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    mean_squared_error(y_pred, y_true).sqrt()
}

/// Computes the mean absolute error.
///
/// # Examples
///
/// ```
/// use reaccion::metrics::mean_absolute_error;
/// use reaccion::primitives::Vector;
///
/// let y_true = Vector::from_slice(&[3.0, -0.5, 2.0, 7.0]);
/// let y_pred = Vector::from_slice(&[2.5, 0.0, 2.0, 8.0]);
/// assert!((mean_absolute_error(&y_pred, &y_true) - 0.5).abs() < 1e-6);
/// ```
///
/// # Panics
///
/// Panics if vectors have different lengths.
#[must_use]
pub fn mean_absolute_error(y_pred: &Vector<f32>, y_true: &Vector<f32>) -> f32 {
    assert_eq!(y_pred.len(), y_true.len(), "Vectors must have same length");
    if y_true.is_empty() {
        return 0.0;
    }

    let sum: f32 = y_true
        .as_slice()
        .iter()
        .zip(y_pred.as_slice().iter())
        .map(|(t, p)| (t - p).abs())
        .sum();

    sum / y_true.len() as f32
}
