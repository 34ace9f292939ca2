//! Core numeric value types (Vector, Matrix).
//!
//! These types carry normalized descriptor tensors and prediction vectors
//! through the pipeline. Row-major storage, `f32` throughout.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
