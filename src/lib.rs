//! Reaccion: descriptor normalization and cross-validation for
//! reaction-energetics models, in pure Rust.
//!
//! Reaccion owns everything between a raw reaction dataset and a trainable
//! graph regressor: resolving reactant structures from SMILES, scaling
//! quantum-chemical descriptor tables without training/test leakage,
//! assembling model-ready tensors, and driving an ensembled k-fold
//! evaluation that reports RMSE and MAE per fold.
//!
//! # Quick Start
//!
//! ```
//! use reaccion::prelude::*;
//!
//! // Fit scalers on a training reference, apply them anywhere.
//! let mut scaler = MinMaxScaler::new();
//! scaler.fit(&[-0.8, -0.4, 0.1, 0.4]).unwrap();
//! assert!((scaler.transform(0.4) - 1.0).abs() < 1e-6);
//!
//! // Resolve a reactant structure with explicit hydrogens.
//! let mol = resolve("CCO").unwrap();
//! assert_eq!(mol.atom_count(), 9);
//! assert_eq!(mol.heavy_atom_count(), 3);
//! ```
//!
//! # Modules
//!
//! - [`primitives`]: Core Vector and Matrix types
//! - [`dataset`]: Reaction records and seeded dataset handling
//! - [`descriptors`]: Atom- and reaction-level descriptor tables
//! - [`structure`]: SMILES resolution into hydrogen-complete graphs
//! - [`preprocessing`]: Min-max and standard scalers
//! - [`normalize`]: Leakage-safe descriptor normalization
//! - [`encoding`]: Tensor assembly for the model boundary
//! - [`model_selection`]: Fold splitting with per-member reshuffling
//! - [`metrics`]: Regression metrics (RMSE, MAE)
//! - [`regressor`]: The trainable-model boundary and baseline
//! - [`cross_validation`]: The ensembled k-fold driver

pub mod cross_validation;
pub mod dataset;
pub mod descriptors;
pub mod encoding;
pub mod error;
pub mod metrics;
pub mod model_selection;
pub mod normalize;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod regressor;
pub mod structure;
pub mod traits;
