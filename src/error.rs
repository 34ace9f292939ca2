//! Error types for reaccion operations.
//!
//! Record-level data-quality problems are filtered out of the dataset before
//! any fold split (see [`crate::dataset`]); everything that surfaces as a
//! [`ReaccionError`] during scaler fitting or normalization indicates a
//! non-recoverable train/test skew and aborts the run.

use std::fmt;

/// Main error type for reaccion operations.
///
/// # Examples
///
/// ```
/// use reaccion::error::ReaccionError;
///
/// let err = ReaccionError::MissingDescriptor {
///     descriptor: "partial_charge".to_string(),
///     table: "atom".to_string(),
/// };
/// assert!(err.to_string().contains("partial_charge"));
/// ```
#[derive(Debug)]
pub enum ReaccionError {
    /// A SMILES string could not be parsed into a molecular graph.
    StructureParse {
        /// The offending SMILES string
        smiles: String,
        /// Byte offset of the first unparseable character
        position: usize,
        /// Parser diagnostic
        message: String,
    },

    /// An element type appears in validation/test data but was absent from
    /// the training-fold reference when the atom-type scalers were fitted.
    UnseenAtomType {
        /// Element symbol (e.g. "Se")
        element: String,
        /// Descriptor whose scaler lookup failed
        descriptor: String,
    },

    /// A descriptor column required by the configuration is absent from the
    /// supplied table.
    MissingDescriptor {
        /// Descriptor column name
        descriptor: String,
        /// Which table ("atom" or "reaction")
        table: String,
    },

    /// Invalid hyperparameter value provided.
    InvalidHyperparameter {
        /// Parameter name
        param: String,
        /// Provided value
        value: String,
        /// Constraint description
        constraint: String,
    },

    /// Tensor/vector dimensions don't match for the operation.
    DimensionMismatch {
        /// Expected dimensions description
        expected: String,
        /// Actual dimensions found
        actual: String,
    },

    /// I/O error (file not found, permission denied, etc.).
    Io(std::io::Error),

    /// Serialization/deserialization error.
    Serialization(String),

    /// Generic error with string message.
    Other(String),
}

impl ReaccionError {
    /// Convenience constructor for dimension mismatches.
    #[must_use]
    pub fn dimension_mismatch(
        context: &str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        ReaccionError::DimensionMismatch {
            expected: format!("{context}={expected}"),
            actual: actual.to_string(),
        }
    }
}

impl fmt::Display for ReaccionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReaccionError::StructureParse {
                smiles,
                position,
                message,
            } => {
                write!(
                    f,
                    "Cannot parse structure {smiles:?} at position {position}: {message}"
                )
            }
            ReaccionError::UnseenAtomType {
                element,
                descriptor,
            } => {
                write!(
                    f,
                    "Atom type {element} has no fitted scaler for descriptor {descriptor:?}: \
                     element absent from the training-fold reference"
                )
            }
            ReaccionError::MissingDescriptor { descriptor, table } => {
                write!(
                    f,
                    "Descriptor column {descriptor:?} missing from the {table} descriptor table"
                )
            }
            ReaccionError::InvalidHyperparameter {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid hyperparameter: {param} = {value}, expected {constraint}"
                )
            }
            ReaccionError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            ReaccionError::Io(e) => write!(f, "I/O error: {e}"),
            ReaccionError::Serialization(msg) => write!(f, "Serialization error: {msg}"),
            ReaccionError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ReaccionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReaccionError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReaccionError {
    fn from(err: std::io::Error) -> Self {
        ReaccionError::Io(err)
    }
}

impl From<serde_json::Error> for ReaccionError {
    fn from(err: serde_json::Error) -> Self {
        ReaccionError::Serialization(err.to_string())
    }
}

impl From<&str> for ReaccionError {
    fn from(msg: &str) -> Self {
        ReaccionError::Other(msg.to_string())
    }
}

impl From<String> for ReaccionError {
    fn from(msg: String) -> Self {
        ReaccionError::Other(msg)
    }
}

/// Result type alias for reaccion operations.
pub type Result<T> = std::result::Result<T, ReaccionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structure_parse_display() {
        let err = ReaccionError::StructureParse {
            smiles: "C1CC".to_string(),
            position: 1,
            message: "unclosed ring bond 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("C1CC"));
        assert!(msg.contains("position 1"));
        assert!(msg.contains("unclosed ring bond"));
    }

    #[test]
    fn test_unseen_atom_type_display() {
        let err = ReaccionError::UnseenAtomType {
            element: "Se".to_string(),
            descriptor: "NMR".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("Se"));
        assert!(msg.contains("NMR"));
        assert!(msg.contains("training-fold reference"));
    }

    #[test]
    fn test_missing_descriptor_display() {
        let err = ReaccionError::MissingDescriptor {
            descriptor: "fukui_elec".to_string(),
            table: "atom".to_string(),
        };
        assert!(err.to_string().contains("fukui_elec"));
    }

    #[test]
    fn test_invalid_hyperparameter_display() {
        let err = ReaccionError::InvalidHyperparameter {
            param: "sample".to_string(),
            value: "5000".to_string(),
            constraint: "<= training pool size (1200)".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("sample = 5000"));
        assert!(msg.contains("1200"));
    }

    #[test]
    fn test_dimension_mismatch_helper() {
        let err = ReaccionError::dimension_mismatch("atoms", 12, 9);
        let msg = err.to_string();
        assert!(msg.contains("atoms=12"));
        assert!(msg.contains('9'));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err: ReaccionError = io_err.into();
        assert!(matches!(err, ReaccionError::Io(_)));
    }

    #[test]
    fn test_from_str_and_string() {
        let err: ReaccionError = "plain message".into();
        assert_eq!(err.to_string(), "plain message");
        let err: ReaccionError = String::from("owned message").into();
        assert_eq!(err.to_string(), "owned message");
    }

    #[test]
    fn test_error_source_io() {
        use std::error::Error;
        let err = ReaccionError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        assert!(err.source().is_some());
        let err = ReaccionError::Other("x".to_string());
        assert!(err.source().is_none());
    }
}
