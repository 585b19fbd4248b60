use ndarray_linalg::error::LinalgError;
use std::fmt;

/// Fatal failure modes of the propagator. Frustrated hops and decoherence
/// damping are step diagnostics, not errors.
#[derive(Debug)]
pub enum DynamicsError {
    /// Eigen-decomposition or matrix inversion returned a nonzero status.
    /// Not recoverable, a failed diagonalization invalidates all downstream
    /// state of the step.
    Solver {
        operation: &'static str,
        source: LinalgError,
    },
    /// The electronic-structure provider did not return a usable result.
    Provider(String),
    /// Inconsistent configuration, detected before the first step.
    Config(String),
}

impl DynamicsError {
    pub fn solver(operation: &'static str) -> impl FnOnce(LinalgError) -> DynamicsError {
        move |source| DynamicsError::Solver { operation, source }
    }
}

impl fmt::Display for DynamicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicsError::Solver { operation, source } => {
                write!(f, "linear algebra failure in {}: {}", operation, source)
            }
            DynamicsError::Provider(msg) => {
                write!(f, "electronic structure provider failed: {}", msg)
            }
            DynamicsError::Config(msg) => write!(f, "inconsistent configuration: {}", msg),
        }
    }
}

impl std::error::Error for DynamicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DynamicsError::Solver { source, .. } => Some(source),
            _ => None,
        }
    }
}
