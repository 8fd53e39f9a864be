//! Error types for a single integrator step.

use thiserror::Error;

/// Errors that can occur while advancing one step.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("State vector is empty.")]
    EmptyState,

    #[error("State dimension mismatch: vector field expects {expected}, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid integrator settings: {what}")]
    InvalidSettings { what: String },

    #[error("Vector field evaluation failed at stage {stage}: {source}")]
    Evaluation {
        stage: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("Step produced a non-finite state (component {index}).")]
    NonFinite { index: usize },
}

pub type StepResult<T> = Result<T, StepError>;
