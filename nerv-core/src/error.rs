use thiserror::Error;

/// Custom error type for the nerv engine.
#[derive(Error, Debug, PartialEq, Clone)] // PartialEq for easier testing
pub enum NervError {
    #[error("Fan-in mismatch for variant '{variant}': expected {expected}, got {actual}")]
    FanInMismatch {
        variant: String,
        expected: usize,
        actual: usize,
    },

    #[error("Fallback key '{fallback}' is not present in the keyed source dictionary")]
    MissingFallbackKey { fallback: String },

    #[error("Keyed source representation for '{key}' has {actual} elements, expected {expected}")]
    RepresentationSizeMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cycle detected in the graph, no topological order exists.")]
    CycleDetected,

    #[error("Unknown vertex id {0}")]
    UnknownVertex(usize),

    #[error("Unknown variant '{0}'")]
    UnknownVariant(String),

    #[error("Variant '{0}' is declared more than once")]
    DuplicateVariant(String),

    #[error("Variant '{variant}' cannot be used for {operation}: it is a {kind} variant")]
    VariantMismatch {
        variant: String,
        kind: &'static str,
        operation: &'static str,
    },

    #[error("Vertex of variant '{variant}' has no parents to read from")]
    MissingParents { variant: String },

    #[error("Message from variant '{variant}' is too short: needed {needed} elements, has {actual}")]
    MessageSizeMismatch {
        variant: String,
        needed: usize,
        actual: usize,
    },

    #[error("Target of variant '{variant}' has {actual} elements, expected {expected}")]
    InvalidTarget {
        variant: String,
        expected: usize,
        actual: usize,
    },

    #[error("Variant '{variant}' is inconsistent: {reason}")]
    InconsistentVariant { variant: String, reason: String },

    #[error("Vertex of variant '{variant}' has no forward state, run forward before backward")]
    MissingForward { variant: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Parameter layouts differ, buffers cannot be combined")]
    LayoutMismatch,

    #[error("Gradient has {actual} elements but the parameters have {expected}")]
    GradientSizeMismatch { expected: usize, actual: usize },

    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperParameter(String),

    #[error("Cannot normalise over an empty batch")]
    EmptyBatch,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<serde_json::Error> for NervError {
    fn from(err: serde_json::Error) -> Self {
        NervError::Serialization(err.to_string())
    }
}
