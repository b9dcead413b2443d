use {
    std::path::PathBuf,
    thiserror::Error,
};

/// Invalid constructor arguments.
///
/// These are raised when a config is checked, which happens whenever an
/// environment, agent or training session is constructed from it. Invalid
/// values are never silently corrected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("{0} must be greater than 0")]
    NotPositive(&'static str),

    #[error("gamma must be smaller than 1, got {0}")]
    GammaTooLarge(f64),

    #[error("tau must be in the range (0.0, 1.0], got {0}")]
    TauOutOfRange(f64),

    #[error("{0} must contain at least one layer")]
    EmptyLayers(&'static str),

    #[error("{0} must not contain a layer of size 0")]
    ZeroSizedLayer(&'static str),

    #[error("{option} must be {expected} for this environment, got {got}")]
    DimensionMismatch {
        option: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("the prefill target ({target}) exceeds the replay buffer capacity ({capacity})")]
    PrefillTooLarge {
        target: usize,
        capacity: usize,
    },
}

/// Failure to restore weights from a checkpoint.
///
/// [`CheckpointError::NotFound`] is the expected outcome of a fresh run and
/// callers usually carry on with randomly initialized parameters.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("no checkpoint found at {0}")]
    NotFound(PathBuf),

    #[error("checkpoint at {path} could not be read: {reason}")]
    Unreadable {
        path: PathBuf,
        reason: String,
    },
}
