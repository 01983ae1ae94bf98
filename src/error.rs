use thiserror::Error;

/// Errors that abort a run. Failures of individual models never surface here;
/// the sweep records them as skipped entries instead.
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("need at least 2 examples to split, got {0}")]
    TooFewExamples(usize),
    #[error("test fraction must lie strictly between 0 and 1, got {0}")]
    InvalidTestFraction(f64),
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SweepError>;
