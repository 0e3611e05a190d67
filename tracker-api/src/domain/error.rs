use thiserror::Error;

/// A stored work item could not be turned into its domain representation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConversionError(String);

impl ConversionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}
