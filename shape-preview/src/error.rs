//! Error type shared by the weight generator and the allocation engine

use thiserror::Error;

/// Every failure in the core is a rejected input value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PreviewError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PreviewError::InvalidArgument(message.into())
    }

    /// The precondition that failed, without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            PreviewError::InvalidArgument(message) => message,
        }
    }
}

pub type Result<T> = std::result::Result<T, PreviewError>;
