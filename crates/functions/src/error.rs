//! Construction failures.

use gymjobs_core::{ConfigError, FunctionId};

/// A job function could not be constructed.
///
/// Business failures never show up here: they travel as `anyhow::Error`
/// through the execution body so the runtime can decide on retries.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The runtime client refused the function description.
    #[error("runtime rejected function `{id}`: {reason}")]
    Rejected { id: FunctionId, reason: String },
}

impl BuildError {
    pub fn rejected(id: &FunctionId, reason: impl Into<String>) -> Self {
        Self::Rejected {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}
