//! Logger scoped to one job function.

use gymjobs_core::{FunctionId, RunId};
use tracing::Span;

/// Leveled logger that tags every entry with the job id.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: FunctionId,
}

impl JobLogger {
    pub fn new(job_id: FunctionId) -> Self {
        Self { job_id }
    }

    pub fn job_id(&self) -> &FunctionId {
        &self.job_id
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(job_id = %self.job_id, "{message}");
    }

    pub fn log(&self, message: &str) {
        tracing::info!(job_id = %self.job_id, "{message}");
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(job_id = %self.job_id, "{message}");
    }

    pub fn error(&self, message: &str) {
        tracing::error!(job_id = %self.job_id, "{message}");
    }

    /// Span covering one attempt of one run.
    pub fn run_span(&self, run_id: RunId, attempt: u32) -> Span {
        tracing::info_span!("job_run", job_id = %self.job_id, %run_id, attempt)
    }
}
