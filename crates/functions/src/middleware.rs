//! Logging decorator around execution bodies.

use std::sync::Arc;

use futures::FutureExt;
use tracing::Instrument;

use crate::logger::JobLogger;
use crate::runtime::{ExecutionBody, Invocation};

/// Wrap `body` so every attempt runs inside a `job_run` span, logs at debug
/// before and after, and logs failures at error level.
///
/// The error is returned unchanged so the runtime still sees the original
/// value and can decide on retries.
pub fn observe(logger: JobLogger, body: ExecutionBody) -> ExecutionBody {
    Arc::new(move |invocation: Invocation| {
        let logger = logger.clone();
        let (run_id, attempt) = (invocation.run_id, invocation.attempt);
        let span = logger.run_span(run_id, attempt);
        let pending = body(invocation);

        async move {
            logger.debug("handler started");
            match pending.await {
                Ok(output) => {
                    logger.debug("handler completed");
                    Ok(output)
                }
                Err(err) => {
                    tracing::error!(
                        job_id = %logger.job_id(),
                        %run_id,
                        attempt,
                        error = %format!("{err:#}"),
                        "job handler failed"
                    );
                    Err(err)
                }
            }
        }
        .instrument(span)
        .boxed()
    })
}
