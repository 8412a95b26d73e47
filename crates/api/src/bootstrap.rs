//! Startup: build the runtime client, register every job, freeze the
//! registry.

use std::sync::Arc;
use std::time::Duration;

use gymjobs_functions::{
    BuildContext, BuildError, FunctionRegistry, InProcessRuntime, RetryPolicy, register_handlers,
};

use crate::config::ServeConfig;
use crate::jobs;
use crate::services::Services;

/// Longest wait between two attempts of one run.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Result of a successful bootstrap.
pub struct Bootstrapped {
    pub registry: FunctionRegistry,
    pub runtime: Arc<InProcessRuntime>,
    pub services: Services,
}

/// Register every job against a fresh in-process runtime.
///
/// Any failure is fatal: a half-registered app must not start serving.
pub fn bootstrap(config: &ServeConfig, services: Services) -> Result<Bootstrapped, BuildError> {
    let runtime = Arc::new(
        InProcessRuntime::new(config.app_id.clone())
            .with_retry_policy(RetryPolicy::exponential(config.retry_base, MAX_RETRY_DELAY)),
    );

    let mut ctx = BuildContext::new(runtime.clone(), services.injector());
    register_handlers(&mut ctx, jobs::all()?)?;

    tracing::info!(
        app_id = %config.app_id,
        functions = ctx.handler_count(),
        "job functions registered"
    );

    Ok(Bootstrapped {
        registry: ctx.into_registry(),
        runtime,
        services,
    })
}
