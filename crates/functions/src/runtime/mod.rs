//! Job-runtime client seam.
//!
//! The runtime owns scheduling, retries, concurrency limiting and invocation
//! transport. This layer only hands it a description plus an execution body
//! and keeps the handle it returns.

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;

use gymjobs_core::{FunctionId, JobEvent, JobFunctionConfig, RunId, TriggerSpec};

use crate::error::BuildError;
use crate::step::StepFacade;

pub mod in_process;
pub mod rate_limit;
pub mod retry;

pub use in_process::{InProcessRuntime, RunOutcome, RunReport};
pub use rate_limit::RateLimiter;
pub use retry::{BackoffStrategy, RetryPolicy};

/// Per-invocation data the runtime provides when it calls a function.
#[derive(Clone)]
pub struct Invocation {
    pub event: JobEvent,
    pub step: Arc<dyn StepFacade>,
    pub run_id: RunId,
    /// Zero-based attempt number within the run.
    pub attempt: u32,
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("event", &self.event.name)
            .field("run_id", &self.run_id)
            .field("attempt", &self.attempt)
            .finish_non_exhaustive()
    }
}

/// The body the runtime executes for each invocation.
pub type ExecutionBody =
    Arc<dyn Fn(Invocation) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Client of a job runtime.
///
/// Construction is synchronous: it happens once during bootstrap, before any
/// request is served.
pub trait RuntimeClient: Send + Sync {
    /// Application id the runtime groups functions under.
    fn app_id(&self) -> &str;

    /// Describe a function to the runtime and get back its handle.
    fn create_function(
        &self,
        config: &JobFunctionConfig,
        trigger: &TriggerSpec,
        body: ExecutionBody,
    ) -> Result<RegisteredFunction, BuildError>;
}

/// Handle of a constructed job function.
///
/// Clones are cheap and refer to the same function. Identity beyond
/// [`RegisteredFunction::handle`] is whatever the runtime assigned.
#[derive(Clone)]
pub struct RegisteredFunction {
    inner: Arc<FunctionInner>,
}

struct FunctionInner {
    handle: String,
    config: JobFunctionConfig,
    trigger: TriggerSpec,
    body: ExecutionBody,
}

impl RegisteredFunction {
    /// Used by runtime clients when they accept a function.
    pub fn new(
        handle: impl Into<String>,
        config: JobFunctionConfig,
        trigger: TriggerSpec,
        body: ExecutionBody,
    ) -> Self {
        Self {
            inner: Arc::new(FunctionInner {
                handle: handle.into(),
                config,
                trigger,
                body,
            }),
        }
    }

    pub fn id(&self) -> &FunctionId {
        &self.inner.config.id
    }

    pub fn handle(&self) -> &str {
        &self.inner.handle
    }

    pub fn config(&self) -> &JobFunctionConfig {
        &self.inner.config
    }

    pub fn trigger(&self) -> &TriggerSpec {
        &self.inner.trigger
    }

    /// Run the execution body once.
    pub fn invoke(&self, invocation: Invocation) -> BoxFuture<'static, anyhow::Result<Value>> {
        (self.inner.body)(invocation)
    }

    /// Whether both handles refer to the same constructed function.
    pub fn same_as(&self, other: &RegisteredFunction) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RegisteredFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredFunction")
            .field("handle", &self.inner.handle)
            .field("id", &self.inner.config.id)
            .field("trigger", &self.inner.trigger)
            .finish()
    }
}
