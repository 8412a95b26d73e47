//! `gymjobs-functions`: background-job registration layer.
//!
//! Jobs are described with [`create_event_handler`] / [`create_cron_handler`],
//! then bound to a [`RuntimeClient`] by materialising them against a
//! [`BuildContext`]:
//!
//! - the runtime client constructs the function and returns its handle
//! - the business handler is wrapped with [`observe`] (logging, error
//!   propagation)
//! - the handle lands in the context's [`FunctionRegistry`], which bootstrap
//!   hands to the serving layer
//!
//! Retries, scheduling and concurrency belong to the runtime.
//! [`InProcessRuntime`] is a runtime client for local runs and tests.

pub mod builder;
pub mod compose;
pub mod context;
pub mod error;
pub mod injector;
pub mod logger;
pub mod middleware;
pub mod registry;
pub mod runtime;
pub mod step;

#[cfg(test)]
mod testing;

pub use builder::{
    FnBuilder, FunctionBuilder, JobDescriptor, builder_fn, create_cron_handler,
    create_event_handler,
};
pub use compose::{Composition, compose_handlers, register_handlers};
pub use context::{BuildContext, HandlerContext};
pub use error::BuildError;
pub use injector::Injector;
pub use logger::JobLogger;
pub use middleware::observe;
pub use registry::FunctionRegistry;
pub use runtime::{
    BackoffStrategy, ExecutionBody, InProcessRuntime, Invocation, RateLimiter, RegisteredFunction,
    RetryPolicy, RunOutcome, RunReport, RuntimeClient,
};
pub use step::{MemoStep, Step, StepFacade, StepWork};
