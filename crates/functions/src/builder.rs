//! Describing jobs and binding them to a runtime.
//!
//! `create_event_handler` / `create_cron_handler` only describe a job. The
//! returned [`JobDescriptor`] does nothing until it is materialised against a
//! [`BuildContext`], which constructs the runtime function, wraps the handler
//! with [`observe`], and registers the result.

use std::future::Future;
use std::sync::Arc;

use anyhow::Context as _;
use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use gymjobs_core::{ConfigError, ConfigResult, FunctionId, JobFunctionConfig, TriggerSpec};

use crate::context::{BuildContext, HandlerContext};
use crate::error::BuildError;
use crate::injector::Injector;
use crate::logger::JobLogger;
use crate::middleware::observe;
use crate::runtime::{ExecutionBody, Invocation, RegisteredFunction};
use crate::step::Step;

type Binder = Arc<dyn Fn(Injector, JobLogger) -> ExecutionBody + Send + Sync>;

/// A job that has been described but not yet constructed.
///
/// Cloning is cheap; the same descriptor can be materialised against any
/// number of build contexts.
#[derive(Clone)]
pub struct JobDescriptor {
    config: JobFunctionConfig,
    trigger: TriggerSpec,
    bind: Binder,
}

/// Describe a job that runs whenever `event` is sent.
pub fn create_event_handler<E, R, F, Fut>(
    config: JobFunctionConfig,
    event: &str,
    handler: F,
) -> ConfigResult<JobDescriptor>
where
    E: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(HandlerContext<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    Ok(JobDescriptor::new::<E, R, F, Fut>(
        config,
        TriggerSpec::event(event)?,
        handler,
    ))
}

/// Describe a job that runs on a cron schedule.
///
/// The handler receives the `inngest/scheduled.timer` event.
pub fn create_cron_handler<E, R, F, Fut>(
    config: JobFunctionConfig,
    cron: &str,
    handler: F,
) -> ConfigResult<JobDescriptor>
where
    E: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(HandlerContext<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    Ok(JobDescriptor::new::<E, R, F, Fut>(
        config,
        TriggerSpec::cron(cron)?,
        handler,
    ))
}

impl JobDescriptor {
    fn new<E, R, F, Fut>(config: JobFunctionConfig, trigger: TriggerSpec, handler: F) -> Self
    where
        E: DeserializeOwned + Send + 'static,
        R: Serialize + Send + 'static,
        F: Fn(HandlerContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self {
            config,
            trigger,
            bind: Arc::new(move |injector: Injector, logger: JobLogger| {
                bind::<E, R, F, Fut>(handler.clone(), injector, logger)
            }),
        }
    }

    /// Only run for events matching `condition` (e.g.
    /// `event.data.role == "member"`).
    ///
    /// The expression is passed to the runtime as-is; cron jobs cannot take
    /// one.
    pub fn when(mut self, condition: impl Into<String>) -> ConfigResult<Self> {
        let condition = condition.into();
        match &mut self.trigger {
            TriggerSpec::Event { condition: slot, .. } => *slot = Some(condition),
            TriggerSpec::Cron { .. } => {
                return Err(ConfigError::invalid_expression(
                    condition,
                    "conditions only apply to event triggers",
                ));
            }
        }
        Ok(self)
    }

    pub fn id(&self) -> &FunctionId {
        &self.config.id
    }

    pub fn config(&self) -> &JobFunctionConfig {
        &self.config
    }

    pub fn trigger(&self) -> &TriggerSpec {
        &self.trigger
    }

    /// Construct the function on the context's runtime and register it.
    pub fn materialize(&self, ctx: &mut BuildContext) -> Result<RegisteredFunction, BuildError> {
        let logger = JobLogger::new(self.config.id.clone());
        let body = observe(
            logger.clone(),
            (self.bind)(ctx.injector().clone(), logger),
        );

        let function = ctx
            .client()
            .create_function(&self.config, &self.trigger, body)?;
        ctx.registry_mut().register(function.clone());

        info!(
            job_id = %self.config.id,
            handle = function.handle(),
            trigger = ?self.trigger,
            "job function registered"
        );
        Ok(function)
    }
}

impl std::fmt::Debug for JobDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobDescriptor")
            .field("config", &self.config)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}

/// Adapt a typed handler to the runtime's untyped execution body.
fn bind<E, R, F, Fut>(handler: Arc<F>, injector: Injector, logger: JobLogger) -> ExecutionBody
where
    E: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    F: Fn(HandlerContext<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    Arc::new(move |invocation: Invocation| {
        let handler = handler.clone();
        let injector = injector.clone();
        let logger = logger.clone();

        async move {
            let payload: E = invocation
                .event
                .decode()
                .with_context(|| format!("decoding payload of `{}`", invocation.event.name))?;

            let ctx = HandlerContext {
                event: invocation.event,
                payload,
                step: Step::new(invocation.step),
                run_id: invocation.run_id,
                attempt: invocation.attempt,
                injector,
                logger,
            };

            let output = handler(ctx).await?;
            serde_json::to_value(output).context("serialising handler output")
        }
        .boxed()
    })
}

/// Anything that can construct and register one function.
pub trait FunctionBuilder {
    fn build(&self, ctx: &mut BuildContext) -> Result<RegisteredFunction, BuildError>;
}

impl FunctionBuilder for JobDescriptor {
    fn build(&self, ctx: &mut BuildContext) -> Result<RegisteredFunction, BuildError> {
        self.materialize(ctx)
    }
}

/// Builder backed by a closure; see [`builder_fn`].
#[derive(Clone)]
pub struct FnBuilder<F>(F);

/// Turn a closure into a [`FunctionBuilder`], for jobs that need to read the
/// context before describing themselves.
pub fn builder_fn<F>(f: F) -> FnBuilder<F>
where
    F: Fn(&mut BuildContext) -> Result<RegisteredFunction, BuildError>,
{
    FnBuilder(f)
}

impl<F> FunctionBuilder for FnBuilder<F>
where
    F: Fn(&mut BuildContext) -> Result<RegisteredFunction, BuildError>,
{
    fn build(&self, ctx: &mut BuildContext) -> Result<RegisteredFunction, BuildError> {
        (self.0)(ctx)
    }
}

impl<B: FunctionBuilder + ?Sized> FunctionBuilder for Box<B> {
    fn build(&self, ctx: &mut BuildContext) -> Result<RegisteredFunction, BuildError> {
        (**self).build(ctx)
    }
}

impl<B: FunctionBuilder + ?Sized> FunctionBuilder for &B {
    fn build(&self, ctx: &mut BuildContext) -> Result<RegisteredFunction, BuildError> {
        (**self).build(ctx)
    }
}
