//! In-process job runtime for local development and tests.
//!
//! Honours the same settings the hosted runtime does: event routing with
//! `if` filters, rate limits, concurrency limits, and retries with memoised
//! steps. Cron schedules are not evaluated; call [`InProcessRuntime::tick`]
//! to fire a cron function.

use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use gymjobs_core::{Filter, FunctionId, JobEvent, JobFunctionConfig, RunId, TriggerSpec};

use super::rate_limit::RateLimiter;
use super::retry::RetryPolicy;
use super::{ExecutionBody, Invocation, RegisteredFunction, RuntimeClient};
use crate::error::BuildError;
use crate::step::MemoStep;

/// How one run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { output: Value },
    Failed { error: String },
    /// Dropped by the function's rate limit; the body never ran.
    RateLimited,
}

/// Result of dispatching an event or tick to one function.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub function_id: FunctionId,
    pub run_id: Option<RunId>,
    pub attempts: u32,
    #[serde(flatten)]
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, RunOutcome::Completed { .. })
    }
}

struct Hosted {
    function: RegisteredFunction,
    filter: Option<Filter>,
    permits: Option<Arc<Semaphore>>,
    limiter: Option<RateLimiter>,
}

impl Hosted {
    fn accepts(&self, event: &JobEvent) -> bool {
        let Some(name) = self.function.trigger().event_name() else {
            return false;
        };
        if name.as_str() != event.name {
            return false;
        }
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.matches(&event.data))
    }
}

/// Runtime client that executes functions inside the current process.
pub struct InProcessRuntime {
    app_id: String,
    retry: RetryPolicy,
    hosted: RwLock<Vec<Arc<Hosted>>>,
}

impl InProcessRuntime {
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            retry: RetryPolicy::default(),
            hosted: RwLock::new(Vec::new()),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn function_count(&self) -> usize {
        self.hosted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver an event to every matching function and wait for the runs.
    ///
    /// Reports come back in registration order.
    pub async fn send(&self, event: JobEvent) -> Vec<RunReport> {
        let matched: Vec<Arc<Hosted>> = self
            .hosted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|hosted| hosted.accepts(&event))
            .cloned()
            .collect();

        debug!(event = %event.name, matched = matched.len(), "routing event");

        let runs = matched.into_iter().map(|hosted| {
            let event = event.clone();
            async move {
                if let Some(limiter) = &hosted.limiter {
                    if !limiter.try_acquire(&event.data) {
                        info!(
                            job_id = %hosted.function.id(),
                            event = %event.name,
                            "rate limit reached; skipping event"
                        );
                        return RunReport {
                            function_id: hosted.function.id().clone(),
                            run_id: None,
                            attempts: 0,
                            outcome: RunOutcome::RateLimited,
                        };
                    }
                }
                self.run(&hosted, event).await
            }
        });

        futures::future::join_all(runs).await
    }

    /// Fire a cron-triggered function once. `None` if no cron function has
    /// that id.
    pub async fn tick(&self, function_id: &FunctionId) -> Option<RunReport> {
        let hosted = self
            .hosted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|hosted| hosted.function.id() == function_id && hosted.function.trigger().is_cron())
            .cloned()?;

        let event = match hosted.function.trigger() {
            TriggerSpec::Cron { cron } => JobEvent::scheduled_timer(&cron.to_string()),
            TriggerSpec::Event { .. } => return None,
        };
        Some(self.run(&hosted, event).await)
    }

    async fn run(&self, hosted: &Hosted, event: JobEvent) -> RunReport {
        let function = &hosted.function;
        let run_id = RunId::new();
        let step = Arc::new(MemoStep::new());
        let max_attempts = function.config().retries.max_attempts();

        // Held for the whole run, across retries.
        let _permit = match &hosted.permits {
            Some(permits) => permits.clone().acquire_owned().await.ok(),
            None => None,
        };

        let mut attempt = 0;
        loop {
            let invocation = Invocation {
                event: event.clone(),
                step: step.clone(),
                run_id,
                attempt,
            };

            match function.invoke(invocation).await {
                Ok(output) => {
                    return RunReport {
                        function_id: function.id().clone(),
                        run_id: Some(run_id),
                        attempts: attempt + 1,
                        outcome: RunOutcome::Completed { output },
                    };
                }
                Err(err) if attempt + 1 >= max_attempts => {
                    warn!(
                        job_id = %function.id(),
                        %run_id,
                        attempts = attempt + 1,
                        error = %format!("{err:#}"),
                        "retries exhausted"
                    );
                    return RunReport {
                        function_id: function.id().clone(),
                        run_id: Some(run_id),
                        attempts: attempt + 1,
                        outcome: RunOutcome::Failed {
                            error: format!("{err:#}"),
                        },
                    };
                }
                Err(_) => {
                    attempt += 1;
                    let delay = self.retry.delay_for_retry(attempt);
                    debug!(job_id = %function.id(), %run_id, attempt, ?delay, "scheduling retry");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl RuntimeClient for InProcessRuntime {
    fn app_id(&self) -> &str {
        &self.app_id
    }

    fn create_function(
        &self,
        config: &JobFunctionConfig,
        trigger: &TriggerSpec,
        body: ExecutionBody,
    ) -> Result<RegisteredFunction, BuildError> {
        let filter = trigger
            .condition()
            .map(Filter::parse)
            .transpose()
            .map_err(|e| BuildError::rejected(&config.id, e.to_string()))?;

        let mut hosted = self.hosted.write().unwrap_or_else(PoisonError::into_inner);

        let handle = format!("{}-{}", self.app_id, config.id);
        let function = RegisteredFunction::new(handle, config.clone(), trigger.clone(), body);

        hosted.push(Arc::new(Hosted {
            function: function.clone(),
            filter,
            permits: config
                .concurrency
                .map(|limit| Arc::new(Semaphore::new(limit.get() as usize))),
            limiter: config.rate_limit.as_ref().map(RateLimiter::new),
        }));

        Ok(function)
    }
}

impl std::fmt::Debug for InProcessRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcessRuntime")
            .field("app_id", &self.app_id)
            .field("retry", &self.retry)
            .field("functions", &self.function_count())
            .finish()
    }
}
