//! Step facade: lets a handler split its work into retryable sub-steps.
//!
//! The runtime supplies the facade per invocation. A step that completed in
//! an earlier attempt of the same run returns its recorded output instead of
//! running again.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deferred step body; only called when the step has not completed yet.
pub type StepWork = Box<dyn FnOnce() -> BoxFuture<'static, anyhow::Result<Value>> + Send>;

/// Object-safe step interface implemented by runtimes.
#[async_trait]
pub trait StepFacade: Send + Sync {
    /// Run `work` as step `step_id`, or return its memoised output without
    /// calling `work`.
    async fn run_json(&self, step_id: &str, work: StepWork) -> anyhow::Result<Value>;

    /// Pause the run; a completed sleep is not repeated on retry.
    async fn sleep(&self, step_id: &str, duration: Duration) -> anyhow::Result<()>;
}

/// Typed handle over a [`StepFacade`], as seen by business handlers.
#[derive(Clone)]
pub struct Step {
    facade: Arc<dyn StepFacade>,
}

impl Step {
    pub fn new(facade: Arc<dyn StepFacade>) -> Self {
        Self { facade }
    }

    pub async fn run<T, F, Fut>(&self, step_id: &str, work: F) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        let deferred: StepWork = Box::new(move || {
            let pending = work();
            async move {
                let output = pending.await?;
                anyhow::Ok(serde_json::to_value(output)?)
            }
            .boxed()
        });
        let value = self.facade.run_json(step_id, deferred).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn sleep(&self, step_id: &str, duration: Duration) -> anyhow::Result<()> {
        self.facade.sleep(step_id, duration).await
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").finish_non_exhaustive()
    }
}

/// In-memory step store shared by every attempt of one run.
#[derive(Debug, Default)]
pub struct MemoStep {
    completed: Mutex<HashMap<String, Value>>,
}

impl MemoStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with outputs recorded by earlier attempts.
    pub fn with_completed(completed: HashMap<String, Value>) -> Self {
        Self {
            completed: Mutex::new(completed),
        }
    }

    /// Snapshot of every completed step.
    pub fn completed(&self) -> HashMap<String, Value> {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup(&self, step_id: &str) -> Option<Value> {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(step_id)
            .cloned()
    }

    fn record(&self, step_id: &str, value: Value) {
        self.completed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(step_id.to_string(), value);
    }
}

#[async_trait]
impl StepFacade for MemoStep {
    async fn run_json(&self, step_id: &str, work: StepWork) -> anyhow::Result<Value> {
        if let Some(value) = self.lookup(step_id) {
            tracing::debug!(step_id, "step already completed; reusing output");
            return Ok(value);
        }

        let value = work().await?;
        self.record(step_id, value.clone());
        Ok(value)
    }

    async fn sleep(&self, step_id: &str, duration: Duration) -> anyhow::Result<()> {
        if self.lookup(step_id).is_some() {
            return Ok(());
        }
        tokio::time::sleep(duration).await;
        self.record(step_id, Value::Null);
        Ok(())
    }
}
