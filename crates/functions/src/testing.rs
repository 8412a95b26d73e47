//! Runtime client double for builder tests.

use std::sync::Mutex;

use gymjobs_core::{JobFunctionConfig, TriggerSpec};

use crate::error::BuildError;
use crate::runtime::{ExecutionBody, RegisteredFunction, RuntimeClient};

/// Records every `create_function` call; optionally refuses one id.
#[derive(Default)]
pub(crate) struct RecordingClient {
    calls: Mutex<Vec<(JobFunctionConfig, TriggerSpec)>>,
    reject: Option<String>,
}

impl RecordingClient {
    pub(crate) fn rejecting(id: &str) -> Self {
        Self {
            calls: Mutex::default(),
            reject: Some(id.to_string()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(JobFunctionConfig, TriggerSpec)> {
        self.calls.lock().unwrap().clone()
    }
}

impl RuntimeClient for RecordingClient {
    fn app_id(&self) -> &str {
        "test-app"
    }

    fn create_function(
        &self,
        config: &JobFunctionConfig,
        trigger: &TriggerSpec,
        body: ExecutionBody,
    ) -> Result<RegisteredFunction, BuildError> {
        self.calls
            .lock()
            .unwrap()
            .push((config.clone(), trigger.clone()));
        if self.reject.as_deref() == Some(config.id.as_str()) {
            return Err(BuildError::rejected(&config.id, "refused by test client"));
        }
        Ok(RegisteredFunction::new(
            format!("test-app-{}", config.id),
            config.clone(),
            trigger.clone(),
            body,
        ))
    }
}
