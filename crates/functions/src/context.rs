//! Contexts: what a handler sees per run, and what builders share during
//! bootstrap.

use std::sync::Arc;

use gymjobs_core::{JobEvent, RunId};

use crate::injector::Injector;
use crate::logger::JobLogger;
use crate::registry::FunctionRegistry;
use crate::runtime::{RegisteredFunction, RuntimeClient};
use crate::step::Step;

/// Everything a business handler receives for one attempt.
#[derive(Debug, Clone)]
pub struct HandlerContext<E> {
    /// The triggering event as delivered.
    pub event: JobEvent,
    /// `event.data` decoded into the job's payload type.
    pub payload: E,
    pub step: Step,
    pub run_id: RunId,
    /// Zero-based.
    pub attempt: u32,
    pub injector: Injector,
    pub logger: JobLogger,
}

/// Shared state for one bootstrap pass.
///
/// Owns the registry; builders append to it through `&mut self`.
pub struct BuildContext {
    client: Arc<dyn RuntimeClient>,
    injector: Injector,
    registry: FunctionRegistry,
}

impl BuildContext {
    pub fn new(client: Arc<dyn RuntimeClient>, injector: Injector) -> Self {
        Self {
            client,
            injector,
            registry: FunctionRegistry::new(),
        }
    }

    pub fn client(&self) -> &Arc<dyn RuntimeClient> {
        &self.client
    }

    pub fn injector(&self) -> &Injector {
        &self.injector
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.registry
    }

    /// Snapshot of every function registered so far.
    pub fn registered_functions(&self) -> Vec<RegisteredFunction> {
        self.registry.functions()
    }

    pub fn handler_count(&self) -> usize {
        self.registry.count()
    }

    /// End of bootstrap: hand the registry to the serving layer.
    pub fn into_registry(self) -> FunctionRegistry {
        self.registry
    }
}

impl std::fmt::Debug for BuildContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildContext")
            .field("app_id", &self.client.app_id())
            .field("injector", &self.injector)
            .field("registry", &self.registry)
            .finish()
    }
}
