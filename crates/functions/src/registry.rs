//! Ordered collection of constructed job functions.

use gymjobs_core::FunctionId;

use crate::runtime::RegisteredFunction;

/// Every function built during bootstrap, in registration order.
///
/// - Append-only; no uniqueness check (one entry per builder run)
/// - Writers need `&mut`, so once the registry is shared behind an `Arc`
///   for serving it can no longer change
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: Vec<RegisteredFunction>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, function: RegisteredFunction) {
        self.functions.push(function);
    }

    /// Copy of the current list; later registrations do not show up in it.
    pub fn functions(&self) -> Vec<RegisteredFunction> {
        self.functions.clone()
    }

    pub fn count(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Test-only escape hatch.
    pub fn clear(&mut self) {
        self.functions.clear();
    }

    /// First function registered under `id`.
    pub fn get(&self, id: &FunctionId) -> Option<&RegisteredFunction> {
        self.functions.iter().find(|f| f.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredFunction> {
        self.functions.iter()
    }
}

impl<'a> IntoIterator for &'a FunctionRegistry {
    type Item = &'a RegisteredFunction;
    type IntoIter = std::slice::Iter<'a, RegisteredFunction>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use futures::FutureExt;
    use gymjobs_core::{JobFunctionConfig, TriggerSpec};
    use proptest::prelude::*;
    use serde_json::Value;

    use crate::runtime::Invocation;

    fn function(id: &str) -> RegisteredFunction {
        RegisteredFunction::new(
            format!("test-{id}"),
            JobFunctionConfig::new(id).unwrap(),
            TriggerSpec::event("user.created").unwrap(),
            Arc::new(|_: Invocation| async { anyhow::Ok(Value::Null) }.boxed()),
        )
    }

    #[test]
    fn keeps_registration_order_and_duplicates() {
        let mut registry = FunctionRegistry::new();
        registry.register(function("a"));
        registry.register(function("b"));
        registry.register(function("a"));

        let ids: Vec<_> = registry.iter().map(|f| f.id().as_str()).collect();
        assert_eq!(ids, ["a", "b", "a"]);
        assert_eq!(registry.count(), 3);
    }

    #[test]
    fn functions_returns_a_copy() {
        let mut registry = FunctionRegistry::new();
        registry.register(function("a"));

        let mut snapshot = registry.functions();
        snapshot.clear();
        registry.register(function("b"));

        assert!(snapshot.is_empty());
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.functions().len(), 2);
    }

    #[test]
    fn get_returns_first_match() {
        let mut registry = FunctionRegistry::new();
        let first = function("a");
        registry.register(first.clone());
        registry.register(function("a"));

        let found = registry.get(&FunctionId::new("a").unwrap()).unwrap();
        assert!(found.same_as(&first));
        assert!(registry.get(&FunctionId::new("zzz").unwrap()).is_none());
    }

    #[test]
    fn clear_empties_the_registry() {
        let mut registry = FunctionRegistry::new();
        registry.register(function("a"));
        registry.clear();

        assert_eq!(registry.count(), 0);
        assert!(registry.functions().is_empty());
    }

    proptest! {
        /// `true` registers, `false` clears.
        #[test]
        fn count_tracks_registrations_since_last_clear(ops in proptest::collection::vec(any::<bool>(), 0..60)) {
            let mut registry = FunctionRegistry::new();
            let mut since_clear = 0usize;
            for (i, register) in ops.into_iter().enumerate() {
                if register {
                    registry.register(function(&format!("job-{i}")));
                    since_clear += 1;
                } else {
                    registry.clear();
                    since_clear = 0;
                }
                prop_assert_eq!(registry.count(), since_clear);
            }
        }
    }
}
