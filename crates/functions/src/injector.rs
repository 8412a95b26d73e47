//! Type-keyed service container threaded through to business handlers.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Service = Arc<dyn Any + Send + Sync>;

/// Dependency-injection accessor.
///
/// Services are provided during bootstrap and resolved by type inside
/// handlers. Clones share the same services. Trait objects are stored behind
/// their own `Arc`, e.g. `provide::<Arc<dyn Notifier>>(..)`.
#[derive(Clone, Default)]
pub struct Injector {
    services: Arc<HashMap<TypeId, Service>>,
}

impl Injector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `value` under its type, replacing any previous service of
    /// that type.
    pub fn provide<T>(&mut self, value: T)
    where
        T: Send + Sync + 'static,
    {
        Arc::make_mut(&mut self.services).insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn with<T>(mut self, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.provide(value);
        self
    }

    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.services
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Like [`Injector::get`], but a missing service is an error the
    /// handler can propagate with `?`.
    pub fn resolve<T>(&self) -> anyhow::Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get::<T>()
            .ok_or_else(|| anyhow::anyhow!("no service registered for `{}`", type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("services", &self.services.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct Front;

    impl Greeter for Front {
        fn greet(&self) -> String {
            "welcome".into()
        }
    }

    #[test]
    fn resolves_by_type() {
        let injector = Injector::new()
            .with(42u32)
            .with(Arc::new(Front) as Arc<dyn Greeter>);

        assert_eq!(*injector.get::<u32>().unwrap(), 42);
        assert_eq!(injector.resolve::<Arc<dyn Greeter>>().unwrap().greet(), "welcome");
        assert_eq!(injector.len(), 2);
    }

    #[test]
    fn missing_service_names_the_type() {
        let injector = Injector::new();
        let err = injector.resolve::<String>().unwrap_err();
        assert!(err.to_string().contains("alloc::string::String"));
        assert!(injector.get::<String>().is_none());
    }

    #[test]
    fn providing_after_clone_does_not_leak_into_the_clone() {
        let mut original = Injector::new().with(1u8);
        let snapshot = original.clone();
        original.provide(2u8);

        assert_eq!(*original.get::<u8>().unwrap(), 2);
        assert_eq!(*snapshot.get::<u8>().unwrap(), 1);
    }
}
