//! Applying many builders against one build context.

use crate::builder::FunctionBuilder;
use crate::context::BuildContext;
use crate::error::BuildError;
use crate::runtime::RegisteredFunction;

/// An ordered list of builders waiting for a context.
#[derive(Debug, Clone)]
pub struct Composition<B> {
    builders: Vec<B>,
}

/// Collect builders to be applied later, in order, against one context.
pub fn compose_handlers<B, I>(builders: I) -> Composition<B>
where
    B: FunctionBuilder,
    I: IntoIterator<Item = B>,
{
    Composition {
        builders: builders.into_iter().collect(),
    }
}

impl<B: FunctionBuilder> Composition<B> {
    /// Run every builder against `ctx`.
    ///
    /// Stops at the first failure; functions registered before it stay in
    /// the registry.
    pub fn apply(&self, ctx: &mut BuildContext) -> Result<Vec<RegisteredFunction>, BuildError> {
        self.builders.iter().map(|builder| builder.build(ctx)).collect()
    }

    pub fn len(&self) -> usize {
        self.builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.builders.is_empty()
    }
}

/// Apply `builders` against `ctx` right away.
pub fn register_handlers<B, I>(
    ctx: &mut BuildContext,
    builders: I,
) -> Result<Vec<RegisteredFunction>, BuildError>
where
    B: FunctionBuilder,
    I: IntoIterator<Item = B>,
{
    builders.into_iter().map(|builder| builder.build(ctx)).collect()
}
