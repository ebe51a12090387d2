//! One layer of the attribute handler chain.

use std::any::Any;
use std::sync::Arc;

use crate::attributes::{Attribute, AttributesResolver};
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::factory::AnyArc;
use crate::reflection::Reflector;

/// The callable wrapped by a handler layer.
pub type HandlerFn = Arc<dyn Fn() -> DiResult<AnyArc> + Send + Sync>;

/// Handler for one attribute layer.
///
/// Wraps the inner callable (the next layer, or the base resolution at the
/// innermost layer) together with the reflected target, the resolver that
/// built the chain, and the container. This is how attribute logic reaches
/// the container.
pub struct AttributeHandler {
    inner: HandlerFn,
    target: Reflector,
    attribute: Option<Arc<dyn Attribute>>,
    resolver: AttributesResolver,
    container: Container,
}

impl AttributeHandler {
    pub(crate) fn new(
        inner: HandlerFn,
        target: Reflector,
        attribute: Option<Arc<dyn Attribute>>,
        resolver: AttributesResolver,
        container: Container,
    ) -> Self {
        Self {
            inner,
            target,
            attribute,
            resolver,
            container,
        }
    }

    /// Runs the inner layers and the base resolution.
    pub fn call(&self) -> DiResult<AnyArc> {
        (self.inner)()
    }

    /// Runs the inner layers and downcasts their result.
    pub fn call_as<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.call()?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    pub fn inner(&self) -> &HandlerFn {
        &self.inner
    }

    pub fn target(&self) -> &Reflector {
        &self.target
    }

    /// Attribute owning this layer; `None` for the pass-through layer.
    pub fn attribute(&self) -> Option<&Arc<dyn Attribute>> {
        self.attribute.as_ref()
    }

    pub fn resolver(&self) -> &AttributesResolver {
        &self.resolver
    }

    pub fn container(&self) -> &Container {
        &self.container
    }
}

impl std::fmt::Debug for AttributeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributeHandler")
            .field("target", &self.target.name())
            .field("kind", &self.target.kind())
            .field("has_attribute", &self.attribute.is_some())
            .finish()
    }
}
