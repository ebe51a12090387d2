//! Attribute discovery and handler-chain construction.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::arguments::Arguments;
use crate::attributes::{Attribute, AttributeHandler, AttributeSpec, AttributeTarget, HandlerFn, Inject};
use crate::class_ref::normalize_class_name;
use crate::config::ConfigValue;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::factory::AnyArc;
use crate::reflection::{ClassInfo, Reflector};

/// Recognised attribute kinds and resolver-wide options.
#[derive(Debug, Default)]
pub(crate) struct AttributeRegistry {
    known: RwLock<HashMap<String, AttributeTarget>>,
    options: RwLock<HashMap<String, ConfigValue>>,
}

impl AttributeRegistry {
    pub(crate) fn new(options: HashMap<String, ConfigValue>) -> Self {
        let registry = Self {
            known: RwLock::new(HashMap::new()),
            options: RwLock::new(options),
        };
        registry.register(Inject::NAME, AttributeTarget::PROPERTY | AttributeTarget::PARAMETER);
        registry
    }

    fn register(&self, name: &str, targets: AttributeTarget) {
        let mut known = self.known.write();
        *known.entry(normalize_class_name(name)).or_default() |= targets;
    }
}

/// Builds handler chains around the resolution of classes and their members.
///
/// Each resolver is bound to a container, which it threads through every
/// handler it creates. [`Container::attributes`] returns the container's own
/// resolver; [`AttributesResolver::new`] builds a standalone one with its own
/// registrations and options.
#[derive(Clone)]
pub struct AttributesResolver {
    container: Container,
    registry: Arc<AttributeRegistry>,
}

impl AttributesResolver {
    /// Standalone resolver over `container` with the given options.
    ///
    /// [`Inject`] is recognised on properties and parameters from the start.
    pub fn new(container: Container, options: HashMap<String, ConfigValue>) -> Self {
        Self {
            container,
            registry: Arc::new(AttributeRegistry::new(options)),
        }
    }

    pub(crate) fn with_registry(container: Container, registry: Arc<AttributeRegistry>) -> Self {
        Self { container, registry }
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Marks `name` as a recognised attribute kind on `targets`.
    ///
    /// Registering the same name again widens its targets.
    pub fn register_attribute(&self, name: &str, targets: AttributeTarget) -> &Self {
        tracing::debug!(attribute = name, ?targets, "registering attribute");
        self.registry.register(name, targets);
        self
    }

    pub fn is_recognized(&self, name: &str, target: AttributeTarget) -> bool {
        self.registry
            .known
            .read()
            .get(&normalize_class_name(name))
            .is_some_and(|targets| targets.intersects(target))
    }

    pub fn options(&self) -> HashMap<String, ConfigValue> {
        self.registry.options.read().clone()
    }

    pub fn option(&self, key: &str) -> Option<ConfigValue> {
        self.registry.options.read().get(key).cloned()
    }

    pub fn set_option(&self, key: impl Into<String>, value: ConfigValue) -> &Self {
        self.registry.options.write().insert(key.into(), value);
        self
    }

    /// Instantiates a declared attribute.
    ///
    /// Collaborators requested with [`AttributeSpec::inject`] are resolved from
    /// the container first and passed to the attribute constructor. An
    /// identifier the container cannot provide fails with
    /// [`DiError::DependencyResolution`].
    pub fn prepare_attribute(&self, spec: &AttributeSpec) -> DiResult<Arc<dyn Attribute>> {
        let mut args = Arguments::new();
        for injection in spec.injections() {
            let value = self.container.get(&injection.id).map_err(|err| match err {
                DiError::NotFound(missing) if normalize_class_name(&missing) == normalize_class_name(&injection.id) => {
                    DiError::unresolved(spec.name(), &injection.field)
                }
                other => other,
            })?;
            args.insert(injection.field.clone(), value);
        }
        spec.instantiate(&args)
    }

    /// Builds one handler layer around `inner`.
    pub fn create_handler(
        &self,
        inner: HandlerFn,
        target: Reflector,
        attribute: Option<Arc<dyn Attribute>>,
    ) -> AttributeHandler {
        AttributeHandler::new(inner, target, attribute, self.clone(), self.container.clone())
    }

    /// Resolves `target` through the chain of its recognised attributes.
    ///
    /// Attributes are discovered and instantiated in declaration order, then
    /// layered so that the first declared one is outermost. With no recognised
    /// attribute the chain is a single pass-through layer over `base`.
    ///
    /// A member target whose index is past the declared members fails with
    /// [`DiError::DependencyResolution`].
    pub fn resolve<F>(&self, target: Reflector, base: F) -> DiResult<AnyArc>
    where
        F: Fn() -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        if !target.exists() {
            let member = match &target {
                Reflector::Property(_, i) => format!("property #{i}"),
                Reflector::Parameter(_, i) => format!("parameter #{i}"),
                Reflector::Class(_) => String::new(),
            };
            return Err(DiError::unresolved(target.class().name(), member));
        }
        let kind = target.kind();
        let attributes = target
            .attributes()
            .iter()
            .filter(|spec| self.is_recognized(spec.name(), kind))
            .map(|spec| self.prepare_attribute(spec))
            .collect::<DiResult<Vec<_>>>()?;

        let base: HandlerFn = Arc::new(base);
        if attributes.is_empty() {
            return self.create_handler(base, target, None).call();
        }

        tracing::trace!(member = target.name(), layers = attributes.len(), "resolving through attributes");
        let chain = attributes.into_iter().rev().fold(base, |inner, attribute| {
            let handler = self.create_handler(inner, target.clone(), Some(attribute.clone()));
            Arc::new(move || attribute.handle(&handler)) as HandlerFn
        });
        chain()
    }

    pub fn resolve_class<F>(&self, class: &Arc<ClassInfo>, base: F) -> DiResult<AnyArc>
    where
        F: Fn() -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.resolve(Reflector::Class(class.clone()), base)
    }

    pub fn resolve_property<F>(&self, class: &Arc<ClassInfo>, index: usize, base: F) -> DiResult<AnyArc>
    where
        F: Fn() -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.resolve(Reflector::Property(class.clone(), index), base)
    }

    pub fn resolve_parameter<F>(&self, class: &Arc<ClassInfo>, index: usize, base: F) -> DiResult<AnyArc>
    where
        F: Fn() -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.resolve(Reflector::Parameter(class.clone(), index), base)
    }
}

impl std::fmt::Debug for AttributesResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttributesResolver")
            .field("registry", &self.registry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClassInfo;

    #[test]
    fn inject_is_recognized_on_members_only() {
        let resolver = AttributesResolver::new(Container::new(), HashMap::new());
        assert!(resolver.is_recognized("Inject", AttributeTarget::PROPERTY));
        assert!(resolver.is_recognized("\\inject", AttributeTarget::PARAMETER));
        assert!(!resolver.is_recognized("Inject", AttributeTarget::CLASS));
    }

    #[test]
    fn registration_widens_targets() {
        let resolver = AttributesResolver::new(Container::new(), HashMap::new());
        resolver
            .register_attribute("Traced", AttributeTarget::CLASS)
            .register_attribute("Traced", AttributeTarget::PARAMETER);
        assert!(resolver.is_recognized("traced", AttributeTarget::CLASS | AttributeTarget::PARAMETER));
        assert!(!resolver.is_recognized("traced", AttributeTarget::PROPERTY));
    }

    #[test]
    fn no_attributes_is_direct_invocation() {
        let resolver = AttributesResolver::new(Container::new(), HashMap::new());
        let class = Arc::new(ClassInfo::new("Plain", |_| Ok(())));
        let value = resolver
            .resolve_class(&class, || Ok(Arc::new(7u8) as AnyArc))
            .unwrap();
        assert_eq!(*value.downcast::<u8>().unwrap(), 7);
    }

    #[test]
    fn unrecognized_attributes_are_skipped() {
        let resolver = AttributesResolver::new(Container::new(), HashMap::new());
        let replace = |_: &AttributeHandler| Ok(Arc::new(0u8) as AnyArc);
        let class = Arc::new(ClassInfo::new("Plain", |_| Ok(())).attribute(AttributeSpec::instance("Unknown", replace)));
        let value = resolver
            .resolve_class(&class, || Ok(Arc::new(7u8) as AnyArc))
            .unwrap();
        assert_eq!(*value.downcast::<u8>().unwrap(), 7);
    }

    #[test]
    fn options_round_trip() {
        let mut options = HashMap::new();
        options.insert("strict".to_string(), ConfigValue::Boolean(true));
        let resolver = AttributesResolver::new(Container::new(), options);
        resolver.set_option("depth", ConfigValue::Integer(3));

        assert_eq!(resolver.option("strict"), Some(ConfigValue::Boolean(true)));
        assert_eq!(resolver.options().len(), 2);
    }
}
