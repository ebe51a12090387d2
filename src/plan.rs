//! Build plans: named, lazily resolved constructor arguments for one class.

use std::any::Any;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::arguments::Arguments;
use crate::class_ref::ClassRef;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::factory::{AnyArc, Factory};
use crate::internal::{argument_key, FrameKind, StackGuard};
use crate::lifetime::BindFlags;
use crate::registry::Registry;

struct ArgumentSlot {
    factory: Factory,
    version: u64,
    cached: Option<AnyArc>,
}

/// Argument store of a plan, shared between plans for the same class.
///
/// Every write stamps its slot with a fresh version. A resolution that
/// finishes after its slot was rewritten is returned to its caller but never
/// cached.
#[derive(Default)]
pub(crate) struct PlanArguments {
    slots: Mutex<IndexMap<String, ArgumentSlot>>,
    version: AtomicU64,
}

impl PlanArguments {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn set(&self, name: String, factory: Factory) {
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        self.slots.lock().insert(
            name,
            ArgumentSlot {
                factory,
                version,
                cached: None,
            },
        );
    }

    fn remove(&self, name: &str) {
        self.slots.lock().shift_remove(name);
    }

    fn contains(&self, name: &str) -> bool {
        self.slots.lock().contains_key(name)
    }

    fn clear(&self) {
        self.slots.lock().clear();
    }

    fn names(&self) -> Vec<String> {
        self.slots.lock().keys().cloned().collect()
    }

    /// Resolves argument `name` of `owner`, memoizing it. `None` if no
    /// resolver is set.
    ///
    /// Each argument is its own frame on the resolution stack, so an
    /// argument may read its siblings but not itself.
    pub(crate) fn resolve(&self, owner: &ClassRef, name: &str, registry: &impl Registry) -> DiResult<Option<AnyArc>> {
        let (factory, version) = {
            let slots = self.slots.lock();
            match slots.get(name) {
                None => return Ok(None),
                Some(ArgumentSlot { cached: Some(value), .. }) => return Ok(Some(value.clone())),
                Some(slot) => (slot.factory.clone(), slot.version),
            }
        };

        let _guard = StackGuard::enter(
            FrameKind::Argument,
            &argument_key(&owner.identity(), name),
            &format!("{}.{}", owner.display_name(), name),
            registry.max_depth(),
        )?;
        let value = registry.execute(&factory, &Arguments::new())?;

        let mut slots = self.slots.lock();
        match slots.get_mut(name) {
            Some(slot) if slot.version == version => Ok(Some(slot.cached.get_or_insert(value).clone())),
            _ => Ok(Some(value)),
        }
    }

    /// Resolves every argument in registration order.
    pub(crate) fn resolve_all(&self, owner: &ClassRef, registry: &impl Registry) -> DiResult<Arguments> {
        let mut resolved = Arguments::new();
        for name in self.names() {
            if let Some(value) = self.resolve(owner, &name, registry)? {
                resolved.insert(name, value);
            }
        }
        Ok(resolved)
    }
}

impl fmt::Debug for PlanArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.slots.lock().keys()).finish()
    }
}

/// Builder for one class: accumulates named arguments and forwards
/// construction and binding to a [`Registry`].
///
/// Argument values are [`Factory`] producers resolved lazily through
/// [`Registry::execute`] on first use and memoized until the argument is set,
/// removed or the plan is reset.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::{Arguments, ClassInfo, Container, Factory, ParameterInfo};
/// use std::sync::Arc;
///
/// struct Widget { name: Arc<String> }
///
/// let container = Container::new();
/// container.register_class(
///     ClassInfo::new("Widget", |args| Ok(Widget { name: args.require::<String>("name")? }))
///         .parameter(ParameterInfo::new("name")),
/// );
///
/// let plan = container.plan("Widget");
/// plan.set_argument("name", Factory::value(String::from("gear")));
///
/// let widget = plan.create_object(&Arguments::new()).unwrap().downcast::<Widget>().unwrap();
/// assert_eq!(*widget.name, "gear");
///
/// let a = plan.create_shared_object(&Arguments::new()).unwrap();
/// let b = plan.create_shared_object(&Arguments::new()).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
#[derive(Clone)]
pub struct BuildPlan<R: Registry = Container> {
    class: ClassRef,
    arguments: Arc<PlanArguments>,
    registry: R,
}

impl<R: Registry> BuildPlan<R> {
    /// Plan with its own, empty argument store.
    pub fn new(class: impl Into<ClassRef>, registry: R) -> Self {
        Self::with_arguments(class.into(), Arc::new(PlanArguments::new()), registry)
    }

    pub(crate) fn with_arguments(class: ClassRef, arguments: Arc<PlanArguments>, registry: R) -> Self {
        Self {
            class,
            arguments,
            registry,
        }
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Sets the resolver for `name`, dropping any value cached for it.
    pub fn set_argument(&self, name: impl Into<String>, value: impl Into<Factory>) -> &Self {
        self.arguments.set(name.into(), value.into());
        self
    }

    /// Applies [`set_argument`](Self::set_argument) for every pair.
    pub fn set_arguments<I, K, V>(&self, arguments: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Factory>,
    {
        for (name, value) in arguments {
            self.set_argument(name, value);
        }
        self
    }

    /// Resolved value of `name`, or `None` when no resolver is set.
    ///
    /// The registry is not consulted for unknown names.
    pub fn get_argument(&self, name: &str) -> DiResult<Option<AnyArc>> {
        if !self.arguments.contains(name) {
            return Ok(None);
        }
        self.arguments.resolve(&self.class, name, &self.registry)
    }

    /// Resolved value of `name`, or `default` when no resolver is set.
    pub fn get_argument_or(&self, name: &str, default: AnyArc) -> DiResult<AnyArc> {
        Ok(self.get_argument(name)?.unwrap_or(default))
    }

    /// Resolved value of `name` downcast to `T`.
    pub fn argument<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Option<Arc<T>>> {
        self.get_argument(name)?
            .map(|value| {
                value
                    .downcast::<T>()
                    .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
            })
            .transpose()
    }

    /// Every argument resolved, in registration order.
    pub fn get_arguments(&self) -> DiResult<Arguments> {
        self.arguments.resolve_all(&self.class, &self.registry)
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains(name)
    }

    pub fn argument_names(&self) -> Vec<String> {
        self.arguments.names()
    }

    pub fn remove_argument(&self, name: &str) -> &Self {
        self.arguments.remove(name);
        self
    }

    /// Drops every resolver and cached value.
    pub fn reset(&self) -> &Self {
        self.arguments.clear();
        self
    }

    // Plan arguments overridden by `extra`.
    fn merged(&self, extra: &Arguments) -> DiResult<Arguments> {
        Ok(self.get_arguments()?.merged(extra))
    }

    /// Forwards one operation to the registry with this plan's class.
    pub fn invoke(&self, op: PlanOp) -> DiResult<PlanOutcome> {
        tracing::trace!(class = %self.class.display_name(), op = op.operation().as_str(), "build plan operation");
        match op {
            PlanOp::Bind { factory, flags } => Ok(PlanOutcome::Bound(self.bind_flags(factory, flags))),
            PlanOp::BindShared { factory, protected } => Ok(PlanOutcome::Bound(
                self.bind_flags(factory, BindFlags::from_parts(true, protected)),
            )),
            PlanOp::NewInstance { args } => self.instantiate(&args).map(PlanOutcome::Instance),
            PlanOp::CreateObject { args, flags } => self.create(&args, flags).map(PlanOutcome::Instance),
            PlanOp::CreateSharedObject { args, protected } => self
                .create(&args, BindFlags::from_parts(true, protected))
                .map(PlanOutcome::Instance),
        }
    }

    /// Dispatches an operation by name.
    ///
    /// Binding operations take `value` as the factory to bind; construction
    /// operations take `args`. Unknown names fail with
    /// [`DiError::UnsupportedOperation`].
    pub fn call(&self, name: &str, value: Option<Factory>, args: Arguments, flags: BindFlags) -> DiResult<PlanOutcome> {
        let operation: Operation = name.parse()?;
        let take_value = || value.ok_or_else(|| DiError::unresolved(self.class.display_name(), "value"));
        let op = match operation {
            Operation::Bind => PlanOp::Bind { factory: take_value()?, flags },
            Operation::BindShared => PlanOp::BindShared {
                factory: take_value()?,
                protected: flags.is_protected(),
            },
            Operation::NewInstance => PlanOp::NewInstance { args },
            Operation::CreateObject => PlanOp::CreateObject { args, flags },
            Operation::CreateSharedObject => PlanOp::CreateSharedObject {
                args,
                protected: flags.is_protected(),
            },
        };
        self.invoke(op)
    }

    pub fn bind(&self, factory: impl Into<Factory>, shared: bool, protected: bool) -> bool {
        self.bind_flags(factory.into(), BindFlags::from_parts(shared, protected))
    }

    pub fn bind_shared(&self, factory: impl Into<Factory>, protected: bool) -> bool {
        self.bind_flags(factory.into(), BindFlags::from_parts(true, protected))
    }

    /// Constructs the class from the plan arguments overridden by `extra`.
    pub fn new_instance(&self, extra: &Arguments) -> DiResult<AnyArc> {
        self.instantiate(extra)
    }

    pub fn create_object(&self, extra: &Arguments) -> DiResult<AnyArc> {
        self.create(extra, BindFlags::empty())
    }

    pub fn create_object_with(&self, extra: &Arguments, shared: bool, protected: bool) -> DiResult<AnyArc> {
        self.create(extra, BindFlags::from_parts(shared, protected))
    }

    pub fn create_shared_object(&self, extra: &Arguments) -> DiResult<AnyArc> {
        self.create(extra, BindFlags::SHARED)
    }

    fn bind_flags(&self, factory: Factory, flags: BindFlags) -> bool {
        match &self.class {
            ClassRef::Named(name) => self.registry.bind(name, factory, flags),
            ClassRef::Callable(_) => self.registry.bind(&self.class.identity(), factory, flags),
        }
    }

    fn instantiate(&self, extra: &Arguments) -> DiResult<AnyArc> {
        let args = self.merged(extra)?;
        match &self.class {
            ClassRef::Named(name) => self.registry.new_instance(name, &args),
            ClassRef::Callable(f) => self.registry.execute(&Factory::Deferred(f.clone()), &args),
        }
    }

    fn create(&self, extra: &Arguments, flags: BindFlags) -> DiResult<AnyArc> {
        let args = self.merged(extra)?;
        match &self.class {
            ClassRef::Named(name) => self.registry.create_object(name, &args, flags),
            ClassRef::Callable(f) => {
                // Callables have no class to construct; bind the call itself
                // under the callable's identity.
                let id = self.class.identity().into_owned();
                let callable = Factory::Deferred(f.clone());
                let factory = Factory::deferred_any(move |ctx| ctx.execute(&callable, &args));
                let bound = if flags.is_shared() {
                    self.registry.bind_if_absent(&id, factory, flags)
                } else {
                    self.registry.bind(&id, factory, flags)
                };
                if !bound {
                    tracing::debug!(class = %id, "callable already bound; resolving the existing binding");
                }
                self.registry.get(&id)
            }
        }
    }
}

impl<R: Registry> fmt::Debug for BuildPlan<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildPlan")
            .field("class", &self.class)
            .field("arguments", &self.arguments)
            .finish()
    }
}

/// Operations a plan forwards to its registry.
#[derive(Debug, Clone)]
pub enum PlanOp {
    Bind { factory: Factory, flags: BindFlags },
    BindShared { factory: Factory, protected: bool },
    NewInstance { args: Arguments },
    CreateObject { args: Arguments, flags: BindFlags },
    CreateSharedObject { args: Arguments, protected: bool },
}

impl PlanOp {
    pub fn operation(&self) -> Operation {
        match self {
            PlanOp::Bind { .. } => Operation::Bind,
            PlanOp::BindShared { .. } => Operation::BindShared,
            PlanOp::NewInstance { .. } => Operation::NewInstance,
            PlanOp::CreateObject { .. } => Operation::CreateObject,
            PlanOp::CreateSharedObject { .. } => Operation::CreateSharedObject,
        }
    }
}

/// Result of a forwarded operation.
#[derive(Clone)]
pub enum PlanOutcome {
    /// Binding operations: whether the binding took effect
    Bound(bool),
    /// Construction operations: the instance
    Instance(AnyArc),
}

impl PlanOutcome {
    pub fn bound(&self) -> Option<bool> {
        match self {
            PlanOutcome::Bound(bound) => Some(*bound),
            PlanOutcome::Instance(_) => None,
        }
    }

    pub fn into_instance(self) -> Option<AnyArc> {
        match self {
            PlanOutcome::Instance(value) => Some(value),
            PlanOutcome::Bound(_) => None,
        }
    }
}

impl fmt::Debug for PlanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanOutcome::Bound(bound) => f.debug_tuple("Bound").field(bound).finish(),
            PlanOutcome::Instance(_) => f.write_str("Instance"),
        }
    }
}

/// Names of the forwarded operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Bind,
    BindShared,
    NewInstance,
    CreateObject,
    CreateSharedObject,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Bind => "bind",
            Operation::BindShared => "bindShared",
            Operation::NewInstance => "newInstance",
            Operation::CreateObject => "createObject",
            Operation::CreateSharedObject => "createSharedObject",
        }
    }
}

impl FromStr for Operation {
    type Err = DiError;

    /// Accepts camelCase and snake_case names.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "bind" => Ok(Operation::Bind),
            "bindShared" | "bind_shared" => Ok(Operation::BindShared),
            "newInstance" | "new_instance" => Ok(Operation::NewInstance),
            "createObject" | "create_object" => Ok(Operation::CreateObject),
            "createSharedObject" | "create_shared_object" => Ok(Operation::CreateSharedObject),
            other => Err(DiError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_names_round_trip() {
        for op in [
            Operation::Bind,
            Operation::BindShared,
            Operation::NewInstance,
            Operation::CreateObject,
            Operation::CreateSharedObject,
        ] {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
        }
        assert_eq!("create_shared_object".parse::<Operation>().unwrap(), Operation::CreateSharedObject);
    }

    #[test]
    fn unknown_operation_is_named() {
        match "destroy".parse::<Operation>() {
            Err(DiError::UnsupportedOperation(name)) => assert_eq!(name, "destroy"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn rewritten_slot_is_not_cached() {
        let container = Container::new();
        let arguments = PlanArguments::new();
        arguments.set("x".into(), Factory::value(1u8));
        let slots_version = arguments.slots.lock()["x"].version;
        arguments.set("x".into(), Factory::value(2u8));
        assert_ne!(arguments.slots.lock()["x"].version, slots_version);

        let value = arguments.resolve(&ClassRef::named("X"), "x", &container).unwrap().unwrap();
        assert_eq!(*value.downcast::<u8>().unwrap(), 2);
        assert!(arguments.slots.lock()["x"].cached.is_some());
    }
}
