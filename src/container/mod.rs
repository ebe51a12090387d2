//! The container: bindings, class registrations and construction.
//!
//! This module contains the [`Container`] type, which owns the lifecycle
//! entries, the reflection data of constructible classes, the cached build
//! plan arguments per class and the attribute pipeline configuration.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::arguments::Arguments;
use crate::attributes::resolver::AttributeRegistry;
use crate::attributes::AttributesResolver;
use crate::class_ref::{normalize_class_name, ClassRef};
use crate::config::ContainerConfig;
use crate::definition::StoreDefinition;
use crate::entry::LifecycleEntry;
use crate::error::{DiError, DiResult};
use crate::factory::{AnyArc, ExtendFn, Factory};
use crate::internal::{FrameKind, StackGuard};
use crate::lifetime::BindFlags;
use crate::observer::{ContainerObserver, Observers, TracingObserver};
use crate::plan::{BuildPlan, PlanArguments};
use crate::reflection::ClassInfo;
use crate::registry::Registry;

pub mod context;
pub use context::ResolverContext;

/// Runtime object construction and dependency resolution.
///
/// `Container` is a cheap handle around shared state: clones see the same
/// bindings, classes and plans. Identifiers are matched after
/// [`normalize_class_name`], so `"\\App\\Mailer"`, `"app\\mailer"` and
/// `"App::Mailer"` name the same binding.
///
/// Resolution of an identifier prefers a binding. An identifier without a
/// binding that names a registered class is constructed on the spot, with its
/// constructor parameters resolved from the container.
///
/// # Thread Safety
///
/// All state sits behind `parking_lot` locks that are never held while user
/// factories or constructors run, so factories may resolve other identifiers
/// freely. Re-entering an identifier that is still being resolved on the same
/// thread fails with [`DiError::CyclicDependency`].
///
/// # Examples
///
/// ```
/// use ferrous_construct::{Arguments, ClassInfo, Container, Factory, ParameterInfo};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct UserService { db: Arc<Database> }
///
/// let container = Container::new();
/// container.bind_shared("Database", Factory::value(Database { url: "postgres://localhost".into() }), false);
/// container.register_class(
///     ClassInfo::new("UserService", |args| Ok(UserService { db: args.require::<Database>("db")? }))
///         .parameter(ParameterInfo::new("db").typed("Database")),
/// );
///
/// let users = container.get_as::<UserService>("UserService").unwrap();
/// assert_eq!(users.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

struct ContainerInner {
    config: ContainerConfig,
    entries: RwLock<HashMap<String, Arc<LifecycleEntry>>>,
    classes: RwLock<HashMap<String, Arc<ClassInfo>>>,
    plans: RwLock<HashMap<String, Arc<PlanArguments>>>,
    attributes: Arc<AttributeRegistry>,
    observers: Observers,
}

// Outcome of a shared `create_object` looking at the existing binding.
enum SharedCreate {
    Installed(Arc<LifecycleEntry>),
    Reused,
    Rejected,
}

// Which kind of class member a base resolution is for.
#[derive(Clone, Copy)]
enum Member {
    Property(usize),
    Parameter(usize),
}

impl Container {
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    pub fn with_config(config: ContainerConfig) -> Self {
        let observers = Observers::new();
        if config.trace_resolution {
            observers.add(Arc::new(TracingObserver::new()));
        }
        let attributes = Arc::new(AttributeRegistry::new(config.attribute_options.clone()));
        Self {
            inner: Arc::new(ContainerInner {
                config,
                entries: RwLock::new(HashMap::new()),
                classes: RwLock::new(HashMap::new()),
                plans: RwLock::new(HashMap::new()),
                attributes,
                observers,
            }),
        }
    }

    pub fn config(&self) -> &ContainerConfig {
        &self.inner.config
    }

    /// Context without extra arguments, for driving entries or factories directly.
    pub fn context(&self) -> ResolverContext<'_> {
        ResolverContext::new(self, None)
    }

    pub fn add_observer(&self, observer: Arc<dyn ContainerObserver>) -> &Self {
        self.inner.observers.add(observer);
        self
    }

    /// The container's attribute pipeline.
    ///
    /// Every returned resolver shares this container's attribute registrations
    /// and options.
    pub fn attributes(&self) -> AttributesResolver {
        AttributesResolver::with_registry(self.clone(), self.inner.attributes.clone())
    }

    /// Makes a class constructible under its name.
    pub fn register_class(&self, class: ClassInfo) -> &Self {
        tracing::debug!(class = class.name(), "registering class");
        self.inner
            .classes
            .write()
            .insert(normalize_class_name(class.name()), Arc::new(class));
        self
    }

    pub fn class(&self, id: &str) -> Option<Arc<ClassInfo>> {
        self.inner.classes.read().get(&normalize_class_name(id)).cloned()
    }

    /// Installs a fresh lifecycle entry for `id`.
    ///
    /// Returns `false` and leaves everything untouched when the existing entry
    /// is protected.
    pub fn bind(&self, id: &str, factory: impl Into<Factory>, flags: BindFlags) -> bool {
        let key = normalize_class_name(id);
        let rejected = {
            let mut entries = self.inner.entries.write();
            match entries.get(&key) {
                Some(existing) if existing.is_protected() => true,
                _ => {
                    entries.insert(key, Arc::new(LifecycleEntry::new(factory.into(), flags)));
                    false
                }
            }
        };

        self.report_bind(id, flags, !rejected)
    }

    /// Binds `id` only if nothing is bound under it yet.
    ///
    /// The check and the write happen under one lock, so of several
    /// concurrent callers exactly one installs its factory.
    pub fn bind_if_absent(&self, id: &str, factory: impl Into<Factory>, flags: BindFlags) -> bool {
        let key = normalize_class_name(id);
        let installed = {
            let mut entries = self.inner.entries.write();
            match entries.entry(key) {
                std::collections::hash_map::Entry::Occupied(_) => false,
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(Arc::new(LifecycleEntry::new(factory.into(), flags)));
                    true
                }
            }
        };
        if installed {
            self.report_bind(id, flags, true);
        }
        installed
    }

    fn report_bind(&self, id: &str, flags: BindFlags, accepted: bool) -> bool {
        if !accepted {
            tracing::warn!(id, "binding is protected; write ignored");
            self.inner.observers.bind_rejected(id);
            return false;
        }
        tracing::debug!(id, ?flags, "bound");
        self.inner.observers.bound(id, flags);
        true
    }

    pub fn bind_shared(&self, id: &str, factory: impl Into<Factory>, protected: bool) -> bool {
        self.bind(id, factory, BindFlags::from_parts(true, protected))
    }

    /// Binds a definition built with the [`definition`](crate::definition) helpers.
    pub fn store(&self, id: &str, definition: StoreDefinition) -> bool {
        let flags = definition.flags();
        self.bind(id, definition.into_factory(), flags)
    }

    pub fn entry(&self, id: &str) -> Option<Arc<LifecycleEntry>> {
        self.inner.entries.read().get(&normalize_class_name(id)).cloned()
    }

    /// True if `id` is bound or names a registered class.
    pub fn has(&self, id: &str) -> bool {
        let key = normalize_class_name(id);
        self.inner.entries.read().contains_key(&key) || self.inner.classes.read().contains_key(&key)
    }

    /// Destroys the binding for `id`. Class registrations are kept.
    pub fn remove(&self, id: &str) -> bool {
        let removed = self.inner.entries.write().remove(&normalize_class_name(id)).is_some();
        if removed {
            tracing::debug!(id, "binding removed");
        }
        removed
    }

    /// Post-processes every value the binding for `id` produces from now on.
    ///
    /// A protected binding is left unchanged and `Ok(false)` is returned. When
    /// the extension takes effect the memoized value is dropped.
    pub fn extend<F>(&self, id: &str, extend: F) -> DiResult<bool>
    where
        F: for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        let entry = self.entry(id).ok_or_else(|| DiError::NotFound(id.to_string()))?;
        let extended = entry.factory().extended(Arc::new(extend));
        if !entry.set_factory(extended) {
            tracing::warn!(id, "binding is protected; extension ignored");
            self.inner.observers.bind_rejected(id);
            return Ok(false);
        }
        entry.clear();
        Ok(true)
    }

    /// Resolves `id`: its binding if one exists, otherwise a fresh instance of
    /// the class registered under that name.
    pub fn get(&self, id: &str) -> DiResult<AnyArc> {
        self.resolve(id, false)
    }

    /// Like [`get`](Self::get), but re-runs the factory of a shared binding
    /// and replaces its memoized value.
    pub fn get_new(&self, id: &str) -> DiResult<AnyArc> {
        self.resolve(id, true)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> DiResult<Arc<T>> {
        self.get(id)?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    fn resolve(&self, id: &str, force_new: bool) -> DiResult<AnyArc> {
        let key = normalize_class_name(id);
        let entry = self.inner.entries.read().get(&key).cloned();
        let Some(entry) = entry else {
            if self.inner.classes.read().contains_key(&key) {
                return self.new_instance(id, &Arguments::new());
            }
            return Err(DiError::NotFound(id.to_string()));
        };

        let _guard = StackGuard::enter(FrameKind::Binding, &key, id, self.max_depth())?;
        let observers = &self.inner.observers;
        let start = observers.has_observers().then(|| {
            observers.resolving(id);
            Instant::now()
        });

        tracing::trace!(id, force_new, "resolving binding");
        let value = entry.get(&self.context(), force_new)?;

        if let Some(start) = start {
            observers.resolved(id, start.elapsed());
        }
        Ok(value)
    }

    /// Runs a producer with `args` available through its context.
    pub fn execute(&self, factory: &Factory, args: &Arguments) -> DiResult<AnyArc> {
        match factory {
            Factory::Constant(value) => Ok(value.clone()),
            Factory::Deferred(f) => f(&ResolverContext::new(self, Some(args))),
        }
    }

    /// Constructs the class registered as `id`, without binding it.
    ///
    /// Arguments cached in the class's build plan are overridden by `args`.
    /// Properties and then constructor parameters are resolved through their
    /// attribute pipelines, and the constructor runs through the class-level
    /// pipeline. A member without an argument resolves from its type hint when
    /// the container can provide it, then falls back to its default; a
    /// parameter that none of these satisfy fails with
    /// [`DiError::DependencyResolution`]. Properties only take arguments and
    /// defaults unless an attribute such as [`Inject`](crate::Inject)
    /// provides them.
    pub fn new_instance(&self, id: &str, args: &Arguments) -> DiResult<AnyArc> {
        let key = normalize_class_name(id);
        let class = self.class(&key).ok_or_else(|| DiError::NotFound(id.to_string()))?;
        let _guard = StackGuard::enter(FrameKind::Class, &key, class.name(), self.max_depth())?;
        tracing::trace!(class = class.name(), "constructing");

        let plan = self.inner.plans.read().get(&key).cloned();
        let mut merged = match plan {
            Some(plan) => plan.resolve_all(&ClassRef::named(class.name()), self)?,
            None => Arguments::new(),
        };
        merged.merge(args);
        let merged = Arc::new(merged);

        let resolver = self.attributes();
        let mut resolved = (*merged).clone();
        for (index, property) in class.properties().iter().enumerate() {
            let base = self.member_base(&class, Member::Property(index), &merged);
            let value = resolver.resolve_property(&class, index, base)?;
            resolved.insert(property.name(), value);
        }
        for (index, parameter) in class.parameters().iter().enumerate() {
            let base = self.member_base(&class, Member::Parameter(index), &merged);
            let value = resolver.resolve_parameter(&class, index, base)?;
            resolved.insert(parameter.name(), value);
        }

        let constructor = class.clone();
        resolver.resolve_class(&class, move || constructor.construct(&resolved))
    }

    // Resolution of one member before attributes have had their say.
    fn member_base(
        &self,
        class: &Arc<ClassInfo>,
        member: Member,
        args: &Arc<Arguments>,
    ) -> impl Fn() -> DiResult<AnyArc> + Send + Sync + 'static {
        let container = self.clone();
        let class = class.clone();
        let args = args.clone();
        move || {
            let (name, type_hint, default) = match member {
                Member::Property(i) => {
                    let p = &class.properties()[i];
                    (p.name(), None, p.default())
                }
                Member::Parameter(i) => {
                    let p = &class.parameters()[i];
                    (p.name(), p.type_hint(), p.default())
                }
            };
            if let Some(value) = args.get_any(name) {
                return Ok(value.clone());
            }
            if let Some(hint) = type_hint.filter(|hint| container.has(hint)) {
                return container.get(hint);
            }
            match default {
                Some(default) => container.execute(default, &Arguments::new()),
                None => Err(DiError::unresolved(class.name(), name)),
            }
        }
    }

    // Deferred construction of `id` with fixed arguments.
    fn instance_factory(&self, id: &str, args: Arguments) -> Factory {
        let id = id.to_string();
        Factory::deferred_any(move |ctx| ctx.container().new_instance(&id, &args))
    }

    /// Constructs `id` and binds the construction under `flags`.
    ///
    /// When `flags` is shared and a shared binding for `id` already holds a
    /// value, or was installed by another shared `create_object`, that binding
    /// is resolved instead of constructing anew. Concurrent shared creations
    /// of one identifier therefore settle on a single instance.
    pub fn create_object(&self, id: &str, args: &Arguments, flags: BindFlags) -> DiResult<AnyArc> {
        if !flags.is_shared() {
            self.bind(id, self.instance_factory(id, args.clone()), flags);
            return self.get(id);
        }

        let key = normalize_class_name(id);
        let outcome = {
            let mut entries = self.inner.entries.write();
            match entries.get(&key) {
                Some(existing) if existing.is_shared() && (existing.is_constructed() || existing.cached().is_some()) => {
                    SharedCreate::Reused
                }
                Some(existing) if existing.is_protected() => SharedCreate::Rejected,
                _ => {
                    let entry = Arc::new(LifecycleEntry::constructed(self.instance_factory(id, args.clone()), flags));
                    entries.insert(key.clone(), entry.clone());
                    SharedCreate::Installed(entry)
                }
            }
        };

        match outcome {
            SharedCreate::Reused => self.get(id),
            SharedCreate::Rejected => {
                self.report_bind(id, flags, false);
                self.get(id)
            }
            SharedCreate::Installed(entry) => {
                self.report_bind(id, flags, true);
                self.get(id).inspect_err(|_| {
                    // Let a later creation retry with its own arguments
                    let mut entries = self.inner.entries.write();
                    if entries
                        .get(&key)
                        .is_some_and(|current| Arc::ptr_eq(current, &entry) && current.cached().is_none())
                    {
                        entries.remove(&key);
                    }
                })
            }
        }
    }

    pub fn create_shared_object(&self, id: &str, args: &Arguments, protected: bool) -> DiResult<AnyArc> {
        self.create_object(id, args, BindFlags::from_parts(true, protected))
    }

    /// Binds a construction of `id` that runs on first resolution and passes
    /// the instance through `extend`.
    pub fn prepare_object(&self, id: &str, extend: Option<ExtendFn>, flags: BindFlags) -> bool {
        let factory = self.instance_factory(id, Arguments::new());
        let factory = match extend {
            Some(extend) => factory.extended(extend),
            None => factory,
        };
        self.bind(id, factory, flags)
    }

    /// Build plan for `id`.
    ///
    /// Plans for the same normalised identifier share their arguments, and
    /// [`new_instance`](Self::new_instance) consults them.
    pub fn plan(&self, id: &str) -> BuildPlan<Container> {
        let key = normalize_class_name(id);
        let arguments = self
            .inner
            .plans
            .write()
            .entry(key)
            .or_insert_with(|| Arc::new(PlanArguments::new()))
            .clone();
        BuildPlan::with_arguments(ClassRef::named(id), arguments, self.clone())
    }

    pub fn max_depth(&self) -> usize {
        self.inner.config.max_depth
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str("Bindings:\n");
        let entries = self.inner.entries.read();
        let mut keys: Vec<_> = entries.keys().collect();
        keys.sort();
        for key in keys {
            s.push_str(&format!("  {}: {:?}\n", key, entries[key].flags()));
        }
        s.push_str("Classes:\n");
        let classes = self.inner.classes.read();
        let mut names: Vec<_> = classes.values().map(|c| c.name()).collect();
        names.sort();
        for name in names {
            s.push_str(&format!("  {}\n", name));
        }
        s
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("bindings", &self.inner.entries.read().len())
            .field("classes", &self.inner.classes.read().len())
            .field("observers", &self.inner.observers)
            .finish()
    }
}

impl Registry for Container {
    fn execute(&self, factory: &Factory, args: &Arguments) -> DiResult<AnyArc> {
        Container::execute(self, factory, args)
    }

    fn get(&self, id: &str) -> DiResult<AnyArc> {
        Container::get(self, id)
    }

    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }

    fn bind(&self, id: &str, factory: Factory, flags: BindFlags) -> bool {
        Container::bind(self, id, factory, flags)
    }

    fn bind_if_absent(&self, id: &str, factory: Factory, flags: BindFlags) -> bool {
        Container::bind_if_absent(self, id, factory, flags)
    }

    fn new_instance(&self, id: &str, args: &Arguments) -> DiResult<AnyArc> {
        Container::new_instance(self, id, args)
    }

    fn create_object(&self, id: &str, args: &Arguments, flags: BindFlags) -> DiResult<AnyArc> {
        Container::create_object(self, id, args, flags)
    }

    fn prepare_object(&self, id: &str, extend: Option<ExtendFn>, flags: BindFlags) -> bool {
        Container::prepare_object(self, id, extend, flags)
    }

    fn max_depth(&self) -> usize {
        Container::max_depth(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParameterInfo;

    #[test]
    fn handles_share_state() {
        let a = Container::new();
        let b = a.clone();
        a.bind("x", Factory::value(1u8), BindFlags::empty());
        assert!(b.has("X"));
    }

    #[test]
    fn unbound_class_is_built_fresh_each_time() {
        let container = Container::new();
        container.register_class(ClassInfo::new("Thing", |_| Ok(String::from("thing"))));
        let a = container.get("Thing").unwrap();
        let b = container.get("thing").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(container.entry("Thing").is_none());
    }

    #[test]
    fn parameter_falls_back_to_default() {
        let container = Container::new();
        container.register_class(
            ClassInfo::new("Port", |args| Ok(*args.require::<u16>("port")?))
                .parameter(ParameterInfo::new("port").typed("Missing").with_default(Factory::value(8080u16))),
        );
        assert_eq!(*container.get_as::<u16>("Port").unwrap(), 8080);
    }

    #[test]
    fn remove_keeps_class() {
        let container = Container::new();
        container.register_class(ClassInfo::new("Thing", |_| Ok(1u8)));
        container.create_shared_object("Thing", &Arguments::new(), false).unwrap();
        assert!(container.remove("Thing"));
        assert!(!container.remove("Thing"));
        assert!(container.has("Thing"));
    }
}
