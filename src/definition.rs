//! Fluent definition helpers.
//!
//! [`create`] describes how to build a class without binding anything;
//! [`share`], [`prepare`] and [`prepare_shared`] wrap such a description into
//! a [`StoreDefinition`] ready for [`Container::store`].
//!
//! ```rust
//! use ferrous_construct::definition::{create, share};
//! use ferrous_construct::{ClassInfo, Container, Factory, ParameterInfo};
//! use std::sync::Arc;
//!
//! struct Endpoint { host: Arc<String>, port: Arc<u16> }
//!
//! let container = Container::new();
//! container.register_class(
//!     ClassInfo::new("Endpoint", |args| {
//!         Ok(Endpoint { host: args.require("host")?, port: args.require("port")? })
//!     })
//!     .parameter(ParameterInfo::new("host"))
//!     .parameter(ParameterInfo::new("port")),
//! );
//!
//! let local = create("Endpoint", vec![Factory::value(String::from("localhost"))])
//!     .with("port", Factory::value(8080u16));
//! let built = local.build(&container).unwrap().downcast::<Endpoint>().unwrap();
//! assert_eq!(*built.host, "localhost");
//!
//! container.store("endpoint", share("Endpoint", vec![
//!     Factory::value(String::from("example.com")),
//!     Factory::value(443u16),
//! ]));
//! let a = container.get("endpoint").unwrap();
//! let b = container.get("endpoint").unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::arguments::Arguments;
use crate::class_ref::ClassRef;
use crate::container::{Container, ResolverContext};
use crate::error::DiResult;
use crate::factory::{extender, AnyArc, ExtendFn, Factory};
use crate::lifetime::BindFlags;

/// Unbound description of one construction.
#[derive(Clone)]
pub struct ObjectBuilder {
    class: ClassRef,
    positional: Vec<Factory>,
    named: Vec<(String, Factory)>,
}

impl ObjectBuilder {
    pub fn new(class: impl Into<ClassRef>) -> Self {
        Self {
            class: class.into(),
            positional: Vec::new(),
            named: Vec::new(),
        }
    }

    /// Adds a named argument; named arguments win over positional ones.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Factory>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Into<Factory>) -> Self {
        self.positional.push(value.into());
        self
    }

    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    /// Resolves the arguments against `container`.
    ///
    /// Positional argument `i` is named after the class's `i`-th constructor
    /// parameter, or after its index when the class declares fewer.
    pub fn arguments(&self, container: &Container) -> DiResult<Arguments> {
        let parameters = self
            .class
            .as_name()
            .and_then(|name| container.class(name))
            .map(|class| class.parameters().iter().map(|p| p.name().to_string()).collect::<Vec<_>>())
            .unwrap_or_default();

        let empty = Arguments::new();
        let mut args = Arguments::new();
        for (index, value) in self.positional.iter().enumerate() {
            let name = parameters.get(index).cloned().unwrap_or_else(|| index.to_string());
            args.insert(name, container.execute(value, &empty)?);
        }
        for (name, value) in &self.named {
            args.insert(name.clone(), container.execute(value, &empty)?);
        }
        Ok(args)
    }

    /// Constructs the class, or calls the callable, with the resolved arguments.
    pub fn build(&self, container: &Container) -> DiResult<AnyArc> {
        let args = self.arguments(container)?;
        match &self.class {
            ClassRef::Named(name) => container.new_instance(name, &args),
            ClassRef::Callable(f) => container.execute(&Factory::Deferred(f.clone()), &args),
        }
    }

    pub fn into_factory(self) -> Factory {
        Factory::deferred_any(move |ctx| self.build(ctx.container()))
    }
}

impl fmt::Debug for ObjectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBuilder")
            .field("class", &self.class)
            .field("positional", &self.positional.len())
            .field("named", &self.named.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

/// A builder plus the lifecycle flags and extension it is stored with.
#[derive(Clone)]
pub struct StoreDefinition {
    builder: ObjectBuilder,
    flags: BindFlags,
    extend: Option<ExtendFn>,
}

impl StoreDefinition {
    pub fn new(builder: ObjectBuilder, flags: BindFlags) -> Self {
        Self {
            builder,
            flags,
            extend: None,
        }
    }

    pub fn builder(&self) -> &ObjectBuilder {
        &self.builder
    }

    pub fn flags(&self) -> BindFlags {
        self.flags
    }

    pub fn is_shared(&self) -> bool {
        self.flags.is_shared()
    }

    pub fn is_protected(&self) -> bool {
        self.flags.is_protected()
    }

    /// Adds a post-processor, run after any added before it.
    pub fn extend<F>(self, extend: F) -> Self
    where
        F: for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        self.extend_with(Some(Arc::new(extend)))
    }

    fn extend_with(mut self, extend: Option<ExtendFn>) -> Self {
        self.extend = match (self.extend.take(), extend) {
            (Some(first), Some(then)) => Some(extender(move |value, ctx| then(first(value, ctx)?, ctx))),
            (first, then) => then.or(first),
        };
        self
    }

    /// Factory building the object and applying the extensions.
    pub fn into_factory(self) -> Factory {
        let factory = self.builder.into_factory();
        match self.extend {
            Some(extend) => factory.extended(extend),
            None => factory,
        }
    }
}

impl fmt::Debug for StoreDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreDefinition")
            .field("builder", &self.builder)
            .field("flags", &self.flags)
            .field("extended", &self.extend.is_some())
            .finish()
    }
}

/// Unbound builder for `class` with positional arguments.
pub fn create(class: impl Into<ClassRef>, positional: Vec<Factory>) -> ObjectBuilder {
    let mut builder = ObjectBuilder::new(class);
    builder.positional = positional;
    builder
}

/// Shared definition of `class` with positional arguments.
pub fn share(class: impl Into<ClassRef>, positional: Vec<Factory>) -> StoreDefinition {
    StoreDefinition::new(create(class, positional), BindFlags::SHARED)
}

/// Deferred definition of `class`, post-processed by `extend` when built.
///
/// `flags` may come from raw bits; bit 0 means shared.
pub fn prepare(class: impl Into<ClassRef>, extend: Option<ExtendFn>, flags: BindFlags) -> StoreDefinition {
    StoreDefinition::new(ObjectBuilder::new(class), flags).extend_with(extend)
}

/// [`prepare`] with [`BindFlags::SHARED`] added.
pub fn prepare_shared(class: impl Into<ClassRef>, extend: Option<ExtendFn>, flags: BindFlags) -> StoreDefinition {
    prepare(class, extend, flags | BindFlags::SHARED)
}
