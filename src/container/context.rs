//! Resolver context handed to factories.
//!
//! This module contains the ResolverContext type which provides
//! the interface for factory functions to resolve dependencies.

use std::any::Any;
use std::sync::Arc;

use crate::arguments::Arguments;
use crate::container::Container;
use crate::error::{DiError, DiResult};
use crate::factory::{AnyArc, Factory};

/// Context passed to factory functions for resolving dependencies.
///
/// Wraps the container together with the extra arguments of the current
/// invocation. Factories use [`param`](Self::param) to take a value from the
/// extra arguments when one was supplied and to resolve it from the container
/// otherwise.
///
/// # Examples
///
/// ```
/// use ferrous_construct::{Arguments, Container, Factory};
///
/// let container = Container::new();
/// container.bind_shared("App\\Greeting", Factory::value(String::from("hello")), false);
///
/// let greet = Factory::deferred(|ctx| {
///     let greeting = ctx.param::<String>("greeting", "App\\Greeting")?;
///     Ok(format!("{greeting}, world"))
/// });
///
/// let default = container.execute(&greet, &Arguments::new()).unwrap();
/// let custom = container
///     .execute(&greet, &Arguments::new().with("greeting", String::from("hi")))
///     .unwrap();
/// assert_eq!(*default.downcast::<String>().unwrap(), "hello, world");
/// assert_eq!(*custom.downcast::<String>().unwrap(), "hi, world");
/// ```
pub struct ResolverContext<'a> {
    container: &'a Container,
    args: Option<&'a Arguments>,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(container: &'a Container, args: Option<&'a Arguments>) -> Self {
        Self { container, args }
    }

    pub fn container(&self) -> &'a Container {
        self.container
    }

    /// Extra arguments of this invocation, if any were supplied.
    pub fn args(&self) -> Option<&'a Arguments> {
        self.args
    }

    /// Extra argument `name`, without falling back to the container.
    pub fn arg<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.args.and_then(|args| args.get::<T>(name))
    }

    /// Extra argument `name` if supplied, otherwise `id` resolved from the container.
    pub fn param<T: Any + Send + Sync>(&self, name: &str, id: &str) -> DiResult<Arc<T>> {
        if let Some(value) = self.args.and_then(|args| args.get_any(name)) {
            return value
                .clone()
                .downcast::<T>()
                .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()));
        }
        self.container.get_as::<T>(id)
    }

    pub fn get(&self, id: &str) -> DiResult<AnyArc> {
        self.container.get(id)
    }

    pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> DiResult<Arc<T>> {
        self.container.get_as::<T>(id)
    }

    /// Runs another producer with its own extra arguments.
    pub fn execute(&self, factory: &Factory, args: &Arguments) -> DiResult<AnyArc> {
        self.container.execute(factory, args)
    }
}
