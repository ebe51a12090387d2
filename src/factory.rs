//! Value producers shared by bindings and build plans.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::container::ResolverContext;
use crate::error::DiResult;

/// Type-erased shared value produced by the container.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

/// Deferred computation that receives a resolver context.
pub type FactoryFn = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Post-processor applied to a freshly produced value.
pub type ExtendFn = Arc<dyn for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Producer of a value: either a literal or a deferred computation.
///
/// Anything that is not already a computation is stored as
/// [`Factory::Constant`], so callers never need to wrap plain values in
/// closures themselves.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::{Container, Factory, Arguments};
///
/// let container = Container::new();
/// let literal = Factory::value(42u32);
/// let computed = Factory::deferred(|_ctx| Ok(String::from("computed")));
///
/// let a = container.execute(&literal, &Arguments::new()).unwrap();
/// let b = container.execute(&computed, &Arguments::new()).unwrap();
/// assert_eq!(*a.downcast::<u32>().unwrap(), 42);
/// assert_eq!(*b.downcast::<String>().unwrap(), "computed");
/// ```
#[derive(Clone)]
pub enum Factory {
    /// Always yields the same shared value
    Constant(AnyArc),
    /// Computes a value each time it is executed
    Deferred(FactoryFn),
}

impl Factory {
    /// Wraps a plain value.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Factory::Constant(Arc::new(value))
    }

    /// Wraps a closure returning a concrete type.
    pub fn deferred<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        Factory::Deferred(Arc::new(move |ctx| f(ctx).map(|v| Arc::new(v) as AnyArc)))
    }

    /// Wraps a closure that already returns a type-erased value.
    pub fn deferred_any<F>(f: F) -> Self
    where
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Factory::Deferred(Arc::new(f))
    }

    /// True for [`Factory::Deferred`].
    pub fn is_deferred(&self) -> bool {
        matches!(self, Factory::Deferred(_))
    }

    /// Runs the producer against a context.
    pub fn produce(&self, ctx: &ResolverContext<'_>) -> DiResult<AnyArc> {
        match self {
            Factory::Constant(value) => Ok(value.clone()),
            Factory::Deferred(f) => f(ctx),
        }
    }

    /// Returns a producer that post-processes every value produced by `self`.
    pub fn extended(self, extend: ExtendFn) -> Self {
        Factory::Deferred(Arc::new(move |ctx| {
            let value = self.produce(ctx)?;
            extend(value, ctx)
        }))
    }
}

/// Boxes a closure as an [`ExtendFn`].
///
/// ```rust
/// use ferrous_construct::{factory::extender, AnyArc, DiError};
/// use std::sync::Arc;
///
/// let increment = extender(|value, _ctx| {
///     let n = value.downcast::<u32>().map_err(|_| DiError::TypeMismatch("u32"))?;
///     Ok(Arc::new(*n + 1) as AnyArc)
/// });
/// # let _ = increment;
/// ```
pub fn extender<F>(f: F) -> ExtendFn
where
    F: for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync + 'static,
{
    Arc::new(f)
}

impl From<AnyArc> for Factory {
    fn from(value: AnyArc) -> Self {
        Factory::Constant(value)
    }
}

impl From<FactoryFn> for Factory {
    fn from(f: FactoryFn) -> Self {
        Factory::Deferred(f)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factory::Constant(_) => f.write_str("Factory::Constant"),
            Factory::Deferred(func) => write!(f, "Factory::Deferred({:p})", Arc::as_ptr(func) as *const ()),
        }
    }
}
