//! Class identity: normalisation and comparison of class references.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::factory::{Factory, FactoryFn};
use crate::plan::BuildPlan;
use crate::Container;

/// Reference to a constructible class.
///
/// A class is either named (a string identifier, or a Rust type turned into its
/// type name) or a callable whose identity is its allocation rather than any
/// name. Two distinct callables are never the same class, even if they behave
/// identically.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::ClassRef;
///
/// assert!(ClassRef::named("\\App\\Foo").same_as(&ClassRef::named("app\\foo")));
///
/// let a = ClassRef::callable(|_| Ok(1u8));
/// let b = ClassRef::callable(|_| Ok(1u8));
/// assert!(a.same_as(&a.clone()));
/// assert!(!a.same_as(&b));
/// ```
#[derive(Clone)]
pub enum ClassRef {
    /// Class identified by name
    Named(String),
    /// Class identified by a callable's identity
    Callable(FactoryFn),
}

impl ClassRef {
    pub fn named(name: impl Into<String>) -> Self {
        ClassRef::Named(name.into())
    }

    /// Class reference for a Rust type, named by its type path.
    pub fn of<T: ?Sized + 'static>() -> Self {
        ClassRef::Named(std::any::type_name::<T>().to_string())
    }

    /// Class reference for the type of an object.
    pub fn of_val<T: ?Sized + 'static>(_value: &T) -> Self {
        Self::of::<T>()
    }

    /// Wraps a closure as a callable class.
    pub fn callable<T, F>(f: F) -> Self
    where
        T: Any + Send + Sync,
        F: for<'a> Fn(&crate::ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        ClassRef::Callable(Arc::new(move |ctx| f(ctx).map(|v| Arc::new(v) as crate::factory::AnyArc)))
    }

    /// Unique, normalised identity string.
    ///
    /// Named classes yield their normalised name; callables yield a token
    /// derived from their address that no normalised name can collide with.
    pub fn identity(&self) -> Cow<'_, str> {
        match self {
            ClassRef::Named(name) => Cow::Owned(normalize_class_name(name)),
            ClassRef::Callable(f) => Cow::Owned(format!("{{closure@{:p}}}", Arc::as_ptr(f) as *const ())),
        }
    }

    /// Name as given, without normalisation.
    pub fn display_name(&self) -> Cow<'_, str> {
        match self {
            ClassRef::Named(name) => Cow::Borrowed(name.as_str()),
            ClassRef::Callable(_) => self.identity(),
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            ClassRef::Named(name) => Some(name.as_str()),
            ClassRef::Callable(_) => None,
        }
    }

    pub fn same_as(&self, other: &ClassRef) -> bool {
        match (self, other) {
            (ClassRef::Named(a), ClassRef::Named(b)) => normalize_class_name(a) == normalize_class_name(b),
            (ClassRef::Callable(a), ClassRef::Callable(b)) => {
                Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            ClassRef::Callable(_) => f.debug_tuple("Callable").field(&self.identity()).finish(),
        }
    }
}

impl From<&str> for ClassRef {
    fn from(name: &str) -> Self {
        ClassRef::Named(name.to_string())
    }
}

impl From<String> for ClassRef {
    fn from(name: String) -> Self {
        ClassRef::Named(name)
    }
}

/// Normalises a class name for comparison and lookup.
///
/// `::` is accepted as a namespace separator and rewritten to `\`; leading and
/// trailing `\` are trimmed and the result is lowercased.
///
/// ```rust
/// use ferrous_construct::normalize_class_name;
///
/// assert_eq!(normalize_class_name("\\App\\Foo"), "app\\foo");
/// assert_eq!(normalize_class_name("app::Foo"), "app\\foo");
/// ```
pub fn normalize_class_name(name: &str) -> String {
    name.replace("::", "\\").trim_matches('\\').to_lowercase()
}

/// Derives a class reference from a type-erased value.
///
/// Accepts class names (`String`, `&str`), [`ClassRef`]s, build plans (their
/// class), and callables (`FactoryFn` or a deferred [`Factory`]). Anything else
/// is rejected with [`DiError::InvalidReference`]; objects are referenced with
/// [`ClassRef::of_val`].
pub fn class_name_of(value: &dyn Any) -> DiResult<ClassRef> {
    if let Some(class) = value.downcast_ref::<ClassRef>() {
        return Ok(class.clone());
    }
    if let Some(plan) = value.downcast_ref::<BuildPlan<Container>>() {
        return Ok(plan.class().clone());
    }
    if let Some(f) = value.downcast_ref::<FactoryFn>() {
        return Ok(ClassRef::Callable(f.clone()));
    }
    if let Some(Factory::Deferred(f)) = value.downcast_ref::<Factory>() {
        return Ok(ClassRef::Callable(f.clone()));
    }
    if let Some(name) = value.downcast_ref::<String>() {
        return Ok(ClassRef::Named(name.clone()));
    }
    if let Some(name) = value.downcast_ref::<&str>() {
        return Ok(ClassRef::Named((*name).to_string()));
    }
    Err(DiError::InvalidReference(format!("{:?}", (*value).type_id())))
}

/// Compares two type-erased class references.
///
/// ```rust
/// use ferrous_construct::is_same_class;
///
/// assert!(is_same_class(&"\\App\\Foo", &String::from("app\\foo")).unwrap());
/// assert!(is_same_class(&42u32, &"App\\Foo").is_err());
/// ```
pub fn is_same_class(a: &dyn Any, b: &dyn Any) -> DiResult<bool> {
    Ok(class_name_of(a)?.same_as(&class_name_of(b)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callable_never_matches_name() {
        let callable = ClassRef::callable(|_| Ok(()));
        let forged = ClassRef::named(callable.identity().into_owned());
        assert!(!callable.same_as(&forged));
    }

    #[test]
    fn of_uses_type_path() {
        struct Local;
        assert!(ClassRef::of::<Local>().same_as(&ClassRef::of_val(&Local)));
        assert!(ClassRef::of::<String>().same_as(&ClassRef::named("ALLOC::string::String")));
    }
}
