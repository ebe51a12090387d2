//! Named argument maps passed to constructors and factories.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{DiError, DiResult};
use crate::factory::AnyArc;

/// Insertion-ordered mapping of argument name to resolved value.
///
/// Re-inserting an existing name replaces the value but keeps the original
/// position.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::Arguments;
///
/// let args = Arguments::new()
///     .with("name", String::from("gear"))
///     .with("teeth", 12u32);
///
/// assert_eq!(*args.require::<String>("name").unwrap(), "gear");
/// assert_eq!(args.get::<u32>("teeth").map(|t| *t), Some(12));
/// assert!(args.get::<u32>("name").is_none());
/// ```
#[derive(Clone, Default)]
pub struct Arguments {
    values: IndexMap<String, AnyArc>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a plain value.
    pub fn with<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.values.insert(name.into(), Arc::new(value));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: AnyArc) -> Option<AnyArc> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<AnyArc> {
        self.values.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn get_any(&self, name: &str) -> Option<&AnyArc> {
        self.values.get(name)
    }

    /// Typed lookup; `None` when missing or of another type.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.values.get(name).and_then(|v| v.clone().downcast::<T>().ok())
    }

    /// Typed lookup that fails with `NotFound` or `TypeMismatch`.
    pub fn require<T: Any + Send + Sync>(&self, name: &str) -> DiResult<Arc<T>> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| DiError::NotFound(name.to_string()))?;
        value
            .clone()
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(std::any::type_name::<T>()))
    }

    /// Overlays `other` on top of `self`; `other` wins on collisions.
    pub fn merge(&mut self, other: &Arguments) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }

    /// Returns `self` overridden by `other`.
    pub fn merged(mut self, other: &Arguments) -> Self {
        self.merge(other);
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnyArc)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, AnyArc)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (String, AnyArc)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl fmt::Debug for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_prefers_other_and_keeps_order() {
        let mut base = Arguments::new().with("a", 1u8).with("b", 2u8);
        let extra = Arguments::new().with("b", 20u8).with("c", 30u8);
        base.merge(&extra);

        assert_eq!(base.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(*base.require::<u8>("b").unwrap(), 20);
    }

    #[test]
    fn require_reports_kind_of_failure() {
        let args = Arguments::new().with("n", 1u8);
        assert!(matches!(args.require::<u8>("missing"), Err(DiError::NotFound(_))));
        assert!(matches!(args.require::<String>("n"), Err(DiError::TypeMismatch(_))));
    }
}
