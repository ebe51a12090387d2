//! Lifecycle entries: one factory plus its shared/protected policy.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::container::ResolverContext;
use crate::error::DiResult;
use crate::factory::{AnyArc, Factory};
use crate::lifetime::BindFlags;

/// A binding's factory, lifecycle flags and memoized value.
///
/// A shared entry runs its factory once and hands out the cached value
/// afterwards, unless a refresh is forced. A protected entry keeps its first
/// factory forever: [`set_factory`](Self::set_factory) becomes a no-op that
/// reports `false`.
///
/// The cache is filled with a double-checked store; the lock is never held
/// while the factory runs, so a factory may resolve other bindings freely.
///
/// # Examples
///
/// ```rust
/// use ferrous_construct::{BindFlags, Container, Factory, LifecycleEntry};
/// use std::sync::Arc;
///
/// let container = Container::new();
/// let ctx = container.context();
/// let entry = LifecycleEntry::new(Factory::deferred(|_| Ok(String::from("x"))), BindFlags::SHARED);
///
/// let a = entry.get(&ctx, false).unwrap();
/// let b = entry.get(&ctx, false).unwrap();
/// let c = entry.get(&ctx, true).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert!(!Arc::ptr_eq(&a, &c));
/// ```
pub struct LifecycleEntry {
    factory: Mutex<Factory>,
    shared: AtomicBool,
    protected: AtomicBool,
    cached: Mutex<Option<AnyArc>>,
    // Installed by a shared `create_object`; concurrent creators reuse it
    constructed: bool,
}

impl LifecycleEntry {
    /// Creates an entry. The initial factory is always installed, even when
    /// `flags` contains `PROTECTED`.
    pub fn new(factory: Factory, flags: BindFlags) -> Self {
        Self {
            factory: Mutex::new(factory),
            shared: AtomicBool::new(flags.is_shared()),
            protected: AtomicBool::new(flags.is_protected()),
            cached: Mutex::new(None),
            constructed: false,
        }
    }

    pub(crate) fn constructed(factory: Factory, flags: BindFlags) -> Self {
        Self {
            constructed: true,
            ..Self::new(factory, flags)
        }
    }

    pub(crate) fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Produces the bound value.
    ///
    /// Shared entries return the cached value when present and `force_new` is
    /// false; otherwise the factory runs and, for shared entries, its result
    /// replaces the cache. Transient entries run the factory every time.
    pub fn get(&self, ctx: &ResolverContext<'_>, force_new: bool) -> DiResult<AnyArc> {
        if !self.is_shared() {
            let factory = self.factory.lock().clone();
            return factory.produce(ctx);
        }

        if !force_new {
            if let Some(value) = self.cached.lock().as_ref() {
                return Ok(value.clone());
            }
        }

        let factory = self.factory.lock().clone();
        let value = factory.produce(ctx)?;

        let mut cached = self.cached.lock();
        if force_new {
            *cached = Some(value.clone());
            return Ok(value);
        }
        // Another caller may have stored first; keep theirs.
        Ok(cached.get_or_insert(value).clone())
    }

    /// Replaces the factory unless the entry is protected.
    ///
    /// Returns whether the replacement took effect. The cached value of a
    /// shared entry is left untouched; call [`clear`](Self::clear) to drop it.
    pub fn set_factory(&self, factory: Factory) -> bool {
        if self.is_protected() {
            return false;
        }
        *self.factory.lock() = factory;
        true
    }

    /// Current factory.
    pub fn factory(&self) -> Factory {
        self.factory.lock().clone()
    }

    pub fn is_shared(&self) -> bool {
        self.shared.load(Ordering::Acquire)
    }

    pub fn set_shared(&self, shared: bool) -> &Self {
        self.shared.store(shared, Ordering::Release);
        self
    }

    pub fn is_protected(&self) -> bool {
        self.protected.load(Ordering::Acquire)
    }

    pub fn set_protected(&self, protected: bool) -> &Self {
        self.protected.store(protected, Ordering::Release);
        self
    }

    pub fn flags(&self) -> BindFlags {
        BindFlags::from_parts(self.is_shared(), self.is_protected())
    }

    /// Memoized value, if any.
    pub fn cached(&self) -> Option<AnyArc> {
        self.cached.lock().clone()
    }

    /// Drops the memoized value.
    pub fn clear(&self) -> &Self {
        *self.cached.lock() = None;
        self
    }
}

impl std::fmt::Debug for LifecycleEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleEntry")
            .field("shared", &self.is_shared())
            .field("protected", &self.is_protected())
            .field("cached", &self.cached.lock().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Container;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting(counter: Arc<AtomicUsize>) -> Factory {
        Factory::deferred(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst)))
    }

    #[test]
    fn transient_never_caches() {
        let container = Container::new();
        let ctx = container.context();
        let calls = Arc::new(AtomicUsize::new(0));
        let entry = LifecycleEntry::new(counting(calls.clone()), BindFlags::empty());

        entry.get(&ctx, false).unwrap();
        entry.get(&ctx, false).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(entry.cached().is_none());
    }

    #[test]
    fn protected_entry_keeps_initial_factory() {
        let container = Container::new();
        let ctx = container.context();
        let entry = LifecycleEntry::new(Factory::value(1u8), BindFlags::PROTECTED);

        assert!(!entry.set_factory(Factory::value(2u8)));
        let value = entry.get(&ctx, false).unwrap().downcast::<u8>().unwrap();
        assert_eq!(*value, 1);
    }

    #[test]
    fn flags_split_getters_and_setters() {
        let entry = LifecycleEntry::new(Factory::value(()), BindFlags::empty());
        assert!(!entry.is_shared());
        entry.set_shared(true).set_protected(true);
        assert_eq!(entry.flags(), BindFlags::SHARED | BindFlags::PROTECTED);
    }

    #[test]
    fn unprotecting_allows_replacement_again() {
        let entry = LifecycleEntry::new(Factory::value(1u8), BindFlags::PROTECTED);
        entry.set_protected(false);
        assert!(entry.set_factory(Factory::value(2u8)));
    }

    #[test]
    fn factory_error_leaves_cache_empty() {
        let container = Container::new();
        let ctx = container.context();
        let entry = LifecycleEntry::new(
            Factory::deferred_any(|_| Err(crate::DiError::construction("Broken", "boom"))),
            BindFlags::SHARED,
        );
        assert!(entry.get(&ctx, false).is_err());
        assert!(entry.cached().is_none());
    }
}
