//! The registry seam used by build plans.

use crate::arguments::Arguments;
use crate::error::DiResult;
use crate::factory::{AnyArc, ExtendFn, Factory};
use crate::internal::DEFAULT_MAX_DEPTH;
use crate::lifetime::BindFlags;

/// Operations a build plan forwards to.
///
/// [`Container`](crate::Container) is the implementation used in practice;
/// the trait exists so plans can be driven against any registry, including
/// test doubles.
pub trait Registry: Clone + Send + Sync + 'static {
    /// Runs a producer with extra arguments available to it.
    fn execute(&self, factory: &Factory, args: &Arguments) -> DiResult<AnyArc>;

    /// Resolves an identifier.
    fn get(&self, id: &str) -> DiResult<AnyArc>;

    /// True if `id` is bound or constructible.
    fn has(&self, id: &str) -> bool;

    /// Binds `id`, returning `false` when a protected binding kept its factory.
    fn bind(&self, id: &str, factory: Factory, flags: BindFlags) -> bool;

    fn bind_shared(&self, id: &str, factory: Factory, protected: bool) -> bool {
        self.bind(id, factory, BindFlags::from_parts(true, protected))
    }

    /// Binds `id` only if nothing is bound under it yet, returning whether
    /// the binding was installed.
    ///
    /// The default checks [`has`](Self::has) before binding. Registries shared
    /// between threads should override it with an atomic check.
    fn bind_if_absent(&self, id: &str, factory: Factory, flags: BindFlags) -> bool {
        !self.has(id) && self.bind(id, factory, flags)
    }

    /// Constructs `id` without binding it.
    fn new_instance(&self, id: &str, args: &Arguments) -> DiResult<AnyArc>;

    /// Constructs `id` and binds the construction under `flags`.
    fn create_object(&self, id: &str, args: &Arguments, flags: BindFlags) -> DiResult<AnyArc>;

    fn create_shared_object(&self, id: &str, args: &Arguments, protected: bool) -> DiResult<AnyArc> {
        self.create_object(id, args, BindFlags::from_parts(true, protected))
    }

    /// Binds a deferred construction of `id`, post-processed by `extend`.
    fn prepare_object(&self, id: &str, extend: Option<ExtendFn>, flags: BindFlags) -> bool;

    /// Nesting limit for resolutions driven through this registry.
    fn max_depth(&self) -> usize {
        DEFAULT_MAX_DEPTH
    }
}
